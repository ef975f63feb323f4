//! 控制台交互
//!
//! 选择 PDF、输入页码范围和笔记标题。只在程序开始时运行一次，
//! 得到的 [`DocumentRequest`] 再交给编排层，处理过程中不会再读取输入。

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::error;

use crate::config::Config;
use crate::orchestrator::DocumentRequest;
use crate::services::parse_headings;

/// 控制台提问
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// 输出提示并读取一行（去掉首尾空白）
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line)?;
        if read == 0 {
            anyhow::bail!("输入已结束");
        }
        Ok(line.trim().to_string())
    }

    /// 列出文件并让用户按编号选择，输入无效时重新提问
    pub fn choose_file(&mut self, files: &[PathBuf]) -> Result<PathBuf> {
        for (idx, file) in files.iter().enumerate() {
            let name = file.file_name().unwrap_or_default().to_string_lossy();
            writeln!(self.output, "{}. {}", idx + 1, name)?;
        }

        loop {
            let answer = self.ask("Select the number of the file to process: ")?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=files.len()).contains(&n) => return Ok(files[n - 1].clone()),
                _ => error!("无效的选择，请输入 1 到 {} 之间的数字", files.len()),
            }
        }
    }
}

/// 列出目录中的 PDF 文件（按文件名排序）
pub fn list_pdf_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("无法读取文件夹: {}", folder.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// 确定本次要处理的内容
///
/// 配置中已有预设（`NOTES_PDF` 等）的项不再提问。
pub fn resolve_request<R: BufRead, W: Write>(
    config: &Config,
    prompter: &mut Prompter<R, W>,
) -> Result<DocumentRequest> {
    let pdf_folder = Path::new(&config.pdf_folder);

    let pdf_path = match &config.pdf_file {
        Some(name) => resolve_pdf_path(pdf_folder, name),
        None => {
            let files = list_pdf_files(pdf_folder)?;
            if files.is_empty() {
                anyhow::bail!("文件夹 {} 中没有 PDF 文件", pdf_folder.display());
            }
            prompter.choose_file(&files)?
        }
    };

    let page_range = match &config.page_range {
        Some(range) => Some(range.clone()),
        None => Some(prompter.ask(
            "Enter page range to process (e.g., 2-5) or press Enter to process the entire PDF: ",
        )?),
    };

    let headings = if config.ocr_only {
        Vec::new()
    } else {
        match &config.headings {
            Some(headings) => parse_headings(headings),
            None => parse_headings(&prompter.ask(
                "Please enter the headings that you want the notes to be created under separated by a comma: ",
            )?),
        }
    };

    Ok(DocumentRequest {
        pdf_path,
        page_range,
        headings,
    })
}

/// 预设的 PDF 可以是完整路径，也可以是 PDF 目录下的文件名
fn resolve_pdf_path(pdf_folder: &Path, name: &str) -> PathBuf {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        direct
    } else {
        pdf_folder.join(name)
    }
}

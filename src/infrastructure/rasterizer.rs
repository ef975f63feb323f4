//! PDF 转图片
//!
//! 调用 poppler 的 `pdftoppm` 把每一页渲染成 PNG，`pdfinfo` 读取页数。

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{PageImage, PageSelection};

/// 输出文件名前缀，pdftoppm 会生成 `page-1.png` / `page-01.png` 之类的文件
const OUTPUT_PREFIX: &str = "page";

static PAGES_RE: OnceLock<Regex> = OnceLock::new();
static IMAGE_RE: OnceLock<Regex> = OnceLock::new();

/// PDF 渲染器
pub struct PdfRasterizer {
    pdftoppm_cmd: String,
    pdfinfo_cmd: String,
    dpi: u32,
}

impl PdfRasterizer {
    pub fn new(pdftoppm_cmd: impl Into<String>, pdfinfo_cmd: impl Into<String>, dpi: u32) -> Self {
        Self {
            pdftoppm_cmd: pdftoppm_cmd.into(),
            pdfinfo_cmd: pdfinfo_cmd.into(),
            dpi,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.pdftoppm_cmd, &config.pdfinfo_cmd, config.dpi)
    }

    /// 读取 PDF 页数
    pub async fn page_count(&self, pdf_path: &Path) -> AppResult<usize> {
        ensure_exists(pdf_path)?;

        let output = Command::new(&self.pdfinfo_cmd)
            .arg(pdf_path)
            .output()
            .await
            .map_err(|e| rasterize_error(pdf_path, format!("{} 执行失败: {}", self.pdfinfo_cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(rasterize_error(pdf_path, stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout)
            .ok_or_else(|| rasterize_error(pdf_path, "pdfinfo 输出中没有页数".to_string()))
    }

    /// 把选中的页面渲染到 `out_dir`，返回按页码排序的图片列表
    pub async fn rasterize(
        &self,
        pdf_path: &Path,
        selection: PageSelection,
        out_dir: &Path,
    ) -> AppResult<Vec<PageImage>> {
        ensure_exists(pdf_path)?;

        let mut command = Command::new(&self.pdftoppm_cmd);
        command.arg("-png").args(["-r", &self.dpi.to_string()]);
        if let PageSelection::Range(range) = selection {
            command
                .args(["-f", &range.start.to_string()])
                .args(["-l", &range.end.to_string()]);
        }
        command.arg(pdf_path).arg(out_dir.join(OUTPUT_PREFIX));

        debug!("执行 pdftoppm: {:?}", command);

        let output = command
            .output()
            .await
            .map_err(|e| rasterize_error(pdf_path, format!("{} 执行失败: {}", self.pdftoppm_cmd, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(rasterize_error(pdf_path, stderr.trim().to_string()));
        }

        let images = collect_page_images(out_dir)?;
        info!("🖼️ 已渲染 {} 页 ({})", images.len(), selection);
        Ok(images)
    }
}

fn ensure_exists(pdf_path: &Path) -> AppResult<()> {
    if !pdf_path.is_file() {
        return Err(AppError::InputNotFound {
            path: pdf_path.to_path_buf(),
        });
    }
    Ok(())
}

fn rasterize_error(pdf_path: &Path, message: String) -> AppError {
    AppError::Rasterize {
        path: pdf_path.to_path_buf(),
        message,
    }
}

/// 从 `pdfinfo` 的输出中解析 `Pages:` 行
pub fn parse_page_count(pdfinfo_output: &str) -> Option<usize> {
    let re = PAGES_RE.get_or_init(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").expect("正则表达式无效"));
    re.captures(pdfinfo_output)
        .and_then(|caps| caps[1].parse().ok())
}

/// 收集 `dir` 下 pdftoppm 生成的图片
///
/// 按文件名中的页码排序；`index` 按排序后的位置重新编号。
pub fn collect_page_images(dir: &Path) -> std::io::Result<Vec<PageImage>> {
    let re = IMAGE_RE.get_or_init(|| {
        Regex::new(&format!(r"^{}-(\d+)\.png$", OUTPUT_PREFIX)).expect("正则表达式无效")
    });

    let mut numbered: Vec<(usize, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(number) = re.captures(name).and_then(|caps| caps[1].parse().ok()) {
            numbered.push((number, path));
        }
    }

    numbered.sort_by_key(|(number, _)| *number);

    Ok(numbered
        .into_iter()
        .enumerate()
        .map(|(index, (page_number, path))| PageImage::new(index, page_number, path))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pdfinfo_pages() {
        let output = "Title:          Lecture 3\nProducer:       LibreOffice\nPages:          42\nEncrypted:      no\n";
        assert_eq!(parse_page_count(output), Some(42));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn collects_images_in_page_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-09.png", "page-11.png", "notes.txt", "page-x.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let images = collect_page_images(dir.path()).unwrap();
        let numbers: Vec<_> = images.iter().map(|i| (i.index, i.page_number)).collect();
        assert_eq!(numbers, vec![(0, 9), (1, 10), (2, 11)]);
        assert!(images[0].path.ends_with("page-09.png"));
    }

    #[tokio::test]
    async fn missing_pdf_fails_fast() {
        let rasterizer = PdfRasterizer::new("pdftoppm", "pdfinfo", 300);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pdf");

        let err = rasterizer
            .rasterize(&missing, PageSelection::All, dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InputNotFound { .. }));

        let err = rasterizer.page_count(&missing).await.unwrap_err();
        assert!(matches!(err, AppError::InputNotFound { .. }));
    }
}

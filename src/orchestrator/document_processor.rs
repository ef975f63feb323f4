//! 单个文档处理器 - 编排层
//!
//! 已经渲染好的页面 → 批量 OCR → （可选）生成笔记 → 写文件。
//! 不做任何交互，所有参数都由调用方确定。

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::PageImage;
use crate::orchestrator::batch_extractor::BatchOcrExtractor;
use crate::services::{ChatBackend, NotesService};
use crate::utils::logging::truncate_text;

/// 输出选项
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub summary_folder: PathBuf,
    /// 保存 OCR 原文（`<stem>_ocr.md`）
    pub save_ocr_text: bool,
}

impl OutputOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            summary_folder: PathBuf::from(&config.summary_folder),
            save_ocr_text: config.save_ocr_text || config.ocr_only,
        }
    }
}

/// 单个文档的处理结果
#[derive(Debug, Clone, Default)]
pub struct DocumentReport {
    pub pages: usize,
    pub succeeded: usize,
    pub failed_pages: Vec<usize>,
    pub ocr_text_path: Option<PathBuf>,
    pub notes_path: Option<PathBuf>,
}

/// 处理单个文档
///
/// # 参数
/// - `extractor`: 批量 OCR 处理器
/// - `notes`: 笔记生成服务，`None` 表示只做 OCR
/// - `stem`: 输出文件名前缀（通常是 PDF 文件名）
/// - `images`: 按页排列的图片
/// - `headings`: 笔记标题
/// - `output`: 输出选项
///
/// # 返回
/// 一页文字都没有提取到时返回 [`AppError::NoTextExtracted`]，不会调用 LLM。
pub async fn process_document<B: ChatBackend>(
    extractor: &BatchOcrExtractor,
    notes: Option<&NotesService<B>>,
    stem: &str,
    images: Vec<PageImage>,
    headings: &[String],
    output: &OutputOptions,
) -> AppResult<DocumentReport> {
    let batch = extractor.extract(images).await;

    let mut report = DocumentReport {
        pages: batch.len(),
        succeeded: batch.succeeded(),
        failed_pages: batch.failed_pages(),
        ..Default::default()
    };

    if let Some(warning) = batch.warning() {
        warn!("⚠️ {}，跳过后续步骤", warning);
        return Err(AppError::NoTextExtracted { pages: batch.len() });
    }

    let text = batch.concatenated();
    debug!("OCR 文字预览: {}", truncate_text(text.trim(), 200));

    if output.save_ocr_text {
        let path = output.summary_folder.join(format!("{}_ocr.md", stem));
        write_output(&path, &text).await?;
        info!("📝 OCR 文字已保存至: {}", path.display());
        report.ocr_text_path = Some(path);
    }

    let Some(notes) = notes else {
        return Ok(report);
    };

    info!("🤖 正在生成笔记...");
    let content = notes.generate(&text, headings).await?;

    let path = output.summary_folder.join(format!("{}_summary.md", stem));
    write_output(&path, &content).await?;
    info!("✅ 笔记已保存至: {}", path.display());
    report.notes_path = Some(path);

    Ok(report)
}

async fn write_output(path: &Path, content: &str) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}

//! OCR 引擎

use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Config;
use crate::models::PageImage;

/// OCR 引擎
///
/// `extract_text` 是阻塞调用，会在阻塞线程池中执行。
/// 实现必须可以在多个线程间共享。
pub trait OcrEngine: Send + Sync + 'static {
    fn extract_text(&self, image: &PageImage) -> Result<String>;
}

/// 调用 `tesseract` 命令行
pub struct TesseractEngine {
    command: String,
    language: String,
}

impl TesseractEngine {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.tesseract_cmd, &config.ocr_language)
    }
}

impl OcrEngine for TesseractEngine {
    fn extract_text(&self, image: &PageImage) -> Result<String> {
        debug!("{} 调用 tesseract: {}", image, image.path.display());

        let output = Command::new(&self.command)
            .arg(&image.path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .with_context(|| format!("tesseract 执行失败: {}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract 返回错误 ({}): {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：写日志文件头、输出启动信息、按需启动本地 ollama
//! 2. **输入检查**：PDF 不存在时立即失败
//! 3. **页面渲染**：确定页码范围，把 PDF 渲染到临时目录（处理完自动删除）
//! 4. **向下委托**：委托 `document_processor` 完成 OCR 与笔记生成
//! 5. **全局统计**：输出并记录本次运行的结果

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{ensure_ollama, PdfRasterizer, TesseractEngine};
use crate::models::PageSelection;
use crate::orchestrator::batch_extractor::BatchOcrExtractor;
use crate::orchestrator::document_processor::{process_document, DocumentReport, OutputOptions};
use crate::services::{LlmService, NotesService, RetryPolicy};
use crate::utils::logging;

/// 一次处理请求（交互部分已经完成）
#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
    pub pdf_path: PathBuf,
    /// 用户输入的页码范围，原样保留，由 [`PageSelection::resolve`] 解析
    pub page_range: Option<String>,
    pub headings: Vec<String>,
}

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)
            .with_context(|| format!("无法初始化日志文件: {}", config.output_log_file))?;

        logging::log_startup(config.max_workers, &config.llm_model_name, config.ocr_only);

        if config.start_ollama && !config.ocr_only && !ensure_ollama(&config.ollama_cmd, config.ollama_port).await {
            warn!("⚠️ ollama 服务不可用，笔记生成可能失败");
        }

        Ok(Self { config })
    }

    /// 处理一个 PDF
    pub async fn run(&self, request: DocumentRequest) -> Result<DocumentReport> {
        let started = Instant::now();
        let pdf_path = request.pdf_path.as_path();

        if !pdf_path.is_file() {
            return Err(AppError::InputNotFound {
                path: pdf_path.to_path_buf(),
            }
            .into());
        }

        let stem = file_stem(pdf_path);
        info!("📄 正在处理: {}", pdf_path.display());

        let rasterizer = PdfRasterizer::from_config(&self.config);
        let page_count = match rasterizer.page_count(pdf_path).await {
            Ok(count) => {
                info!("📑 共 {} 页", count);
                Some(count)
            }
            Err(e) => {
                warn!("⚠️ 无法读取页数，跳过页码范围检查: {}", e);
                None
            }
        };
        let selection = PageSelection::resolve(request.page_range.as_deref(), page_count);

        // 临时目录在函数结束时删除
        let work_dir = tempfile::Builder::new()
            .prefix("pdf_notes_")
            .tempdir()
            .context("无法创建临时目录")?;
        let images = rasterizer.rasterize(pdf_path, selection, work_dir.path()).await?;

        let engine = Arc::new(TesseractEngine::from_config(&self.config));
        let extractor = BatchOcrExtractor::from_config(engine, &self.config);

        let notes = (!self.config.ocr_only).then(|| {
            NotesService::new(
                LlmService::new(&self.config),
                RetryPolicy::from_config(&self.config),
                self.config.chunk_chars,
            )
        });

        let result = process_document(
            &extractor,
            notes.as_ref(),
            &stem,
            images,
            &request.headings,
            &OutputOptions::from_config(&self.config),
        )
        .await;

        match result {
            Ok(report) => {
                print_final_stats(&stem, &report, started.elapsed(), &self.config);
                Ok(report)
            }
            Err(e) => {
                record(&self.config, &format!("{} 处理失败: {}", stem, e));
                Err(e.into())
            }
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// 写运行日志，失败只打印警告
fn record(config: &Config, line: &str) {
    if let Err(e) = logging::append_log(&config.output_log_file, line) {
        warn!("写入日志文件失败: {}", e);
    }
}

fn print_final_stats(stem: &str, report: &DocumentReport, elapsed: Duration, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!("完成时间: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    info!("{}", "=".repeat(60));
    info!("✅ 成功页数: {}/{}", report.succeeded, report.pages);
    if !report.failed_pages.is_empty() {
        info!("❌ 失败页码: {:?}", report.failed_pages);
    }
    if let Some(path) = &report.ocr_text_path {
        info!("📝 OCR 文字: {}", path.display());
    }
    if let Some(path) = &report.notes_path {
        info!("📘 笔记: {}", path.display());
    }
    info!("⏱️ 用时: {:.1} 秒", elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);

    record(
        config,
        &format!(
            "{} 完成: 成功 {}/{} 页, 失败页码 {:?}, 用时 {:.1} 秒",
            stem,
            report.succeeded,
            report.pages,
            report.failed_pages,
            elapsed.as_secs_f64()
        ),
    );
}

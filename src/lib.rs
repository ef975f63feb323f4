//! # PDF Notes
//!
//! 把课件 PDF 渲染成图片、并发 OCR、再交给 LLM 生成 Markdown 笔记。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 封装外部程序，只暴露能力
//! - `PdfRasterizer` - pdftoppm / pdfinfo
//! - `TesseractEngine` - tesseract OCR
//! - `ensure_ollama` - 本地 ollama 服务
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `RetryPolicy` - 有限次数重试（超时也计入次数）
//! - `LlmService` - 单次 LLM 调用
//! - `NotesService` - 提示词构建与笔记生成
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_extractor` - 批量 OCR，管理并发与超时
//! - `orchestrator/document_processor` - 单个文档的完整流程
//! - `orchestrator/app` - 应用生命周期与统计
//!
//! ### 交互（Interaction）
//! - `interaction` - 控制台提问，只在开始时运行，不进入编排层
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod interaction;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, RemoteCallError};
pub use infrastructure::{OcrEngine, PdfRasterizer, TesseractEngine};
pub use models::{BatchExtraction, BatchWarning, PageFailure, PageImage, PageOutcome, PageSelection};
pub use orchestrator::{process_document, App, BatchOcrExtractor, DocumentReport, DocumentRequest};
pub use services::{ChatBackend, LlmService, NotesService, RetryPolicy};

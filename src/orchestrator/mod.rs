//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_extractor` - 批量 OCR
//! - 控制并发数量（Semaphore）
//! - 单页超时、单页失败隔离
//! - 按页码顺序组装结果
//!
//! ### `document_processor` - 单个文档处理器
//! - OCR → 笔记生成 → 写文件
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 渲染 PDF、创建各个服务
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! app (处理一个 PDF)
//!     ↓
//! document_processor (处理 Vec<PageImage>)
//!     ↓
//! batch_extractor (并发处理单页)    services (重试 / LLM / 笔记)
//!     ↓
//! infrastructure (pdftoppm / tesseract / ollama)
//! ```

pub mod app;
pub mod batch_extractor;
pub mod document_processor;

// 重新导出主要类型
pub use app::{App, DocumentRequest};
pub use batch_extractor::BatchOcrExtractor;
pub use document_processor::{process_document, DocumentReport, OutputOptions};

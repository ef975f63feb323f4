//! 基础设施层
//!
//! 封装外部程序：`pdftoppm`/`pdfinfo`（PDF 转图片）、`tesseract`（OCR）、`ollama`（本地 LLM 服务）。
//! 只暴露能力，不包含流程。

pub mod ocr_engine;
pub mod ollama;
pub mod rasterizer;

pub use ocr_engine::{OcrEngine, TesseractEngine};
pub use ollama::ensure_ollama;
pub use rasterizer::PdfRasterizer;

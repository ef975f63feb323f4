//! 数据模型
//!
//! - `page` - 单页图片（一页 PDF 对应一张图片）
//! - `page_range` - 用户输入的页码范围及其解析结果
//! - `extraction` - 单页 OCR 结果与整批结果

pub mod extraction;
pub mod page;
pub mod page_range;

pub use extraction::{BatchExtraction, BatchWarning, PageFailure, PageOutcome, PageResult};
pub use page::PageImage;
pub use page_range::{PageRange, PageSelection};

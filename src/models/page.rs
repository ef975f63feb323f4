use std::fmt::Display;
use std::path::PathBuf;

/// 单页图片
///
/// 由外部渲染得到，内容对本程序不透明，只通过路径交给 OCR 引擎。
/// `index` 是在本批中的位置（从 0 开始），`page_number` 是在原 PDF 中的页码（从 1 开始）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub index: usize,
    pub page_number: usize,
    pub path: PathBuf,
}

impl PageImage {
    pub fn new(index: usize, page_number: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            page_number,
            path: path.into(),
        }
    }
}

impl Display for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[第 {} 页 #{}]", self.page_number, self.index)
    }
}

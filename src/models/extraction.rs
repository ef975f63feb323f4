//! OCR 结果模型
//!
//! 单页失败只是一个值（[`PageFailure`]），对应位置输出空字符串，
//! 不影响其他页面的内容和顺序。

use std::fmt::Display;
use std::time::Duration;

/// 单页失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFailure {
    /// OCR 引擎返回错误（如图片无法读取）
    Engine(String),
    /// 超过单页超时时间
    TimedOut(Duration),
    /// 任务 panic 或被取消
    Panicked(String),
}

impl Display for PageFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageFailure::Engine(msg) => write!(f, "OCR 失败: {}", msg),
            PageFailure::TimedOut(timeout) => write!(f, "OCR 超时 ({:?})", timeout),
            PageFailure::Panicked(msg) => write!(f, "任务异常终止: {}", msg),
        }
    }
}

/// 单页结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Extracted(String),
    Failed(PageFailure),
}

impl PageOutcome {
    /// 该页对应的文字，失败时为空字符串
    pub fn text(&self) -> &str {
        match self {
            PageOutcome::Extracted(text) => text,
            PageOutcome::Failed(_) => "",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageOutcome::Extracted(_))
    }
}

/// 单页处理记录
#[derive(Debug, Clone)]
pub struct PageResult {
    pub index: usize,
    pub page_number: usize,
    pub outcome: PageOutcome,
    pub elapsed: Duration,
}

/// 整批结果的非致命提示，由调用方决定是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchWarning {
    /// 没有任何页面
    NothingToProcess,
    /// 所有页面都失败
    AllPagesFailed { pages: usize },
}

impl Display for BatchWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchWarning::NothingToProcess => write!(f, "没有需要处理的页面"),
            BatchWarning::AllPagesFailed { pages } => {
                write!(f, "全部 {} 页均未提取到文字", pages)
            }
        }
    }
}

/// 整批 OCR 结果，按页面顺序排列
#[derive(Debug, Clone, Default)]
pub struct BatchExtraction {
    pages: Vec<PageResult>,
}

impl BatchExtraction {
    /// 由任意顺序的单页结果构建，内部按 `index` 重新排序
    pub fn from_unordered(mut pages: Vec<PageResult>) -> Self {
        pages.sort_by_key(|page| page.index);
        Self { pages }
    }

    pub fn pages(&self) -> &[PageResult] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 每页一段文字，失败的页面为空字符串
    pub fn texts(&self) -> Vec<String> {
        self.pages
            .iter()
            .map(|page| page.outcome.text().to_string())
            .collect()
    }

    /// 按页面顺序拼接，每页后面跟一个换行
    pub fn concatenated(&self) -> String {
        let mut text = String::new();
        for page in &self.pages {
            text.push_str(page.outcome.text());
            text.push('\n');
        }
        text
    }

    pub fn succeeded(&self) -> usize {
        self.pages.iter().filter(|p| p.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// 失败页面的页码
    pub fn failed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.outcome.is_success())
            .map(|p| p.page_number)
            .collect()
    }

    pub fn warning(&self) -> Option<BatchWarning> {
        if self.pages.is_empty() {
            Some(BatchWarning::NothingToProcess)
        } else if self.succeeded() == 0 {
            Some(BatchWarning::AllPagesFailed {
                pages: self.pages.len(),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(index: usize, outcome: PageOutcome) -> PageResult {
        PageResult {
            index,
            page_number: index + 1,
            outcome,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn sorts_by_index_and_blanks_failures() {
        let batch = BatchExtraction::from_unordered(vec![
            page(2, PageOutcome::Extracted("c".into())),
            page(0, PageOutcome::Extracted("a".into())),
            page(1, PageOutcome::Failed(PageFailure::Engine("bad image".into()))),
        ]);

        assert_eq!(batch.texts(), vec!["a", "", "c"]);
        assert_eq!(batch.concatenated(), "a\n\nc\n");
        assert_eq!(batch.succeeded(), 2);
        assert_eq!(batch.failed_pages(), vec![2]);
        assert_eq!(batch.warning(), None);
    }

    #[test]
    fn warnings() {
        assert_eq!(
            BatchExtraction::default().warning(),
            Some(BatchWarning::NothingToProcess)
        );

        let batch = BatchExtraction::from_unordered(vec![page(
            0,
            PageOutcome::Failed(PageFailure::TimedOut(Duration::from_secs(1))),
        )]);
        assert_eq!(batch.warning(), Some(BatchWarning::AllPagesFailed { pages: 1 }));
    }
}

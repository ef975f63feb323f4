//! 页码范围
//!
//! 用户输入形如 `2-5` 或 `3`（从 1 开始，包含两端）。
//! 输入为空表示整本处理；格式错误或越界时退回整本处理并打印警告。

use std::fmt::Display;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::PageRangeError;

static RANGE_RE: OnceLock<Regex> = OnceLock::new();

fn range_re() -> &'static Regex {
    RANGE_RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").expect("页码范围正则表达式无效")
    })
}

/// 页码范围（从 1 开始，包含两端）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn new(start: usize, end: usize) -> Result<Self, PageRangeError> {
        if start == 0 || end == 0 {
            return Err(PageRangeError::ZeroPage);
        }
        if start > end {
            return Err(PageRangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// 解析用户输入；空输入返回 `Ok(None)`
    pub fn parse(input: &str) -> Result<Option<Self>, PageRangeError> {
        if input.trim().is_empty() {
            return Ok(None);
        }

        let caps = range_re()
            .captures(input)
            .ok_or_else(|| PageRangeError::Malformed(input.to_string()))?;

        let parse_num = |s: &str| {
            s.parse::<usize>()
                .map_err(|_| PageRangeError::Malformed(input.to_string()))
        };

        let start = parse_num(&caps[1])?;
        let end = match caps.get(2) {
            Some(m) => parse_num(m.as_str())?,
            None => start,
        };

        Self::new(start, end).map(Some)
    }

    /// 检查范围是否落在文档页数以内
    pub fn check(&self, page_count: usize) -> Result<(), PageRangeError> {
        if self.end > page_count {
            return Err(PageRangeError::OutOfBounds {
                end: self.end,
                page_count,
            });
        }
        Ok(())
    }
}

impl Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// 实际要处理的页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelection {
    #[default]
    All,
    Range(PageRange),
}

impl PageSelection {
    /// 根据用户输入和文档页数确定处理范围
    ///
    /// 任何解析或越界错误都只会打印警告并退回 `All`。
    /// `page_count` 为 `None` 时不做越界检查。
    pub fn resolve(input: Option<&str>, page_count: Option<usize>) -> Self {
        let Some(input) = input else {
            return PageSelection::All;
        };

        let range = match PageRange::parse(input) {
            Ok(Some(range)) => range,
            Ok(None) => return PageSelection::All,
            Err(e) => {
                warn!("⚠️ 页码范围无效 ({})，将处理整个 PDF", e);
                return PageSelection::All;
            }
        };

        if let Some(count) = page_count {
            if let Err(e) = range.check(count) {
                warn!("⚠️ 页码范围无效 ({})，将处理整个 PDF", e);
                return PageSelection::All;
            }
        }

        PageSelection::Range(range)
    }
}

impl Display for PageSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSelection::All => write!(f, "全部页面"),
            PageSelection::Range(range) => write!(f, "第 {} 页", range),
        }
    }
}

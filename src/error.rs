use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
///
/// 只有"无法产出任何可用结果"的失败才会以 `AppError` 的形式传到顶层；
/// 单页 OCR 失败属于 [`crate::models::PageFailure`]，不会走到这里。
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入文件不存在，立即失败，不重试
    #[error("输入文件不存在: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// PDF 转图片失败
    #[error("PDF 转换失败 ({}): {message}", path.display())]
    Rasterize { path: PathBuf, message: String },

    /// 所有页面都没有提取出文字，或者没有任何页面
    #[error("没有提取到任何文字 (共 {pages} 页)")]
    NoTextExtracted { pages: usize },

    /// 没有可以交给 LLM 的文字
    #[error("没有可用于生成笔记的文字")]
    EmptyFacts,

    /// 远程调用（LLM）失败
    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),

    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 文件读写错误
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 远程调用错误
///
/// `Connection` 和 `TimedOut` 可以重试，`Rejected` 直接失败，
/// `Exhausted` 表示重试次数已用完。
#[derive(Debug, Error)]
pub enum RemoteCallError {
    /// 连接失败
    #[error("连接失败: {0}")]
    Connection(String),

    /// 单次调用超时
    #[error("调用超时 ({timeout:?})")]
    TimedOut { timeout: Duration },

    /// 服务端拒绝或响应无法解析
    #[error("调用失败: {0}")]
    Rejected(String),

    /// 重试次数用尽
    #[error("已重试 {attempts} 次仍然失败: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<RemoteCallError>,
    },
}

impl RemoteCallError {
    /// 是否属于可重试的错误（连接失败或超时）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteCallError::Connection(_) | RemoteCallError::TimedOut { .. }
        )
    }
}

/// 页码范围解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("无法解析页码范围: {0:?}")]
    Malformed(String),

    #[error("页码从 1 开始")]
    ZeroPage,

    #[error("起始页 {start} 大于结束页 {end}")]
    Reversed { start: usize, end: usize },

    #[error("结束页 {end} 超出文档页数 {page_count}")]
    OutOfBounds { end: usize, page_count: usize },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

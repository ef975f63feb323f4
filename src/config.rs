use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// 默认配置文件名，可以通过 `PDF_NOTES_CONFIG` 覆盖
pub const DEFAULT_CONFIG_FILE: &str = "pdf_notes.toml";

/// 程序配置
///
/// 启动时读取一次（默认值 ← TOML 文件 ← 环境变量），之后只读地向下传递。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 并发与超时 ---
    /// OCR 并发数（同时处理的页面数量）
    pub max_workers: usize,
    /// 单页 OCR 超时（秒）
    pub page_timeout_secs: u64,
    /// LLM 调用最大尝试次数
    pub retry_attempts: u32,
    /// 两次尝试之间的等待时间（秒）
    pub retry_delay_secs: u64,
    /// 单次 LLM 调用超时（秒）
    pub llm_timeout_secs: u64,

    // --- 文件与日志 ---
    /// PDF 存放目录
    pub pdf_folder: String,
    /// 笔记输出目录
    pub summary_folder: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- 外部工具 ---
    /// 渲染分辨率
    pub dpi: u32,
    pub pdftoppm_cmd: String,
    pub pdfinfo_cmd: String,
    pub tesseract_cmd: String,
    /// tesseract 语言代码
    pub ocr_language: String,

    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    /// 本地没有 ollama 服务时是否自动启动
    pub start_ollama: bool,
    pub ollama_port: u16,
    pub ollama_cmd: String,
    /// 按字符数切分 OCR 文本后分段生成笔记，0 表示不切分
    pub chunk_chars: usize,

    // --- 输出模式 ---
    /// 只做 OCR，不调用 LLM
    pub ocr_only: bool,
    /// 额外保存 OCR 原文
    pub save_ocr_text: bool,

    // --- 预设参数（设置后跳过对应的交互提问）---
    pub pdf_file: Option<String>,
    pub page_range: Option<String>,
    pub headings: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: default_workers(),
            page_timeout_secs: 60,
            retry_attempts: 3,
            retry_delay_secs: 5,
            llm_timeout_secs: 120,
            pdf_folder: "pdf".to_string(),
            summary_folder: "summary".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            dpi: 300,
            pdftoppm_cmd: "pdftoppm".to_string(),
            pdfinfo_cmd: "pdfinfo".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.6,
            start_ollama: false,
            ollama_port: 11434,
            ollama_cmd: "ollama".to_string(),
            chunk_chars: 0,
            ocr_only: false,
            save_ocr_text: false,
            pdf_file: None,
            page_range: None,
            headings: None,
        }
    }
}

/// 可用 CPU 并行度，取不到时退回 1
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Config {
    /// 只从环境变量读取（不读配置文件）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// 读取配置文件（不存在则使用默认值），再用环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PDF_NOTES_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_file_or_default(Path::new(&path))?.with_overrides(|name| std::env::var(name).ok())
    }

    /// 读取 TOML 配置文件；文件不存在时返回默认配置
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 用 `lookup` 提供的变量覆盖当前配置，然后校验
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup: &lookup };

        env.parse("MAX_WORKERS", &mut self.max_workers)?;
        env.parse("PAGE_TIMEOUT_SECS", &mut self.page_timeout_secs)?;
        env.parse("RETRY_ATTEMPTS", &mut self.retry_attempts)?;
        env.parse("RETRY_DELAY_SECS", &mut self.retry_delay_secs)?;
        env.parse("LLM_TIMEOUT_SECS", &mut self.llm_timeout_secs)?;
        env.string("PDF_FOLDER", &mut self.pdf_folder);
        env.string("SUMMARY_FOLDER", &mut self.summary_folder);
        env.string("OUTPUT_LOG_FILE", &mut self.output_log_file);
        env.parse("VERBOSE_LOGGING", &mut self.verbose_logging)?;
        env.parse("PDF_DPI", &mut self.dpi)?;
        env.string("PDFTOPPM_CMD", &mut self.pdftoppm_cmd);
        env.string("PDFINFO_CMD", &mut self.pdfinfo_cmd);
        env.string("TESSERACT_CMD", &mut self.tesseract_cmd);
        env.string("OCR_LANGUAGE", &mut self.ocr_language);
        env.string("OPENAI_API_KEY", &mut self.llm_api_key);
        env.string("LLM_API_BASE_URL", &mut self.llm_api_base_url);
        env.string("LLM_MODEL_NAME", &mut self.llm_model_name);
        env.parse("LLM_TEMPERATURE", &mut self.llm_temperature)?;
        env.parse("START_OLLAMA", &mut self.start_ollama)?;
        env.parse("OLLAMA_PORT", &mut self.ollama_port)?;
        env.string("OLLAMA_CMD", &mut self.ollama_cmd);
        env.parse("CHUNK_CHARS", &mut self.chunk_chars)?;
        env.parse("OCR_ONLY", &mut self.ocr_only)?;
        env.parse("SAVE_OCR_TEXT", &mut self.save_ocr_text)?;
        env.optional("NOTES_PDF", &mut self.pdf_file);
        env.optional("NOTES_PAGE_RANGE", &mut self.page_range);
        env.optional("NOTES_HEADINGS", &mut self.headings);

        self.validate()?;
        Ok(self)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(invalid("max_workers", "必须大于 0"));
        }
        if self.page_timeout_secs == 0 {
            return Err(invalid("page_timeout_secs", "必须大于 0"));
        }
        if self.llm_timeout_secs == 0 {
            return Err(invalid("llm_timeout_secs", "必须大于 0"));
        }
        if self.retry_attempts == 0 {
            return Err(invalid("retry_attempts", "至少尝试 1 次"));
        }
        for (field, value) in [
            ("pdftoppm_cmd", &self.pdftoppm_cmd),
            ("pdfinfo_cmd", &self.pdfinfo_cmd),
            ("tesseract_cmd", &self.tesseract_cmd),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "命令不能为空"));
            }
        }
        Ok(())
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

struct EnvReader<'a, F> {
    lookup: &'a F,
}

impl<F> EnvReader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn parse<T: FromStr>(&self, name: &str, target: &mut T) -> Result<(), ConfigError> {
        if let Some(value) = (self.lookup)(name) {
            *target = value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: value.clone(),
                expected_type: std::any::type_name::<T>().to_string(),
            })?;
        }
        Ok(())
    }

    fn string(&self, name: &str, target: &mut String) {
        if let Some(value) = (self.lookup)(name) {
            *target = value;
        }
    }

    fn optional(&self, name: &str, target: &mut Option<String>) {
        if let Some(value) = (self.lookup)(name) {
            *target = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.max_workers >= 1);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = Config::default()
            .with_overrides(lookup(&[
                ("MAX_WORKERS", "2"),
                ("PAGE_TIMEOUT_SECS", "15"),
                ("LLM_MODEL_NAME", "llama3"),
                ("OCR_ONLY", "true"),
                ("NOTES_HEADINGS", "Intro, Pointers"),
            ]))
            .unwrap();

        assert_eq!(config.max_workers, 2);
        assert_eq!(config.page_timeout(), Duration::from_secs(15));
        assert_eq!(config.llm_model_name, "llama3");
        assert!(config.ocr_only);
        assert_eq!(config.headings.as_deref(), Some("Intro, Pointers"));
    }

    #[test]
    fn bad_env_value_is_reported() {
        let err = Config::default()
            .with_overrides(lookup(&[("RETRY_ATTEMPTS", "three")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvVarParseFailed { ref var_name, .. } if var_name == "RETRY_ATTEMPTS"
        ));
    }

    #[test]
    fn zero_workers_rejected() {
        let err = Config::default()
            .with_overrides(lookup(&[("MAX_WORKERS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_workers", .. }));
    }

    #[test]
    fn toml_file_overlays_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdf_notes.toml");
        std::fs::write(&path, "max_workers = 3\nretry_delay_secs = 1\nsummary_folder = \"out\"\n").unwrap();

        let config = Config::from_file_or_default(&path).unwrap();
        assert_eq!(config.max_workers, 3);
        assert_eq!(config.retry_delay_secs, 1);
        assert_eq!(config.summary_folder, "out");
        assert_eq!(config.page_timeout_secs, 60);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.pdf_folder, "pdf");
    }
}

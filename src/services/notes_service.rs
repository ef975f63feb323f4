//! 笔记生成服务 - 业务能力层
//!
//! 把 OCR 得到的文字（"facts"）和用户给出的标题拼成提示词，交给 LLM 生成 Markdown 笔记。

use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::services::llm_service::{ChatBackend, ChatRequest};
use crate::services::retry::RetryPolicy;

/// 笔记生成服务
pub struct NotesService<B> {
    backend: B,
    retry: RetryPolicy,
    /// 每段最多字符数，0 表示不切分
    chunk_chars: usize,
}

impl<B: ChatBackend> NotesService<B> {
    pub fn new(backend: B, retry: RetryPolicy, chunk_chars: usize) -> Self {
        Self {
            backend,
            retry,
            chunk_chars,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 生成笔记
    ///
    /// 文字过长且配置了 `chunk_chars` 时，按段依次生成，再用空行拼接。
    pub async fn generate(&self, facts: &str, headings: &[String]) -> AppResult<String> {
        if facts.trim().is_empty() {
            return Err(AppError::EmptyFacts);
        }

        let system = build_system_prompt(headings);
        let chunks = if self.chunk_chars == 0 {
            vec![facts.trim().to_string()]
        } else {
            chunk_text(facts, self.chunk_chars)
        };

        let total = chunks.len();
        if total > 1 {
            info!("✂️ 文字较长，分为 {} 段生成笔记", total);
        }

        let mut parts = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            let user = if total == 1 {
                format!("Lecture slides: {}", chunk)
            } else {
                format!("Lecture slides (part {} of {}): {}", i + 1, total, chunk)
            };
            let request = ChatRequest {
                system: system.clone(),
                user,
            };
            let label = format!("笔记 {}/{}", i + 1, total);

            let reply = self
                .retry
                .run(&label, || self.backend.complete(&request))
                .await?;

            debug!("[{}] 返回 {} 字符", label, reply.content.len());
            parts.push(reply.content);
        }

        Ok(parts.join("\n\n"))
    }
}

/// 解析逗号分隔的标题列表，忽略空项
pub fn parse_headings(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

/// 构建系统提示词
pub fn build_system_prompt(headings: &[String]) -> String {
    let heading_part = if headings.is_empty() {
        "No headings were given, so select headings from the lecture slides that will cover all of the topics."
            .to_string()
    } else {
        format!(
            "Create detailed notes under the following main headings: {}.",
            headings.join(", ")
        )
    };

    format!(
        "You are a note-taking assistant. {} For each heading, generate subheadings where appropriate \
         to ensure all key topics are covered in a structured manner. Provide thorough explanations, \
         examples, code snippets, formulas, and diagrams as needed. Organize the content logically, \
         ensuring that each subheading is relevant and elaborates on the topics mentioned in the lecture. \
         Present the notes in markdown format.",
        heading_part
    )
}

/// 按空白切分文字，每段不超过 `max_chars` 个字符
///
/// 单个超长的词会独占一段。
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteCallError;
    use crate::services::llm_service::ChatReply;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// 按顺序返回预设结果，并记录收到的请求
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, RemoteCallError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String, RemoteCallError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for ScriptedBackend {
        async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, RemoteCallError> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteCallError::Rejected("no more replies".into())));
            next.map(|content| ChatReply {
                content,
                total_tokens: Some(10),
            })
        }
    }

    fn retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5), Duration::from_secs(30))
    }

    #[test]
    fn headings_are_trimmed() {
        assert_eq!(
            parse_headings(" Intro , Memory,, Pointers "),
            vec!["Intro", "Memory", "Pointers"]
        );
        assert!(parse_headings("  ").is_empty());
    }

    #[test]
    fn prompt_mentions_headings_or_fallback() {
        let prompt = build_system_prompt(&["Intro".into(), "Memory".into()]);
        assert!(prompt.contains("Intro, Memory"));
        assert!(build_system_prompt(&[]).contains("select headings"));
    }

    #[test]
    fn chunks_respect_limit() {
        let chunks = chunk_text("aa bb cc dd ee", 5);
        assert_eq!(chunks, vec!["aa bb", "cc dd", "ee"]);

        let chunks = chunk_text("tiny enormousword x", 4);
        assert_eq!(chunks, vec!["tiny", "enormousword", "x"]);

        assert!(chunk_text("   ", 10).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn retries_connection_failures() {
        let backend = ScriptedBackend::new(vec![
            Err(RemoteCallError::Connection("refused".into())),
            Ok("# Notes".into()),
        ]);
        let service = NotesService::new(backend, retry(), 0);

        let notes = service.generate("slide text", &["Intro".into()]).await.unwrap();
        assert_eq!(notes, "# Notes");

        let requests = service.backend().requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].user, "Lecture slides: slide text");
        assert!(requests[0].system.contains("Intro"));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_to_caller() {
        let backend = ScriptedBackend::new(vec![
            Err(RemoteCallError::Connection("refused".into())),
            Err(RemoteCallError::Connection("refused".into())),
            Err(RemoteCallError::Connection("refused".into())),
        ]);
        let service = NotesService::new(backend, retry(), 0);

        let err = service.generate("slide text", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::RemoteCall(RemoteCallError::Exhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn empty_facts_are_refused() {
        let service = NotesService::new(ScriptedBackend::new(vec![]), retry(), 0);
        let err = service.generate(" \n ", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyFacts));
        assert!(service.backend().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chunked_generation_joins_parts() {
        let backend = ScriptedBackend::new(vec![Ok("part one".into()), Ok("part two".into())]);
        let service = NotesService::new(backend, retry(), 11);

        let notes = service.generate("alpha beta gamma delta", &[]).await.unwrap();
        assert_eq!(notes, "part one\n\npart two");

        let requests = service.backend().requests.lock().unwrap();
        assert_eq!(requests[0].user, "Lecture slides (part 1 of 2): alpha beta");
        assert_eq!(requests[1].user, "Lecture slides (part 2 of 2): gamma delta");
    }
}

//! 批量 OCR - 编排层核心
//!
//! ## 职责
//!
//! 把一组按页排列的图片并发交给 OCR 引擎，最终按页码顺序返回文字。
//!
//! ## 并发模型
//!
//! - 使用 Semaphore 限制同时运行的 OCR 调用数量，按页码顺序派发
//! - 每页在阻塞线程池中执行 OCR，并受单页超时限制
//! - 按完成顺序收集结果，最后按页码重新排序（不能按完成顺序拼接）
//! - 单页失败或超时只影响该页，对应位置为空字符串
//!
//! 超时只是不再等待该页的结果：底层的 OCR 调用没有取消手段，会继续运行到结束，
//! 它占用的并发名额也要等调用真正返回后才释放，同时运行的 OCR 调用始终不超过 `max_workers`。

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::infrastructure::OcrEngine;
use crate::models::{BatchExtraction, PageFailure, PageImage, PageOutcome, PageResult};

/// 批量 OCR 处理器
pub struct BatchOcrExtractor {
    engine: Arc<dyn OcrEngine>,
    max_workers: usize,
    page_timeout: Duration,
}

impl BatchOcrExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, max_workers: usize, page_timeout: Duration) -> Self {
        Self {
            engine,
            max_workers: max_workers.max(1),
            page_timeout,
        }
    }

    pub fn from_config(engine: Arc<dyn OcrEngine>, config: &Config) -> Self {
        Self::new(engine, config.max_workers, config.page_timeout())
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// 处理一批页面
    ///
    /// 返回的结果与输入一一对应并按页码排序；不会因为单页失败而返回错误。
    pub async fn extract(&self, images: Vec<PageImage>) -> BatchExtraction {
        if images.is_empty() {
            info!("📭 没有需要处理的页面");
            return BatchExtraction::default();
        }

        let total = images.len();
        log_batch_start(total, self.max_workers, self.page_timeout);

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut pending = FuturesUnordered::new();
        let mut results = Vec::with_capacity(total);

        // 按页码顺序派发
        for image in images {
            let index = image.index;
            let page_number = image.page_number;

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                // 信号量只在本函数内使用，不会被关闭
                results.push(PageResult {
                    index,
                    page_number,
                    outcome: PageOutcome::Failed(PageFailure::Panicked("并发控制已关闭".to_string())),
                    elapsed: Duration::ZERO,
                });
                continue;
            };

            let engine = Arc::clone(&self.engine);
            let page_timeout = self.page_timeout;

            let handle = tokio::spawn(async move {
                let started = Instant::now();

                // 名额随阻塞调用一起释放，超时后不会被下一页提前占用
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    engine.extract_text(&image)
                });
                let outcome = match timeout(page_timeout, work).await {
                    Ok(Ok(Ok(text))) => PageOutcome::Extracted(text),
                    Ok(Ok(Err(e))) => PageOutcome::Failed(PageFailure::Engine(format!("{:#}", e))),
                    Ok(Err(join_err)) => PageOutcome::Failed(PageFailure::Panicked(join_err.to_string())),
                    Err(_) => PageOutcome::Failed(PageFailure::TimedOut(page_timeout)),
                };

                (outcome, started.elapsed())
            });

            pending.push(handle.map(move |joined| (index, page_number, joined)));
        }

        // 按完成顺序收集
        while let Some((index, page_number, joined)) = pending.next().await {
            let (outcome, elapsed) = match joined {
                Ok(done) => done,
                Err(e) => (
                    PageOutcome::Failed(PageFailure::Panicked(e.to_string())),
                    Duration::ZERO,
                ),
            };

            match &outcome {
                PageOutcome::Extracted(text) => {
                    debug!("[第 {} 页] ✓ 提取 {} 字符，用时 {:?}", page_number, text.len(), elapsed);
                }
                PageOutcome::Failed(failure) => {
                    warn!("[第 {} 页] ⚠️ {}，该页按空白处理", page_number, failure);
                }
            }

            results.push(PageResult {
                index,
                page_number,
                outcome,
                elapsed,
            });
        }

        let batch = BatchExtraction::from_unordered(results);
        log_batch_complete(&batch);
        batch
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_start(total: usize, max_workers: usize, page_timeout: Duration) {
    info!("{}", "=".repeat(60));
    info!("🔍 开始 OCR: 共 {} 页", total);
    info!("📊 最大并发数: {} | 单页超时: {:?}", max_workers, page_timeout);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(batch: &BatchExtraction) {
    info!("{}", "─".repeat(60));
    info!("✓ OCR 完成: 成功 {}/{}", batch.succeeded(), batch.len());
    if batch.failed() > 0 {
        warn!("❌ 失败页码: {:?}", batch.failed_pages());
    }
    if let Some(warning) = batch.warning() {
        warn!("⚠️ {}", warning);
    }
    info!("{}", "─".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowEngine {
        delay: Duration,
    }

    impl OcrEngine for SlowEngine {
        fn extract_text(&self, image: &PageImage) -> anyhow::Result<String> {
            if image.index == 1 {
                std::thread::sleep(self.delay);
            }
            Ok(format!("page {}", image.page_number))
        }
    }

    fn pages(n: usize) -> Vec<PageImage> {
        (0..n)
            .map(|i| PageImage::new(i, i + 1, format!("page-{}.png", i + 1)))
            .collect()
    }

    #[tokio::test]
    async fn empty_input_dispatches_nothing() {
        let extractor = BatchOcrExtractor::new(
            Arc::new(SlowEngine { delay: Duration::ZERO }),
            4,
            Duration::from_secs(1),
        );

        let batch = extractor.extract(Vec::new()).await;
        assert!(batch.is_empty());
        assert_eq!(batch.concatenated(), "");
        assert_eq!(batch.warning(), Some(crate::models::BatchWarning::NothingToProcess));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_page_times_out_without_blocking_siblings() {
        let extractor = BatchOcrExtractor::new(
            Arc::new(SlowEngine {
                delay: Duration::from_millis(1500),
            }),
            3,
            Duration::from_millis(200),
        );

        let started = Instant::now();
        let batch = extractor.extract(pages(3)).await;
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_millis(1200), "took {:?}", elapsed);
        assert_eq!(batch.texts(), vec!["page 1", "", "page 3"]);
        assert_eq!(
            batch.pages()[1].outcome,
            PageOutcome::Failed(PageFailure::TimedOut(Duration::from_millis(200)))
        );
    }

    #[test]
    fn zero_workers_clamped() {
        let extractor = BatchOcrExtractor::new(
            Arc::new(SlowEngine { delay: Duration::ZERO }),
            0,
            Duration::from_secs(1),
        );
        assert_eq!(extractor.max_workers(), 1);
    }
}

//! 题目探测器抽象
//!
//! DOM 抓取是外部协作者，这里只定义它交给核心的数据形状与时间约束：探测有
//! 等待上限，超时报告「未找到」而不是无限挂起。浏览器之外的宿主用轮询或事件
//! 订阅实现同一接口；ScriptedDetector 是可编程实现，供测试与演示二进制使用。

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, watch, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::DetectorSection;
use crate::protocol::{CodeSnapshot, ProblemSnapshot};

/// 题目变更订阅：事件流 + 取消句柄
pub struct ChangeWatch {
    events: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
}

impl ChangeWatch {
    /// 下一次变更事件；订阅取消或探测器关闭时返回 None
    pub async fn next(&mut self) -> Option<()> {
        self.events.recv().await
    }

    /// 取消订阅
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// 题目探测器接口
#[async_trait]
pub trait ProblemDetector: Send + Sync {
    /// 探测当前题目；页面在等待上限内未就绪时返回 None
    async fn detect_problem(&self) -> Option<ProblemSnapshot>;

    /// 读取编辑器当前代码（有界等待，失败时返回空代码）
    async fn current_code(&self) -> CodeSnapshot;

    /// 订阅题目身份变更
    fn observe_changes(&self) -> ChangeWatch;
}

/// 可编程探测器：按脚本驱动题目与代码状态
pub struct ScriptedDetector {
    problem: watch::Sender<Option<ProblemSnapshot>>,
    code: RwLock<CodeSnapshot>,
    changes: broadcast::Sender<()>,
    problem_wait: Duration,
    description_max_chars: usize,
}

impl ScriptedDetector {
    pub fn new(config: &DetectorSection) -> Self {
        let (problem, _) = watch::channel(None);
        let (changes, _) = broadcast::channel(16);
        Self {
            problem,
            code: RwLock::new(CodeSnapshot {
                code: String::new(),
                language: "javascript".to_string(),
            }),
            changes,
            problem_wait: Duration::from_millis(config.problem_wait_ms),
            description_max_chars: config.description_max_chars,
        }
    }

    /// 设置当前题目（描述按配置上限截断），并通知订阅者
    pub fn set_problem(&self, mut snapshot: ProblemSnapshot) {
        snapshot.description = truncate_chars(&snapshot.description, self.description_max_chars);
        let _ = self.problem.send(Some(snapshot));
        let _ = self.changes.send(());
    }

    /// 清空当前题目（如离开题目页面），并通知订阅者
    pub fn clear_problem(&self) {
        let _ = self.problem.send(None);
        let _ = self.changes.send(());
    }

    /// 设置编辑器当前代码
    pub async fn set_code(&self, code: CodeSnapshot) {
        *self.code.write().await = code;
    }
}

#[async_trait]
impl ProblemDetector for ScriptedDetector {
    async fn detect_problem(&self) -> Option<ProblemSnapshot> {
        let mut rx = self.problem.subscribe();
        let result = match tokio::time::timeout(self.problem_wait, rx.wait_for(|p| p.is_some())).await {
            Ok(Ok(snapshot)) => (*snapshot).clone(),
            _ => None,
        };
        result
    }

    async fn current_code(&self) -> CodeSnapshot {
        self.code.read().await.clone()
    }

    fn observe_changes(&self) -> ChangeWatch {
        let mut source = self.changes.subscribe();
        let (tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    event = source.recv() => match event {
                        Ok(()) => {
                            if tx.send(()).is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        ChangeWatch { events, cancel }
    }
}

/// 按字符数截断（不切分多字节字符）
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Difficulty;

    fn sample_problem(id: &str) -> ProblemSnapshot {
        ProblemSnapshot {
            problem_id: id.to_string(),
            title: "Two Sum".to_string(),
            difficulty: Difficulty::Easy,
            description: "Given an array of integers...".to_string(),
            url: format!("https://example.com/problems/{}", id),
        }
    }

    fn fast_config() -> DetectorSection {
        DetectorSection {
            problem_wait_ms: 50,
            code_wait_ms: 50,
            description_max_chars: 1000,
        }
    }

    #[tokio::test]
    async fn test_bounded_wait_reports_absent() {
        let detector = ScriptedDetector::new(&fast_config());
        assert!(detector.detect_problem().await.is_none());
    }

    #[tokio::test]
    async fn test_detects_problem_set_during_wait() {
        let detector = std::sync::Arc::new(ScriptedDetector::new(&DetectorSection {
            problem_wait_ms: 1000,
            ..fast_config()
        }));

        let background = std::sync::Arc::clone(&detector);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            background.set_problem(sample_problem("two-sum"));
        });

        let detected = detector.detect_problem().await.unwrap();
        assert_eq!(detected.problem_id, "two-sum");
    }

    #[tokio::test]
    async fn test_description_is_capped() {
        let detector = ScriptedDetector::new(&DetectorSection {
            description_max_chars: 10,
            ..fast_config()
        });
        let mut problem = sample_problem("two-sum");
        problem.description = "x".repeat(100);
        detector.set_problem(problem);

        let detected = detector.detect_problem().await.unwrap();
        assert_eq!(detected.description.len(), 10);
    }

    #[tokio::test]
    async fn test_change_watch_delivers_and_cancels() {
        let detector = ScriptedDetector::new(&fast_config());
        let mut watch = detector.observe_changes();

        detector.set_problem(sample_problem("two-sum"));
        assert_eq!(watch.next().await, Some(()));

        watch.cancel();
        detector.set_problem(sample_problem("three-sum"));
        // 取消后事件流终止（已入队的事件允许被排空）
        let drained = tokio::time::timeout(Duration::from_millis(200), async {
            while watch.next().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }
}

//! 后台主路由
//!
//! 后台上下文的唯一入口：收到信封后按 type 选处理器，恰好回一条响应。
//! 处理器之间无共享状态，全部状态在存储里；不同键上的操作互相独立，
//! 同键写入按「最后完成者胜出」。
//!
//! 传输层是通用的异步请求/应答抽象：RouterHandle 经 mpsc 携带
//! `(Request, oneshot::Sender<Response>)`，服务循环对每个请求 spawn 一个任务，
//! 多个处理器各自挂起在自己的 I/O 点上并发推进。调用方停止等待只是丢弃响应，
//! 处理器照常跑完并提交存储效果。

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::ai::{ClientFactory, HintOrchestrator, HintRequest};
use crate::error::MentorError;
use crate::protocol::{Request, Response};
use crate::store::{self, KvStore};

/// 后台主路由
pub struct HostRouter {
    store: Arc<dyn KvStore>,
    orchestrator: HintOrchestrator,
    shutdown: watch::Sender<bool>,
}

/// 路由句柄：向服务循环提交请求并等待响应
#[derive(Clone)]
pub struct RouterHandle {
    tx: mpsc::UnboundedSender<(Request, oneshot::Sender<Response>)>,
}

impl RouterHandle {
    /// 提交一个请求，等待它的那一条响应
    pub async fn request(&self, request: Request) -> Response {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.tx.send((request, reply_tx)).is_err() {
            return Response::error("Router is not running");
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Response::error("Router is not running"))
    }
}

impl HostRouter {
    pub fn new(store: Arc<dyn KvStore>, factory: ClientFactory) -> Self {
        let orchestrator = HintOrchestrator::new(Arc::clone(&store), factory);
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            orchestrator,
            shutdown,
        }
    }

    /// 启动服务循环，返回请求句柄
    pub fn start(self: Arc<Self>) -> RouterHandle {
        let (tx, mut rx) = mpsc::unbounded_channel::<(Request, oneshot::Sender<Response>)>();
        let mut shutdown_rx = self.shutdown.subscribe();
        let router = self;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    inbound = rx.recv() => {
                        let Some((request, reply_tx)) = inbound else { break };
                        let router = Arc::clone(&router);
                        tokio::spawn(async move {
                            let response = router.dispatch(request).await;
                            // 调用方可能已放弃等待，响应丢弃即可
                            let _ = reply_tx.send(response);
                        });
                    }
                }
            }
            tracing::info!("Router serve loop stopped");
        });

        RouterHandle { tx }
    }

    /// 停止服务循环
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// 分发一个请求到对应处理器
    pub async fn dispatch(&self, request: Request) -> Response {
        tracing::debug!(request = ?request_type(&request), "Dispatching request");

        match request {
            Request::GetAiResponse {
                user_message,
                problem_id,
                problem_context,
                code,
                language,
            } => {
                if user_message.trim().is_empty() {
                    return Response::error("Message is empty");
                }
                self.handle_hint(HintRequest {
                    problem_id,
                    user_message,
                    problem_context,
                    code,
                    language,
                })
                .await
            }

            Request::SaveConversation {
                problem_id,
                messages,
            } => {
                match store::save_conversation(self.store.as_ref(), &problem_id, &messages).await {
                    Ok(()) => Response::ok(),
                    Err(e) => {
                        tracing::error!("Error saving conversation: {}", e);
                        Response::error("Failed to save conversation")
                    }
                }
            }

            Request::GetConversation { problem_id } => {
                match store::load_conversation(self.store.as_ref(), &problem_id).await {
                    Ok(messages) => Response::Conversation { messages },
                    Err(e) => {
                        tracing::error!("Error getting conversation: {}", e);
                        Response::error("Failed to get conversation")
                    }
                }
            }

            Request::ClearConversation { problem_id } => {
                match store::clear_conversation(self.store.as_ref(), &problem_id).await {
                    Ok(()) => Response::ok(),
                    Err(e) => {
                        tracing::error!("Error clearing conversation: {}", e);
                        Response::error("Failed to clear conversation")
                    }
                }
            }

            Request::GetSettings => match store::load_settings(self.store.as_ref()).await {
                Ok(settings) => Response::Settings { settings },
                Err(e) => {
                    tracing::error!("Error getting settings: {}", e);
                    Response::error("Failed to get settings")
                }
            },

            Request::SaveSettings(patch) => {
                match store::merge_settings(self.store.as_ref(), &patch).await {
                    Ok(()) => Response::ok(),
                    Err(e) => {
                        tracing::error!("Error saving settings: {}", e);
                        Response::error("Failed to save settings")
                    }
                }
            }
        }
    }

    /// 解析文本信封并分发；无法识别的 type 不触碰存储，直接回「未知请求」
    pub async fn dispatch_json(&self, text: &str) -> Response {
        match serde_json::from_str::<Request>(text) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                tracing::warn!("Unrecognized envelope: {}", e);
                Response::error(MentorError::UnknownRequest.to_string())
            }
        }
    }

    async fn handle_hint(&self, request: HintRequest) -> Response {
        match self.orchestrator.respond(request).await {
            Ok(text) => Response::AiResponse { response: text },
            Err(e) => {
                tracing::error!("Error getting AI response: {}", e);
                Response::error(e.to_string())
            }
        }
    }
}

fn request_type(request: &Request) -> &'static str {
    match request {
        Request::GetAiResponse { .. } => "GET_AI_RESPONSE",
        Request::SaveConversation { .. } => "SAVE_CONVERSATION",
        Request::GetConversation { .. } => "GET_CONVERSATION",
        Request::ClearConversation { .. } => "CLEAR_CONVERSATION",
        Request::GetSettings => "GET_SETTINGS",
        Request::SaveSettings(_) => "SAVE_SETTINGS",
    }
}

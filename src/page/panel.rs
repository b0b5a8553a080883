//! 无头面板客户端
//!
//! 面板 UI 的核心行为（渲染之外的部分）：持有展示用转录，收到 PROBLEM_DATA
//! 时加载该题的存储历史，经路由句柄发出类型化请求；错误结果以助手样式进入
//! 转录。autoSync 开启时提问前自动附带编辑器当前代码。

use std::time::Duration;

use crate::protocol::{
    ChatMessage, CodeSnapshot, ProblemSnapshot, RelayMessage, Request, Response, UserSettings,
};
use crate::relay::PanelPort;
use crate::router::RouterHandle;

/// 等待页面代理应答 CURRENT_CODE 的上限
const CODE_REPLY_WAIT: Duration = Duration::from_millis(1500);

/// 面板客户端
pub struct PanelClient {
    port: PanelPort,
    router: RouterHandle,
    problem: Option<ProblemSnapshot>,
    last_code: Option<CodeSnapshot>,
    transcript: Vec<ChatMessage>,
}

impl PanelClient {
    pub fn new(port: PanelPort, router: RouterHandle) -> Self {
        Self {
            port,
            router,
            problem: None,
            last_code: None,
            transcript: Vec::new(),
        }
    }

    /// 通知页面代理面板已加载
    pub fn announce_ready(&self) {
        self.port.send(RelayMessage::SidebarReady);
    }

    /// 请求关闭面板
    pub fn close(&self) {
        self.port.send(RelayMessage::CloseSidebar);
    }

    pub fn problem(&self) -> Option<&ProblemSnapshot> {
        self.problem.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    /// 处理一条页面代理的推送
    pub async fn handle_relay(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::ProblemData(snapshot) => {
                self.problem = snapshot;
                self.transcript.clear();
                if let Some(problem) = self.problem.clone() {
                    let response = self
                        .router
                        .request(Request::GetConversation {
                            problem_id: problem.problem_id.clone(),
                        })
                        .await;
                    if let Response::Conversation { messages } = response {
                        self.transcript = messages;
                    }
                }
            }
            RelayMessage::CurrentCode(code) => {
                self.last_code = Some(code);
            }
            other => {
                tracing::debug!(?other, "Ignoring unexpected page frame");
            }
        }
    }

    /// 排空当前待处理的页面推送
    pub async fn pump(&mut self) {
        while let Some(message) = self.port.try_recv() {
            self.handle_relay(message).await;
        }
    }

    /// 发出一个问题，返回进入转录的助手侧文本（成功的回答或错误消息）
    pub async fn ask(&mut self, user_message: &str) -> String {
        self.pump().await;

        let Some(problem) = self.problem.clone() else {
            return "No problem detected on this page yet.".to_string();
        };

        let settings = match self.router.request(Request::GetSettings).await {
            Response::Settings { settings } => settings,
            _ => UserSettings::default(),
        };

        let code = if settings.auto_sync {
            self.request_code().await
        } else {
            None
        };

        let request = Request::GetAiResponse {
            user_message: user_message.to_string(),
            problem_id: problem.problem_id.clone(),
            problem_context: Some(problem_context(&problem)),
            code: code.as_ref().map(|c| c.code.clone()),
            language: code.as_ref().map(|c| c.language.clone()),
        };

        let reply = match self.router.request(request).await {
            Response::AiResponse { response } => response,
            Response::Error { error } => error,
            other => {
                tracing::warn!(?other, "Unexpected response shape for hint request");
                "Something went wrong.".to_string()
            }
        };

        self.transcript.push(ChatMessage::user(user_message));
        self.transcript.push(ChatMessage::assistant(reply.as_str()));
        reply
    }

    /// 清空当前题目的会话
    pub async fn clear(&mut self) {
        if let Some(problem) = &self.problem {
            let _ = self
                .router
                .request(Request::ClearConversation {
                    problem_id: problem.problem_id.clone(),
                })
                .await;
        }
        self.transcript.clear();
    }

    /// 向页面代理要当前代码，等待有界
    async fn request_code(&mut self) -> Option<CodeSnapshot> {
        self.port.send(RelayMessage::GetCurrentCode);

        let wait = tokio::time::timeout(CODE_REPLY_WAIT, async {
            loop {
                match self.port.recv().await {
                    Some(RelayMessage::CurrentCode(code)) => {
                        self.last_code = Some(code.clone());
                        return Some(code);
                    }
                    Some(other) => self.handle_relay(other).await,
                    None => return None,
                }
            }
        })
        .await;

        match wait {
            Ok(code) => code,
            // 超时退回到上一次拿到的代码
            Err(_) => self.last_code.clone(),
        }
    }
}

/// 拼装发给后台的题目上下文块
fn problem_context(problem: &ProblemSnapshot) -> String {
    format!(
        "{} [{}]\n{}\n\n{}",
        problem.title, problem.difficulty, problem.url, problem.description
    )
}

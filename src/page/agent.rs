//! 页面代理状态机
//!
//! 每个宿主页面一个实例：`Idle → Detecting → Ready`，题目身份变化时重新进入
//! Detecting 再回到 Ready；面板可见时推送新的 PROBLEM_DATA。面板可见性是独立
//! 的二值状态，由用户动作或 CLOSE_SIDEBAR 切换。

use std::sync::Arc;

use crate::page::detector::ProblemDetector;
use crate::protocol::{ProblemSnapshot, RelayMessage};
use crate::relay::PageEndpoint;

/// 页面代理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Detecting,
    Ready,
}

/// 面板可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelVisibility {
    Hidden,
    Visible,
}

/// 页面代理
pub struct PageAgent {
    detector: Arc<dyn ProblemDetector>,
    endpoint: PageEndpoint,
    state: AgentState,
    visibility: PanelVisibility,
    /// 设置里 showToggleButton 为 false 时，切换入口不生效
    show_toggle: bool,
    current: Option<ProblemSnapshot>,
}

impl PageAgent {
    pub fn new(detector: Arc<dyn ProblemDetector>, endpoint: PageEndpoint, show_toggle: bool) -> Self {
        Self {
            detector,
            endpoint,
            state: AgentState::Idle,
            visibility: PanelVisibility::Hidden,
            show_toggle,
            current: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn visibility(&self) -> PanelVisibility {
        self.visibility
    }

    pub fn current_problem(&self) -> Option<&ProblemSnapshot> {
        self.current.as_ref()
    }

    /// 首次探测当前题目
    pub async fn initialize(&mut self) {
        self.refresh().await;
        if let Some(problem) = &self.current {
            tracing::info!(problem_id = %problem.problem_id, "Detected problem");
        }
    }

    /// 用户切换面板显隐；变为可见时推送当前题目
    pub fn toggle_panel(&mut self) {
        if !self.show_toggle {
            return;
        }
        self.visibility = match self.visibility {
            PanelVisibility::Hidden => PanelVisibility::Visible,
            PanelVisibility::Visible => PanelVisibility::Hidden,
        };
        if self.visibility == PanelVisibility::Visible {
            self.endpoint.send(RelayMessage::ProblemData(self.current.clone()));
        }
    }

    /// 响应一次题目变更通知
    pub async fn handle_change(&mut self) {
        let identity_changed = self.refresh().await;
        if identity_changed && self.visibility == PanelVisibility::Visible {
            self.endpoint.send(RelayMessage::ProblemData(self.current.clone()));
        }
    }

    /// 处理一条已鉴权的面板信号
    pub async fn handle_signal(&mut self, message: RelayMessage) {
        match message {
            RelayMessage::SidebarReady => {
                self.visibility = PanelVisibility::Visible;
                self.endpoint.send(RelayMessage::ProblemData(self.current.clone()));
            }
            RelayMessage::GetCurrentCode => {
                let code = self.detector.current_code().await;
                self.endpoint.send(RelayMessage::CurrentCode(code));
            }
            RelayMessage::CloseSidebar => {
                self.visibility = PanelVisibility::Hidden;
            }
            other => {
                tracing::debug!(?other, "Ignoring unexpected panel frame");
            }
        }
    }

    /// 服务循环：面板信号与题目变更二路复用，通道全部关闭时退出
    pub async fn run(mut self) {
        let mut changes = self.detector.observe_changes();
        loop {
            tokio::select! {
                signal = self.endpoint.recv() => match signal {
                    Some(message) => self.handle_signal(message).await,
                    None => break,
                },
                event = changes.next() => match event {
                    Some(()) => self.handle_change().await,
                    None => break,
                },
            }
        }
        changes.cancel();
        tracing::debug!("Page agent loop stopped");
    }

    /// 重新探测；返回题目身份是否变化
    async fn refresh(&mut self) -> bool {
        self.state = AgentState::Detecting;
        let detected = self.detector.detect_problem().await;
        let identity_changed = match (&self.current, &detected) {
            (Some(old), Some(new)) => old.problem_id != new.problem_id,
            (None, None) => false,
            _ => true,
        };
        self.current = detected;
        self.state = AgentState::Ready;
        identity_changed
    }
}

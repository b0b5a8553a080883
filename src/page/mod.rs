//! 页面层：题目探测器抽象、页面代理状态机、无头面板客户端

pub mod agent;
pub mod detector;
pub mod panel;

pub use agent::{AgentState, PageAgent, PanelVisibility};
pub use detector::{ChangeWatch, ProblemDetector, ScriptedDetector};
pub use panel::PanelClient;

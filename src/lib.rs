//! Mentor - Rust 刷题辅导核心
//!
//! 三个生命周期独立的执行上下文（页面代理、后台路由、面板 UI）通过类型化
//! 消息协作：探测题目状态、交换对话轮次、按题目持久化会话与用户偏好。
//!
//! 模块划分：
//! - **protocol**: `{type, payload}` 信封协议与数据模型（ChatMessage / UserSettings / ProblemSnapshot）
//! - **store**: 键值持久化抽象（内存 / 文件）与会话、设置的类型化读写
//! - **ai**: 补全客户端抽象与实现（OpenAI 兼容 / Mock）、技能分级提示词、提示编排
//! - **router**: 后台主路由（按 type 分发，一请求一响应）与 mpsc+oneshot 传输层
//! - **relay**: 页面代理与面板之间的来源鉴权双向通道
//! - **page**: 题目探测器抽象、页面代理状态机、无头面板客户端
//! - **config**: 应用配置加载（TOML + 环境变量）

pub mod ai;
pub mod config;
pub mod error;
pub mod page;
pub mod protocol;
pub mod relay;
pub mod router;
pub mod store;

pub use error::MentorError;

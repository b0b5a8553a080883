//! 信封协议层：各上下文之间唯一的通信契约
//!
//! 所有跨上下文消息都是 `{type, payload}` 信封；存储的 ChatMessage / UserSettings
//! 形状即持久化布局，跨版本保持稳定。

mod message;

pub use message::{
    now_ms, ChatMessage, CodeSnapshot, Difficulty, ProblemSnapshot, RelayMessage, Request,
    Response, Role, SettingsPatch, SkillLevel, UserSettings,
};

//! 消息协议定义
//!
//! 统一的 `{type, payload}` 信封格式：后台路由的请求/响应、页面代理与面板
//! 之间的生命周期信号，以及两者共享的数据模型。

use serde::{Deserialize, Serialize};

/// 当前 Unix 时间戳（毫秒）
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// 消息角色（与存储布局一致，小写字符串）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 单条对话消息；创建后不可变，会话内按插入序只追加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Unix 毫秒时间戳
    pub timestamp: u64,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: now_ms(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: now_ms(),
        }
    }
}

/// 技能分级：限制 AI 指导允许使用的词汇与数据结构复杂度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

/// 用户偏好（进程级单例，最后写入者胜）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub skill_level: SkillLevel,
    pub auto_sync: bool,
    pub show_toggle_button: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            skill_level: SkillLevel::Intermediate,
            auto_sync: true,
            show_toggle_button: true,
            api_key: None,
        }
    }
}

/// 设置的部分更新：未指定的字段保留原值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_sync: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_toggle_button: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl SettingsPatch {
    /// 将补丁合并到现有设置上（非破坏性：None 字段不动）
    pub fn apply_to(&self, settings: &mut UserSettings) {
        if let Some(level) = self.skill_level {
            settings.skill_level = level;
        }
        if let Some(auto_sync) = self.auto_sync {
            settings.auto_sync = auto_sync;
        }
        if let Some(show) = self.show_toggle_button {
            settings.show_toggle_button = show;
        }
        if let Some(ref key) = self.api_key {
            settings.api_key = Some(key.clone());
        }
    }
}

/// 题目难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

/// 外部探测器产出的题目快照；核心只中继，不持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSnapshot {
    pub problem_id: String,
    pub title: String,
    pub difficulty: Difficulty,
    /// 已按配置上限截断
    pub description: String,
    pub url: String,
}

/// 编辑器当前代码快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSnapshot {
    pub code: String,
    pub language: String,
}

/// 发往后台路由的请求信封；每种 type 恰好对应一种响应形状
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// 请求一次 AI 提示；userMessage 非空，problemId 必填
    #[serde(rename_all = "camelCase")]
    GetAiResponse {
        user_message: String,
        problem_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        problem_context: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },

    /// 整体覆盖某题的消息序列
    #[serde(rename_all = "camelCase")]
    SaveConversation {
        problem_id: String,
        messages: Vec<ChatMessage>,
    },

    /// 读取某题的消息序列（未存储时返回空序列）
    #[serde(rename_all = "camelCase")]
    GetConversation { problem_id: String },

    /// 清空某题的消息序列
    #[serde(rename_all = "camelCase")]
    ClearConversation { problem_id: String },

    /// 读取设置（缺失时返回默认值）
    GetSettings,

    /// 部分更新设置
    SaveSettings(SettingsPatch),
}

/// 后台路由的响应信封
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// GET_AI_RESPONSE 成功结果
    AiResponse { response: String },

    /// GET_CONVERSATION 成功结果
    Conversation { messages: Vec<ChatMessage> },

    /// GET_SETTINGS 成功结果
    Settings { settings: UserSettings },

    /// 写操作成功确认
    Ack { ok: bool },

    /// 结构化错误（处理器内部失败从不向上 panic）
    Error { error: String },
}

impl Response {
    pub fn ok() -> Self {
        Response::Ack { ok: true }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            error: message.into(),
        }
    }
}

/// 中继通道消息：面板生命周期信号（与请求信封同一线格式约定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayMessage {
    /// 面板加载完成（面板 → 页面代理）
    SidebarReady,

    /// 推送当前题目（页面代理 → 面板；无题目时为 null）
    ProblemData(Option<ProblemSnapshot>),

    /// 请求编辑器当前代码（面板 → 页面代理）
    GetCurrentCode,

    /// 当前代码应答（页面代理 → 面板）
    CurrentCode(CodeSnapshot),

    /// 关闭面板（面板 → 页面代理）
    CloseSidebar,
}

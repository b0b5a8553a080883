//! 中继层：页面代理与面板之间的来源鉴权双向通道

mod bridge;

pub use bridge::{new_panel_id, PageEndpoint, PanelId, PanelPort, RelayBridge, RelaySender};

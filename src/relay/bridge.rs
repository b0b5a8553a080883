//! 中继通道
//!
//! 页面代理与面板之间的双向消息通道。通道对任意持有发送端的代码开放
//! （对应宿主页面里任何脚本都能 postMessage 的事实），因此这里是核心唯一的
//! 信任边界：页面侧只接受来源标识与其创建的那个面板实例一致的帧，其余帧
//! 静默丢弃，不回包也不报错。

use tokio::sync::mpsc;

use crate::protocol::RelayMessage;

/// 面板实例标识（页面代理嵌入面板时生成）
pub type PanelId = String;

/// 生成新的面板实例标识
pub fn new_panel_id() -> PanelId {
    format!("panel_{}", uuid::Uuid::new_v4())
}

/// 开放的入站发送端：任何持有者都能投递帧，鉴权在接收侧做
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<(PanelId, RelayMessage)>,
}

impl RelaySender {
    /// 以给定来源标识投递一帧
    pub fn post(&self, source: &PanelId, message: RelayMessage) {
        let _ = self.tx.send((source.clone(), message));
    }
}

/// 页面代理侧端点：接收已鉴权的面板帧，向面板推送
pub struct PageEndpoint {
    authorized: PanelId,
    from_panel: mpsc::UnboundedReceiver<(PanelId, RelayMessage)>,
    inbound_tx: mpsc::UnboundedSender<(PanelId, RelayMessage)>,
    to_panel: mpsc::UnboundedSender<RelayMessage>,
}

impl PageEndpoint {
    /// 接收下一条通过鉴权的面板帧；通道关闭时返回 None
    pub async fn recv(&mut self) -> Option<RelayMessage> {
        while let Some((source, message)) = self.from_panel.recv().await {
            if source == self.authorized {
                return Some(message);
            }
            tracing::debug!(%source, "Dropping relay frame from unverified source");
        }
        None
    }

    /// 向面板推送一帧
    pub fn send(&self, message: RelayMessage) {
        let _ = self.to_panel.send(message);
    }

    /// 取一个开放的入站发送端（对应宿主环境的公开消息入口）
    pub fn sender(&self) -> RelaySender {
        RelaySender {
            tx: self.inbound_tx.clone(),
        }
    }
}

/// 面板侧端点：以自己的实例标识发送，接收页面代理的推送
pub struct PanelPort {
    id: PanelId,
    to_page: RelaySender,
    from_page: mpsc::UnboundedReceiver<RelayMessage>,
}

impl PanelPort {
    pub fn id(&self) -> &PanelId {
        &self.id
    }

    /// 发送一帧（自动携带本面板的来源标识）
    pub fn send(&self, message: RelayMessage) {
        self.to_page.post(&self.id, message);
    }

    /// 接收页面代理的下一条推送；通道关闭时返回 None
    pub async fn recv(&mut self) -> Option<RelayMessage> {
        self.from_page.recv().await
    }

    /// 非阻塞接收：没有待处理的推送时返回 None
    pub fn try_recv(&mut self) -> Option<RelayMessage> {
        self.from_page.try_recv().ok()
    }
}

/// 中继通道构造器
pub struct RelayBridge;

impl RelayBridge {
    /// 为给定的面板实例建立通道，返回（页面侧端点，面板侧端点）
    pub fn channel(panel_id: &PanelId) -> (PageEndpoint, PanelPort) {
        let (inbound_tx, from_panel) = mpsc::unbounded_channel();
        let (to_panel, from_page) = mpsc::unbounded_channel();

        let endpoint = PageEndpoint {
            authorized: panel_id.clone(),
            from_panel,
            inbound_tx: inbound_tx.clone(),
            to_panel,
        };
        let port = PanelPort {
            id: panel_id.clone(),
            to_page: RelaySender { tx: inbound_tx },
            from_page,
        };
        (endpoint, port)
    }
}

//! 路由与面板链路集成测试
//!
//! 经公开 API 覆盖核心性质：会话读写往返、设置补丁合并、无 Key 时的失败路径、
//! 成功提问恰好追加两条消息、伪造来源的中继帧无任何可观察效果。

use std::sync::Arc;
use std::time::Duration;

use mentor::ai::mock_client_factory;
use mentor::config::DetectorSection;
use mentor::page::{PageAgent, PanelClient, ProblemDetector, ScriptedDetector};
use mentor::protocol::{
    ChatMessage, CodeSnapshot, Difficulty, ProblemSnapshot, RelayMessage, Request, Response, Role,
    SettingsPatch, SkillLevel,
};
use mentor::relay::{new_panel_id, RelayBridge};
use mentor::router::{HostRouter, RouterHandle};
use mentor::store::{self, KvStore, MemoryStore};

fn sample_problem(id: &str) -> ProblemSnapshot {
    ProblemSnapshot {
        problem_id: id.to_string(),
        title: format!("Problem {}", id),
        difficulty: Difficulty::Easy,
        description: "Given an array of integers...".to_string(),
        url: format!("https://example.com/problems/{}", id),
    }
}

fn fast_detector_config() -> DetectorSection {
    DetectorSection {
        problem_wait_ms: 200,
        code_wait_ms: 200,
        description_max_chars: 1000,
    }
}

fn start_router() -> (Arc<dyn KvStore>, Arc<HostRouter>, RouterHandle) {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let router = Arc::new(HostRouter::new(Arc::clone(&store), mock_client_factory()));
    let handle = Arc::clone(&router).start();
    (store, router, handle)
}

async fn configure_api_key(handle: &RouterHandle) {
    let response = handle
        .request(Request::SaveSettings(SettingsPatch {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }))
        .await;
    assert_eq!(response, Response::ok());
}

#[tokio::test]
async fn test_conversation_roundtrip_law() {
    let (_store, router, handle) = start_router();

    // 零次写入后读取：空序列而不是错误
    let response = handle
        .request(Request::GetConversation {
            problem_id: "fresh".to_string(),
        })
        .await;
    assert_eq!(response, Response::Conversation { messages: vec![] });

    let messages = vec![ChatMessage::user("hint?"), ChatMessage::assistant("think")];
    handle
        .request(Request::SaveConversation {
            problem_id: "two-sum".to_string(),
            messages: messages.clone(),
        })
        .await;

    let response = handle
        .request(Request::GetConversation {
            problem_id: "two-sum".to_string(),
        })
        .await;
    assert_eq!(response, Response::Conversation { messages });

    // 清空后再读：空序列
    handle
        .request(Request::ClearConversation {
            problem_id: "two-sum".to_string(),
        })
        .await;
    let response = handle
        .request(Request::GetConversation {
            problem_id: "two-sum".to_string(),
        })
        .await;
    assert_eq!(response, Response::Conversation { messages: vec![] });

    router.stop();
}

#[tokio::test]
async fn test_settings_patch_preserves_other_fields() {
    let (_store, router, handle) = start_router();

    handle
        .request(Request::SaveSettings(SettingsPatch {
            skill_level: Some(SkillLevel::Advanced),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }))
        .await;
    handle
        .request(Request::SaveSettings(SettingsPatch {
            auto_sync: Some(false),
            ..Default::default()
        }))
        .await;

    let Response::Settings { settings } = handle.request(Request::GetSettings).await else {
        panic!("expected settings response");
    };
    assert!(!settings.auto_sync);
    assert_eq!(settings.skill_level, SkillLevel::Advanced);
    assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
    assert!(settings.show_toggle_button);

    router.stop();
}

#[tokio::test]
async fn test_hint_without_key_never_mutates_session() {
    let (store, router, handle) = start_router();

    let response = handle
        .request(Request::GetAiResponse {
            user_message: "help me".to_string(),
            problem_id: "two-sum".to_string(),
            problem_context: None,
            code: None,
            language: None,
        })
        .await;
    let Response::Error { error } = response else {
        panic!("expected error response");
    };
    assert!(error.contains("not configured"));

    let stored = store::load_conversation(store.as_ref(), "two-sum")
        .await
        .unwrap();
    assert!(stored.is_empty());

    router.stop();
}

#[tokio::test]
async fn test_successful_hint_appends_exactly_two_messages() {
    let (store, router, handle) = start_router();
    configure_api_key(&handle).await;

    let response = handle
        .request(Request::GetAiResponse {
            user_message: "where do I start?".to_string(),
            problem_id: "two-sum".to_string(),
            problem_context: Some("Two Sum [Easy]".to_string()),
            code: None,
            language: Some("python".to_string()),
        })
        .await;
    assert!(matches!(response, Response::AiResponse { .. }));

    let stored = store::load_conversation(store.as_ref(), "two-sum")
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].role, Role::User);
    assert_eq!(stored[0].content, "where do I start?");
    assert_eq!(stored[1].role, Role::Assistant);
    assert!(stored[0].timestamp <= stored[1].timestamp);

    router.stop();
}

/// 等待面板拿到指定题目的 PROBLEM_DATA
async fn wait_for_problem(panel: &mut PanelClient, expect: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            panel.pump().await;
            if panel.problem().map(|p| p.problem_id.as_str()) == Some(expect) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("PROBLEM_DATA for {} not delivered", expect));
}

#[tokio::test]
async fn test_full_panel_flow_and_forged_frames() {
    let (store, router, handle) = start_router();
    configure_api_key(&handle).await;

    let detector = Arc::new(ScriptedDetector::new(&fast_detector_config()));
    detector.set_problem(sample_problem("two-sum"));
    detector
        .set_code(CodeSnapshot {
            code: "def two_sum(nums, target):\n    pass".to_string(),
            language: "python".to_string(),
        })
        .await;

    let panel_id = new_panel_id();
    let (endpoint, port) = RelayBridge::channel(&panel_id);
    // 宿主页面的公开消息入口：任何脚本都能拿到
    let open_sender = endpoint.sender();

    let mut agent = PageAgent::new(
        Arc::clone(&detector) as Arc<dyn ProblemDetector>,
        endpoint,
        true,
    );
    agent.initialize().await;
    tokio::spawn(agent.run());

    let mut panel = PanelClient::new(port, handle.clone());
    panel.announce_ready();
    wait_for_problem(&mut panel, "two-sum").await;

    // 提问：mock 客户端回显拼接的用户轮，包含代码与原始消息
    let reply = panel.ask("where do I start?").await;
    assert!(reply.contains("where do I start?"));
    assert!(reply.contains("two_sum"));
    assert_eq!(panel.transcript().len(), 2);

    let stored = store::load_conversation(store.as_ref(), "two-sum")
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].role, Role::User);
    assert_eq!(stored[1].role, Role::Assistant);

    // 伪造来源的 CLOSE_SIDEBAR：无任何可观察效果，面板仍可见，
    // 题目变更依旧会推送过来
    open_sender.post(&new_panel_id(), RelayMessage::CloseSidebar);
    tokio::time::sleep(Duration::from_millis(50)).await;

    detector.set_problem(sample_problem("three-sum"));
    wait_for_problem(&mut panel, "three-sum").await;

    // 真正来自面板的 CLOSE_SIDEBAR 生效：后续变更不再推送
    panel.close();
    tokio::time::sleep(Duration::from_millis(50)).await;
    detector.set_problem(sample_problem("lru-cache"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    panel.pump().await;
    assert_eq!(
        panel.problem().map(|p| p.problem_id.as_str()),
        Some("three-sum")
    );

    router.stop();
}

#[tokio::test]
async fn test_switching_problems_restores_stored_history() {
    let (_store, router, handle) = start_router();
    configure_api_key(&handle).await;

    let detector = Arc::new(ScriptedDetector::new(&fast_detector_config()));
    detector.set_problem(sample_problem("two-sum"));

    let panel_id = new_panel_id();
    let (endpoint, port) = RelayBridge::channel(&panel_id);
    let mut agent = PageAgent::new(
        Arc::clone(&detector) as Arc<dyn ProblemDetector>,
        endpoint,
        true,
    );
    agent.initialize().await;
    tokio::spawn(agent.run());

    let mut panel = PanelClient::new(port, handle.clone());
    panel.announce_ready();
    wait_for_problem(&mut panel, "two-sum").await;

    panel.ask("first question").await;
    assert_eq!(panel.transcript().len(), 2);

    // 切到另一题：转录为空
    detector.set_problem(sample_problem("three-sum"));
    wait_for_problem(&mut panel, "three-sum").await;
    assert!(panel.transcript().is_empty());

    // 切回：存储的历史被恢复
    detector.set_problem(sample_problem("two-sum"));
    wait_for_problem(&mut panel, "two-sum").await;
    assert_eq!(panel.transcript().len(), 2);
    assert_eq!(panel.transcript()[0].content, "first question");

    router.stop();
}

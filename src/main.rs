//! Mentor - Rust 刷题辅导核心
//!
//! 入口：初始化日志、装配存储 / 路由 / 页面代理 / 面板，并运行 stdin 演示循环。
//! 设置了 MENTOR_API_KEY 时走真实补全端点，否则用 Mock 客户端离线演示。

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mentor::ai::{mock_client_factory, openai_client_factory};
use mentor::config::load_config;
use mentor::page::{PageAgent, PanelClient, ProblemDetector, ScriptedDetector};
use mentor::protocol::{Difficulty, ProblemSnapshot, SettingsPatch};
use mentor::relay::{new_panel_id, RelayBridge};
use mentor::router::HostRouter;
use mentor::store::{self, KvStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let config = load_config(None).context("Failed to load config")?;
    let store: Arc<dyn KvStore> = store::create_store(config.storage.data_dir.as_deref());

    // 首次安装时物化默认设置（空补丁合并即写入默认记录）
    store::merge_settings(store.as_ref(), &SettingsPatch::default())
        .await
        .context("Failed to initialize settings")?;

    let factory = match std::env::var("MENTOR_API_KEY") {
        Ok(key) if !key.is_empty() => {
            store::merge_settings(
                store.as_ref(),
                &SettingsPatch {
                    api_key: Some(key),
                    ..Default::default()
                },
            )
            .await
            .context("Failed to store API key")?;
            openai_client_factory(config.llm.clone())
        }
        _ => {
            let settings = store::load_settings(store.as_ref()).await?;
            if settings.api_key.is_some() {
                openai_client_factory(config.llm.clone())
            } else {
                tracing::warn!("MENTOR_API_KEY not set, using mock completion client");
                store::merge_settings(
                    store.as_ref(),
                    &SettingsPatch {
                        api_key: Some("mock".to_string()),
                        ..Default::default()
                    },
                )
                .await?;
                mock_client_factory()
            }
        }
    };

    let router = Arc::new(HostRouter::new(Arc::clone(&store), factory));
    let handle = Arc::clone(&router).start();

    // 演示宿主页面：可编程探测器 + 页面代理 + 面板
    let detector = Arc::new(ScriptedDetector::new(&config.detector));
    detector.set_problem(demo_problem());

    let settings = store::load_settings(store.as_ref()).await?;
    let panel_id = new_panel_id();
    let (endpoint, port) = RelayBridge::channel(&panel_id);

    let mut agent = PageAgent::new(
        Arc::clone(&detector) as Arc<dyn ProblemDetector>,
        endpoint,
        settings.show_toggle_button,
    );
    agent.initialize().await;
    tokio::spawn(agent.run());

    let mut panel = PanelClient::new(port, handle.clone());
    panel.announce_ready();

    println!("mentor - ask about the current problem. 'clear' resets the session, 'quit' exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("stdin read failed")? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line {
                    "quit" | "exit" => break,
                    "clear" => {
                        panel.clear().await;
                        println!("(conversation cleared)");
                    }
                    _ => {
                        let reply = panel.ask(line).await;
                        println!("\n{}\n", reply);
                    }
                }
            }
        }
    }

    router.stop();
    Ok(())
}

fn demo_problem() -> ProblemSnapshot {
    ProblemSnapshot {
        problem_id: "two-sum".to_string(),
        title: "Two Sum".to_string(),
        difficulty: Difficulty::Easy,
        description: "Given an array of integers nums and an integer target, return indices of \
                      the two numbers such that they add up to target. You may assume that each \
                      input has exactly one solution, and you may not use the same element twice."
            .to_string(),
        url: "https://example.com/problems/two-sum".to_string(),
    }
}

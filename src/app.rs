//! 应用程序初始化和启动
//!
//! 负责核心库的完整启动流程，包括：
//! - 日志系统初始化
//! - 配置加载
//! - 记录存储恢复
//! - 事件总线创建
//! - 会话Actor启动

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::actors::ActivitySessionActor;
use crate::event_bus::EventBus;
use crate::logger;
use crate::settings::SettingsManager;
use crate::storage::EntryStore;
use crate::AppState;

/// 应用程序入口点
///
/// 初始化日志后在默认数据目录下完成全部装配
pub async fn run() -> Result<AppState> {
    logger::init().expect("Failed to initialize logger");
    init(&default_data_dir()).await
}

/// 在指定数据目录下装配应用状态
///
/// 启动顺序：事件总线 → 配置 → 记录存储（含持久化恢复）→ 会话Actor
pub async fn init(data_dir: &Path) -> Result<AppState> {
    info!("初始化情绪记录器...");

    let event_bus = Arc::new(EventBus::new(100));
    let settings = Arc::new(
        SettingsManager::new(data_dir.join("config.json"), event_bus.clone()).await?,
    );
    let entry_store = Arc::new(
        EntryStore::new(data_dir.join("entries.json"), event_bus.clone()).await?,
    );

    let activity_settings = settings.get().await.activity_settings;
    let (actor, session) = ActivitySessionActor::new(
        entry_store.clone(),
        event_bus.clone(),
        activity_settings,
    );

    // 在后台运行会话Actor；句柄drop后命令通道关闭，Actor随之退出
    tokio::spawn(async move {
        actor.run().await;
    });

    info!("情绪记录器初始化完成，已有 {} 条记录", entry_store.count().await);

    Ok(AppState {
        entry_store,
        settings,
        session,
        event_bus,
    })
}

/// 平台默认数据目录
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join("Library/Application Support/mood-tracker")
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join("mood-tracker")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share/mood-tracker")
    }
}

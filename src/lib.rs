// 情绪记录器 - 核心库

// 声明模块
pub mod actors;
pub mod app;
pub mod catalog;
pub mod event_bus;
pub mod growth;
pub mod logger;
pub mod models;
pub mod settings;
pub mod storage;

use std::sync::Arc;

use actors::ActivitySessionHandle;
use event_bus::EventBus;
use settings::SettingsManager;
use storage::EntryStore;

/// 应用状态
///
/// 由展示层持有；记录存储与会话状态机的所有变更都经由这里的句柄串行执行
#[derive(Clone)]
pub struct AppState {
    /// 情绪记录存储
    pub entry_store: Arc<EntryStore>,
    /// 配置管理器
    pub settings: Arc<SettingsManager>,
    /// 记录会话句柄
    pub session: ActivitySessionHandle,
    /// 事件总线
    pub event_bus: Arc<EventBus>,
}

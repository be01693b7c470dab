// 记录存储 - 情绪记录的内存列表与JSON文件持久化
//
// 记录只增不改不删；每次追加后整表重写到文件
// 记录量由手动记录决定，整表重写的开销可以接受

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::event_bus::{AppEvent, EventBus};
use crate::models::Entry;

pub struct EntryStore {
    path: PathBuf,
    entries: RwLock<Vec<Entry>>,
    event_bus: Arc<EventBus>,
}

impl EntryStore {
    /// 创建存储并从文件恢复历史记录
    ///
    /// 文件缺失或内容损坏时静默回退为空列表，不视为错误
    pub async fn new(path: PathBuf, event_bus: Arc<EventBus>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => match serde_json::from_slice::<Vec<Entry>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("记录文件解析失败，回退为空列表: {}", e);
                    Vec::new()
                }
            },
            _ => Vec::new(),
        };

        info!("已恢复 {} 条情绪记录", initial.len());
        event_bus.publish(AppEvent::EntriesLoaded {
            count: initial.len(),
        });

        Ok(Self {
            path,
            entries: RwLock::new(initial),
            event_bus,
        })
    }

    /// 追加一条记录并整表持久化
    ///
    /// 写盘失败只记日志，不回滚内存中的记录
    pub async fn append(&self, entry: Entry) {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.push(entry.clone());
            entries.clone()
        };

        if let Err(e) = self.save(&snapshot).await {
            error!("记录持久化失败（内存中保留）: {}", e);
        }

        self.event_bus.publish(AppEvent::EntryAppended { entry });
    }

    /// 按插入顺序返回全部记录（最旧在前）
    pub async fn all(&self) -> Vec<Entry> {
        self.entries.read().await.clone()
    }

    /// 按时间倒序返回全部记录（最新在前，历史页展示用）
    pub async fn recent_first(&self) -> Vec<Entry> {
        let mut entries = self.all().await;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }

    /// 记录总数
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn save(&self, entries: &[Entry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::event_bus::{AppEvent, EventBus};
use crate::models::{MoodConfig, PersistedMoodConfig};

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedMoodConfig>,
    event_bus: Arc<EventBus>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf, event_bus: Arc<EventBus>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedMoodConfig>(&bytes).unwrap_or_default()
            }
            _ => {
                let default = PersistedMoodConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
            event_bus,
        })
    }

    pub async fn get(&self) -> PersistedMoodConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: MoodConfig) -> Result<PersistedMoodConfig> {
        let mut config = self.data.write().await;

        if let Some(activity) = update.activity_settings {
            config.activity_settings = activity;
        }

        self.save(&config).await?;
        self.event_bus.publish(AppEvent::ConfigUpdated {
            config_type: "activity_settings".to_string(),
        });
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedMoodConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

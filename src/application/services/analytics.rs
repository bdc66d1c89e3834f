//! Execution-log analytics

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::application::errors::StorageError;

/// One reported script execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub script: String,
    pub executor: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsStats {
    pub total_executions: usize,
    pub last_24h: usize,
    pub per_script: BTreeMap<String, usize>,
}

pub struct AnalyticsService {
    path: PathBuf,
    records: Arc<RwLock<Vec<ExecutionRecord>>>,
}

impl AnalyticsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Load persisted records. A missing or corrupt file starts empty.
    pub async fn init(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str::<Vec<ExecutionRecord>>(&content) {
                Ok(loaded) => {
                    let mut records = self.records.write().await;
                    *records = loaded;
                }
                Err(e) => {
                    tracing::error!("Error loading analytics log: {}", e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub async fn log(&self, script: &str, executor: &str) -> Result<ExecutionRecord, StorageError> {
        let record = ExecutionRecord {
            script: script.to_string(),
            executor: executor.to_string(),
            timestamp: Utc::now(),
        };

        let snapshot = {
            let mut records = self.records.write().await;
            records.push(record.clone());
            records.clone()
        };
        self.persist(&snapshot).await?;
        Ok(record)
    }

    pub async fn stats(&self) -> AnalyticsStats {
        let records = self.records.read().await;
        let cutoff = Utc::now() - chrono::Duration::hours(24);

        let mut per_script: BTreeMap<String, usize> = BTreeMap::new();
        let mut last_24h = 0;
        for record in records.iter() {
            *per_script.entry(record.script.clone()).or_default() += 1;
            if record.timestamp > cutoff {
                last_24h += 1;
            }
        }

        AnalyticsStats {
            total_executions: records.len(),
            last_24h,
            per_script,
        }
    }

    async fn persist(&self, records: &[ExecutionRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_service() -> AnalyticsService {
        let dir = std::env::temp_dir().join(format!("vadrifts-test-{}", uuid::Uuid::new_v4()));
        AnalyticsService::new(dir.join("analytics.json"))
    }

    #[tokio::test]
    async fn stats_count_per_script() {
        let svc = temp_service();
        svc.init().await.unwrap();
        svc.log("Blade Ball", "Synapse").await.unwrap();
        svc.log("Blade Ball", "Krnl").await.unwrap();
        svc.log("Arsenal", "Synapse").await.unwrap();

        let stats = svc.stats().await;
        assert_eq!(stats.total_executions, 3);
        assert_eq!(stats.last_24h, 3);
        assert_eq!(stats.per_script.get("Blade Ball"), Some(&2));
        assert_eq!(stats.per_script.get("Arsenal"), Some(&1));
    }

    #[tokio::test]
    async fn records_survive_reload() {
        let svc = temp_service();
        svc.init().await.unwrap();
        svc.log("Blade Ball", "Synapse").await.unwrap();

        let reloaded = AnalyticsService::new(svc.path.clone());
        reloaded.init().await.unwrap();
        assert_eq!(reloaded.stats().await.total_executions, 1);
    }
}

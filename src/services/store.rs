//! Agent State Persistence
//!
//! Write-through collaborator interface. The core saves opportunistically
//! after meaningful state changes but does not depend on the store for
//! in-memory correctness during a single run.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::agent::AgentRecord;
use crate::utils::error::ChorusResult;

/// Persistence collaborator for agent records.
#[async_trait]
pub trait AgentStateStore: Send + Sync {
    async fn save_agent_state(&self, record: &AgentRecord) -> ChorusResult<()>;

    async fn get_agent_state(&self, id: &str) -> ChorusResult<Option<AgentRecord>>;
}

/// In-memory store, the default for a single-process run.
#[derive(Default)]
pub struct MemoryStateStore {
    records: RwLock<HashMap<String, AgentRecord>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentStateStore for MemoryStateStore {
    async fn save_agent_state(&self, record: &AgentRecord) -> ChorusResult<()> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_agent_state(&self, id: &str) -> ChorusResult<Option<AgentRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }
}

/// One pretty-printed JSON file per agent under a base directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl AgentStateStore for JsonFileStore {
    async fn save_agent_state(&self, record: &AgentRecord) -> ChorusResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.path_for(&record.id), json).await?;
        Ok(())
    }

    async fn get_agent_state(&self, id: &str) -> ChorusResult<Option<AgentRecord>> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

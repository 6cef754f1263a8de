use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use reload_core::{RefreshArgs, TabId, TabSnapshot};
use thiserror::Error;

use crate::{Document, RefreshOrchestrator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("tab {0} is not available")]
    TabClosed(TabId),
    #[error("page execution failed: {0}")]
    Failed(String),
}

/// Runs the orchestrator against a tab's document and returns the refreshed count.
#[async_trait::async_trait]
pub trait PageExecutor: Send + Sync {
    async fn execute(&self, tab_id: TabId, args: RefreshArgs) -> Result<usize, ExecutionError>;
}

/// Visual status indicator for a tab.
pub trait BadgeReporter: Send + Sync {
    fn set_badge(&self, tab_id: TabId, text: &str);
}

/// Source of fresh tab snapshots. `None` means the tab no longer exists.
pub trait TabQuery: Send + Sync {
    fn snapshot(&self, tab_id: TabId) -> Option<TabSnapshot>;
}

/// In-process executor over documents attached per tab.
pub struct DocumentExecutor {
    orchestrator: RefreshOrchestrator,
    documents: Mutex<HashMap<TabId, Arc<dyn Document>>>,
}

impl DocumentExecutor {
    pub fn new(orchestrator: RefreshOrchestrator) -> Self {
        Self {
            orchestrator,
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn attach(&self, tab_id: TabId, document: Arc<dyn Document>) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tab_id, document);
    }

    pub fn detach(&self, tab_id: TabId) -> Option<Arc<dyn Document>> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tab_id)
    }

    fn document(&self, tab_id: TabId) -> Option<Arc<dyn Document>> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tab_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl PageExecutor for DocumentExecutor {
    async fn execute(&self, tab_id: TabId, args: RefreshArgs) -> Result<usize, ExecutionError> {
        let document = self
            .document(tab_id)
            .ok_or(ExecutionError::TabClosed(tab_id))?;
        Ok(self.orchestrator.refresh(document.as_ref(), &args).await)
    }
}

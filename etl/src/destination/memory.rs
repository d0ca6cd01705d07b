use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::types::ChapterRecord;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<ChapterRecord>,
    load_calls: usize,
}

/// In-memory destination for dry runs and tests.
///
/// Clones share the same storage, so a test can hand one clone to the pipeline and inspect
/// the other afterward. Everything is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a new empty memory destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record loaded so far, in load order.
    pub async fn records(&self) -> Vec<ChapterRecord> {
        let inner = self.inner.lock().await;
        inner.records.clone()
    }

    /// Returns how many times [`Destination::load`] was called, empty batches included.
    pub async fn load_calls(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.load_calls
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn load(&self, records: Vec<ChapterRecord>) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;
        inner.load_calls += 1;

        if records.is_empty() {
            warn!("no records provided, skipping load");
            return Ok(());
        }

        info!("loading a batch of {} chapter records", records.len());
        inner.records.extend(records);

        Ok(())
    }
}

//! One sequential extract, transform and load cycle.

use tracing::{error, info, warn};

use crate::conversions::chapter::normalize_chapters;
use crate::destination::Destination;
use crate::error::EtlResult;
use crate::source::Source;

/// Drives a single run from a [`Source`] into a [`Destination`].
///
/// Extraction completes before normalization starts, and normalization completes before
/// anything is loaded. Nothing is retried.
#[derive(Debug)]
pub struct Pipeline<S, D> {
    source: S,
    destination: D,
}

impl<S, D> Pipeline<S, D>
where
    S: Source,
    D: Destination,
{
    pub fn new(source: S, destination: D) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Runs the cycle and returns the number of loaded records.
    ///
    /// Zero extracted chapters is not an error: a warning is logged and the destination is
    /// not called. Every failure is logged at critical severity and returned unchanged.
    pub async fn run(&self) -> EtlResult<usize> {
        info!(
            source = S::name(),
            destination = D::name(),
            "etl process started"
        );

        match self.run_cycle().await {
            Ok(count) => {
                if count > 0 {
                    info!(count, "etl process completed successfully");
                }
                Ok(count)
            }
            Err(err) => {
                error!(severity = "CRITICAL", error = %err, "etl process failed");
                Err(err)
            }
        }
    }

    async fn run_cycle(&self) -> EtlResult<usize> {
        let chapters = self.source.fetch_all().await?;
        if chapters.is_empty() {
            warn!("no chapters extracted, skipping load");
            return Ok(0);
        }

        let records = normalize_chapters(chapters)?;
        let count = records.len();

        self.destination.load(records).await?;

        Ok(count)
    }
}

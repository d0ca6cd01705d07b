use std::future::Future;

use crate::error::EtlResult;
use crate::types::ExtractedChapter;

/// Trait for systems the pipeline extracts chapters from.
///
/// A [`Source`] materializes the complete dataset in one call. Either every chapter is
/// returned or the call fails; partial results are never handed back.
pub trait Source {
    /// Returns the name of the source.
    fn name() -> &'static str;

    /// Fetches every chapter available at the source, in source order.
    fn fetch_all(&self) -> impl Future<Output = EtlResult<Vec<ExtractedChapter>>> + Send;
}

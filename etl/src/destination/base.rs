use std::future::Future;

use crate::error::EtlResult;
use crate::types::ChapterRecord;

/// Trait for systems the normalized chapter records are loaded into.
///
/// A load receives the whole batch at once. Implementations either persist all of it or
/// fail; an empty batch is a no-op.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Loads a batch of chapter records.
    fn load(&self, records: Vec<ChapterRecord>) -> impl Future<Output = EtlResult<()>> + Send;
}

//! Record types moved through the pipeline.
//!
//! [`ExtractedChapter`] is what the source yields, one per feature, with every field kept as
//! text. [`ChapterRecord`] is the normalized row written to the destination table.

mod chapter;

pub use chapter::*;

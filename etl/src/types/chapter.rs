use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Column names of the destination table, in table order.
pub const CHAPTER_COLUMNS: [&str; 7] = [
    "chapter_id",
    "chapter_name",
    "city",
    "state",
    "latitude",
    "longitude",
    "loaded_at",
];

/// A chapter as read from the feature service.
///
/// Every field is always present. A value that was null or missing at the source is an
/// empty string, and coordinates are kept as their textual form until normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedChapter {
    pub chapter_id: String,
    pub chapter_name: String,
    pub city: String,
    pub state: String,
    pub latitude: String,
    pub longitude: String,
}

/// A normalized chapter row, serialized with keys equal to the destination column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterRecord {
    pub chapter_id: String,
    pub chapter_name: String,
    pub city: String,
    pub state: String,
    /// Absent coordinates serialize as `null`, never as zero.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(serialize_with = "serialize_loaded_at")]
    pub loaded_at: DateTime<Utc>,
}

/// Formats `loaded_at` as ISO-8601 with microseconds and an explicit `+00:00` offset.
pub fn format_loaded_at(loaded_at: &DateTime<Utc>) -> String {
    loaded_at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

fn serialize_loaded_at<S>(loaded_at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_loaded_at(loaded_at))
}

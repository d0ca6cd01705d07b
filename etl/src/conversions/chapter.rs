use chrono::{DateTime, Utc};

use crate::bail;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::types::{ChapterRecord, ExtractedChapter};

/// Normalizes a batch of extracted chapters, stamping every record with the current instant.
///
/// See [`normalize_chapters_at`].
pub fn normalize_chapters(chapters: Vec<ExtractedChapter>) -> EtlResult<Vec<ChapterRecord>> {
    normalize_chapters_at(chapters, Utc::now())
}

/// Normalizes a batch of extracted chapters into records loaded at `loaded_at`.
///
/// Text fields are trimmed, coordinates are parsed into floats (empty means absent) and
/// every record gets the same `loaded_at`. The first coordinate that is not a number fails
/// the whole batch with [`ErrorKind::ConversionError`].
pub fn normalize_chapters_at(
    chapters: Vec<ExtractedChapter>,
    loaded_at: DateTime<Utc>,
) -> EtlResult<Vec<ChapterRecord>> {
    chapters
        .into_iter()
        .map(|chapter| normalize_chapter(chapter, loaded_at))
        .collect()
}

fn normalize_chapter(
    chapter: ExtractedChapter,
    loaded_at: DateTime<Utc>,
) -> EtlResult<ChapterRecord> {
    let latitude = parse_coordinate("latitude", &chapter.latitude, &chapter.chapter_id)?;
    let longitude = parse_coordinate("longitude", &chapter.longitude, &chapter.chapter_id)?;

    Ok(ChapterRecord {
        chapter_id: trim_text(chapter.chapter_id),
        chapter_name: trim_text(chapter.chapter_name),
        city: trim_text(chapter.city),
        state: trim_text(chapter.state),
        latitude,
        longitude,
        loaded_at,
    })
}

/// Trims surrounding whitespace, reusing the allocation when there is nothing to trim.
pub fn trim_text(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.len() == value.len() {
        return value;
    }

    trimmed.to_string()
}

/// Parses a textual coordinate. An empty value is absent.
///
/// Whitespace around the number is accepted. Non-finite values are rejected since they
/// cannot be stored as a coordinate.
pub fn parse_coordinate(field: &str, value: &str, chapter_id: &str) -> EtlResult<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }

    let parsed = value.trim().parse::<f64>().map_err(|err| {
        EtlError::from(err).with_detail(format!("{field} = {value:?} for chapter {chapter_id:?}"))
    })?;

    if !parsed.is_finite() {
        bail!(
            ErrorKind::ConversionError,
            "Coordinate is not a finite number",
            format!("{field} = {value:?} for chapter {chapter_id:?}")
        );
    }

    Ok(Some(parsed))
}

//! Parser for the per-site occupancy summary.
//!
//! The summary endpoint answers with plain text shaped like
//!
//! ```text
//! header|id:value occupancy|id:value occupancy|footer
//! ```
//!
//! Header and footer carry no sensor data. Every segment in between maps a
//! sensor id to a space-delimited value whose second token is the
//! occupancy reading.

use serde::Serialize;

const SEGMENT_DELIMITER: char = '|';
const ID_DELIMITER: char = ':';

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Grammar violations in a summary body.
pub enum SummaryError {
    /// Body has no header/footer delimiters at all.
    #[error("summary has no segment delimiters")]
    MissingDelimiters,
    /// A data segment could not be split into id and occupancy.
    #[error("segment {index} is malformed: {segment:?}")]
    MalformedSegment {
        /// Zero-based position among the data segments.
        index: usize,
        /// Offending segment text.
        segment: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One sensor reading taken from the summary.
pub struct OccupancyEntry {
    /// Sensor identifier.
    pub sensor_id: String,
    /// Occupancy reading.
    pub occupancy: String,
}

/// Parse a summary body into its data entries.
///
/// Parsing is all-or-nothing: one malformed segment rejects the whole body.
///
/// # Errors
///
/// Returns [`SummaryError`] when the body does not follow the grammar.
pub fn parse_summary(body: &str) -> Result<Vec<OccupancyEntry>, SummaryError> {
    let mut segments = body.split(SEGMENT_DELIMITER).collect::<Vec<_>>();
    if segments.len() < 2 {
        return Err(SummaryError::MissingDelimiters);
    }

    // header and footer
    segments.pop();
    segments.remove(0);

    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| {
            parse_segment(segment).ok_or_else(|| SummaryError::MalformedSegment {
                index,
                segment: segment.to_owned(),
            })
        })
        .collect()
}

fn parse_segment(segment: &str) -> Option<OccupancyEntry> {
    let mut fields = segment.split(ID_DELIMITER);
    let id = fields.next()?.trim();
    // Only the field after the first delimiter carries the reading.
    let value = fields.next()?;
    if id.is_empty() {
        return None;
    }
    let occupancy = value.split(' ').nth(1).filter(|token| !token.is_empty())?;

    Some(OccupancyEntry {
        sensor_id: id.to_owned(),
        occupancy: occupancy.to_owned(),
    })
}

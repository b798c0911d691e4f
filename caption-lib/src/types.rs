use serde::{Deserialize, Serialize};

use crate::error::{CaptionError, Result};

/// A single caption: display text and its time range in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    /// Start offset from the beginning of the media, in seconds
    pub start: f64,
    /// End offset in seconds, expected to be greater than `start`
    pub end: f64,
    /// Display text; multi-line cues are joined with a single space
    pub text: String,
}

impl CaptionRecord {
    /// Create a new caption record
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Get the duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check the record invariants. `position` is only used for the error.
    pub fn validate(&self, position: usize) -> Result<()> {
        let fail = |reason: String| Err(CaptionError::InvalidRecord { position, reason });

        if !self.start.is_finite() || !self.end.is_finite() {
            return fail("start and end must be finite".to_string());
        }
        if self.start < 0.0 {
            return fail(format!("start {} is negative", self.start));
        }
        if self.end <= self.start {
            return fail(format!(
                "end {} is not after start {}",
                self.end, self.start
            ));
        }
        if self.text.trim().is_empty() {
            return fail("text is empty".to_string());
        }
        Ok(())
    }

    fn overlaps(&self, other: &CaptionRecord) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Ordered caption records, in order of appearance in the source.
///
/// Produced once per transcription or export and never mutated afterwards.
/// Serializes as a bare JSON array of `{start, end, text}` objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionSequence(Vec<CaptionRecord>);

impl CaptionSequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptionRecord> {
        self.0.iter()
    }

    pub fn records(&self) -> &[CaptionRecord] {
        &self.0
    }

    pub fn into_records(self) -> Vec<CaptionRecord> {
        self.0
    }

    /// Validate every record, reporting the first failure (1-based position)
    pub fn validate(&self) -> Result<()> {
        self.0
            .iter()
            .enumerate()
            .try_for_each(|(i, record)| record.validate(i + 1))
    }

    /// True when start times never decrease
    pub fn is_chronological(&self) -> bool {
        self.0.windows(2).all(|w| w[0].start <= w[1].start)
    }

    /// 1-based positions of records whose range overlaps the next record
    pub fn overlaps(&self) -> Vec<usize> {
        self.0
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0].overlaps(&w[1]))
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Decode the JSON exchange format (array of `{start, end, text}`)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Encode into the JSON exchange format
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub(crate) fn push(&mut self, record: CaptionRecord) {
        self.0.push(record);
    }
}

impl From<Vec<CaptionRecord>> for CaptionSequence {
    fn from(records: Vec<CaptionRecord>) -> Self {
        Self(records)
    }
}

impl FromIterator<CaptionRecord> for CaptionSequence {
    fn from_iter<I: IntoIterator<Item = CaptionRecord>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for CaptionSequence {
    type Item = CaptionRecord;
    type IntoIter = std::vec::IntoIter<CaptionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a CaptionSequence {
    type Item = &'a CaptionRecord;
    type IntoIter = std::slice::Iter<'a, CaptionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A single source-level edit: replace byte range [start..end) with replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// Byte offset, inclusive.
    pub start: usize,
    /// Byte offset, exclusive.
    pub end: usize,
    /// Replacement text (empty string = deletion).
    pub replacement: String,
    /// Cop that produced this correction.
    pub cop_name: &'static str,
}

/// A set of non-overlapping corrections, sorted by start offset.
///
/// Built from an unsorted vec of corrections. When two corrections overlap,
/// the one starting earlier wins and the later one is dropped; the next
/// lint pass picks up whatever the dropped edit was for.
pub struct CorrectionSet {
    corrections: Vec<Correction>,
}

impl CorrectionSet {
    pub fn from_vec(mut raw: Vec<Correction>) -> Self {
        raw.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let mut accepted: Vec<Correction> = Vec::with_capacity(raw.len());
        for c in raw {
            if let Some(last) = accepted.last() {
                if c.start < last.end {
                    continue;
                }
            }
            accepted.push(c);
        }

        Self {
            corrections: accepted,
        }
    }

    /// Apply corrections to source bytes, returning new source.
    ///
    /// Single linear pass: copy the unchanged gap before each correction,
    /// then its replacement, then whatever follows the last correction.
    pub fn apply(&self, source: &[u8]) -> Vec<u8> {
        let mut result = Vec::with_capacity(source.len());
        let mut cursor = 0;

        for c in &self.corrections {
            if c.start > cursor {
                result.extend_from_slice(&source[cursor..c.start]);
            }
            result.extend_from_slice(c.replacement.as_bytes());
            cursor = c.end;
        }

        if cursor < source.len() {
            result.extend_from_slice(&source[cursor..]);
        }

        result
    }

    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.corrections.len()
    }
}

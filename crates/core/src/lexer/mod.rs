//! Line level helpers shared by both passes: field splitting and section
//! header recognition.

use std::io::{self, BufRead};

use serde::{Deserialize, Serialize};

/// Delimiter used by `key: value` sections.
pub const KEY_VALUE_DELIMITER: char = ':';
/// Delimiter used by list sections.
pub const LIST_DELIMITER: char = ',';

/// Splits a raw line into trimmed fields.
///
/// Comment lines (`//`) and lines that do not contain the delimiter yield no
/// fields at all.
pub fn tokenize(line: &str, delimiter: char) -> Vec<String> {
    if line.starts_with("//") || !line.contains(delimiter) {
        return Vec::new();
    }

    line.split(delimiter)
        .map(|field| field.trim().to_string())
        .collect()
}

/// Extracts the section name from a header line, or returns an empty string
/// when the line is not a header.
///
/// Every leading `[` and every trailing `]` is stripped, so `[[Foo]]]` yields
/// `Foo`.
pub fn section_name(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with('[') {
        line.trim_start_matches('[').trim_end_matches(']')
    } else {
        ""
    }
}

/// Iterates over the lines of `reader`. Bytes that are not valid UTF-8 are
/// replaced rather than failing the read; `\n` and `\r\n` endings are
/// stripped.
pub fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buffer: Vec::new(),
    }
}

#[derive(Debug)]
pub struct LossyLines<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                let mut line = self.buffer.as_slice();
                line = line.strip_suffix(b"\n").unwrap_or(line);
                line = line.strip_suffix(b"\r").unwrap_or(line);
                Some(Ok(String::from_utf8_lossy(line).into_owned()))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

/// The sections the parser knows about. Anything else is tracked as
/// [`Section::Unknown`] and its lines are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Section {
    General,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    HitObjects,
    #[default]
    Unknown,
}

impl Section {
    pub fn from_name(name: &str) -> Self {
        match name {
            "General" => Self::General,
            "Metadata" => Self::Metadata,
            "Difficulty" => Self::Difficulty,
            "Events" => Self::Events,
            "TimingPoints" => Self::TimingPoints,
            "HitObjects" => Self::HitObjects,
            _ => Self::Unknown,
        }
    }

    /// Delimiter the section's data lines are split with.
    pub fn delimiter(self) -> char {
        match self {
            Self::General | Self::Metadata | Self::Difficulty => KEY_VALUE_DELIMITER,
            _ => LIST_DELIMITER,
        }
    }
}

/// Tracks the current section across a line stream. Each pass owns its own
/// tracker.
#[derive(Debug, Default, Clone)]
pub struct SectionTracker {
    current: Section,
}

impl SectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Section {
        self.current
    }

    /// Feeds one line. Returns `true` when the line was a header and has been
    /// consumed; data lines leave the state alone and return `false`.
    pub fn observe(&mut self, line: &str) -> bool {
        let name = section_name(line);
        if name.is_empty() {
            return false;
        }
        self.current = Section::from_name(name);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_never_yield_fields() {
        assert!(tokenize("// Title: ignored", ':').is_empty());
        assert!(tokenize("//0,0,\"bg.jpg\"", ',').is_empty());
        assert!(tokenize("//", ':').is_empty());
    }

    #[test]
    fn lines_without_delimiter_yield_nothing() {
        assert!(tokenize("no delimiter here", ':').is_empty());
        assert!(tokenize("", ',').is_empty());
    }

    #[test]
    fn fields_are_trimmed() {
        assert_eq!(
            tokenize("  Title :  Some Song  ", ':'),
            vec!["Title".to_string(), "Some Song".to_string()]
        );
        assert_eq!(tokenize("1, 2 ,3", ','), vec!["1", "2", "3"]);
    }

    #[test]
    fn trailing_delimiter_keeps_empty_field() {
        assert_eq!(tokenize("Source:", ':'), vec!["Source", ""]);
    }

    #[test]
    fn lossy_lines_strip_endings_and_replace_bad_bytes() {
        let source: &[u8] = b"[Metadata]\r\nTags:caf\xE9\nlast";
        let lines: Vec<String> = lossy_lines(source).map(|line| line.unwrap()).collect();

        assert_eq!(lines, vec!["[Metadata]", "Tags:caf\u{FFFD}", "last"]);
    }

    #[test]
    fn strips_every_bracket() {
        assert_eq!(section_name("[[[Name]]]"), "Name");
        assert_eq!(section_name("[[Foo]]]"), "Foo");
        assert_eq!(section_name("  [General]  "), "General");
        assert_eq!(section_name("Title:x"), "");
    }

    #[test]
    fn unrecognised_sections_are_unknown() {
        let mut tracker = SectionTracker::new();
        assert_eq!(tracker.current(), Section::Unknown);

        assert!(tracker.observe("[Metadata]"));
        assert_eq!(tracker.current(), Section::Metadata);

        assert!(tracker.observe("[Colours]"));
        assert_eq!(tracker.current(), Section::Unknown);

        assert!(!tracker.observe("Combo1 : 255,0,0"));
        assert_eq!(tracker.current(), Section::Unknown);
    }

    #[test]
    fn delimiters_follow_section_kind() {
        assert_eq!(Section::General.delimiter(), ':');
        assert_eq!(Section::Difficulty.delimiter(), ':');
        assert_eq!(Section::Events.delimiter(), ',');
        assert_eq!(Section::HitObjects.delimiter(), ',');
    }
}

//! Agent output section parser
//!
//! Turns the captured output of one agent probe into a section name and a
//! table of string fields:
//!
//! ```text
//! <<<name:sep(59):nostrip()>>>
//! field;field;field
//! ```
//!
//! The header is delimited by `<<<` and `>>>`; options follow the name as
//! `key(value)` segments separated by `:`. Exactly one section is handled
//! per call.

mod error;

pub use error::{SectionError, SectionResult};

use crate::config::constants::compile_time::section::{
    HEADER_END, HEADER_START, NOSTRIP_OPTION, OPTION_DELIMITER, SEPARATOR_OPTION,
};
use crate::logging::codes;
use crate::{log_debug, log_error};
use serde::Serialize;
use std::collections::BTreeMap;

/// Parsed `<<<...>>>` header line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionHeader {
    pub name: String,
    pub options: BTreeMap<String, String>,
}

impl SectionHeader {
    /// Field separator requested by `sep(<code>)`, if it names a character
    pub fn separator(&self) -> Option<char> {
        self.options
            .get(SEPARATOR_OPTION)
            .and_then(|value| value.trim().parse::<u32>().ok())
            .and_then(char::from_u32)
    }

    /// Whether `nostrip` asks for data lines to be kept untrimmed
    pub fn preserves_whitespace(&self) -> bool {
        self.options.contains_key(NOSTRIP_OPTION)
    }
}

/// One section of agent output split into rows of fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSection {
    pub header: SectionHeader,
    pub rows: Vec<Vec<String>>,
}

impl ParsedSection {
    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Whether the trimmed line is delimited by the header markers
pub fn is_header(line: &str) -> bool {
    let line = line.trim();
    line.starts_with(HEADER_START) && line.ends_with(HEADER_END)
}

/// Parse a header line such as `<<<df:sep(9)>>>`
pub fn parse_header(line: &str) -> SectionResult<SectionHeader> {
    let line = line.trim();
    if !is_header(line) || line.len() < HEADER_START.len() + HEADER_END.len() {
        let error = SectionError::invalid_header(line);
        log_error!(error.error_code(), "Test data does not start with a section header",
            "line" => line);
        return Err(error);
    }

    let body = &line[HEADER_START.len()..line.len() - HEADER_END.len()];
    let mut segments = body.split(OPTION_DELIMITER);
    let name = segments.next().unwrap_or_default().to_string();

    let mut options = BTreeMap::new();
    for segment in segments {
        let (key, value) = parse_option(segment).ok_or_else(|| {
            let error = SectionError::invalid_option(segment);
            log_error!(error.error_code(), "Malformed section option",
                "section" => &name,
                "option" => segment);
            error
        })?;
        options.insert(key.to_string(), value.to_string());
    }

    Ok(SectionHeader { name, options })
}

/// Split `key(value)` into its parts; the key is everything before the first
/// `(` and must not be empty, the value runs to the final `)`
fn parse_option(segment: &str) -> Option<(&str, &str)> {
    let open = segment.find('(')?;
    let key = &segment[..open];
    let rest = &segment[open..];
    if key.is_empty() || rest.len() < 2 || !rest.ends_with(')') {
        return None;
    }
    Some((key, &rest[1..rest.len() - 1]))
}

/// Parse one section of agent output into its name and rows
///
/// The caller strips surrounding blank lines; the first line must be the
/// header. Without `nostrip` every data line is trimmed before splitting.
/// Without a usable `sep` option fields split on runs of whitespace.
pub fn parse_section(raw: &str) -> SectionResult<ParsedSection> {
    let mut lines = raw.lines();
    let header = parse_header(lines.next().unwrap_or_default())?;

    let separator = header.separator();
    let strip = !header.preserves_whitespace();

    let mut rows = Vec::new();
    for line in lines {
        if is_header(line) {
            let error = SectionError::second_header(line.trim());
            log_error!(error.error_code(), "Only one section may be parsed at a time",
                "section" => &header.name,
                "line" => line.trim());
            return Err(error);
        }

        let line = if strip { line.trim() } else { line };
        let fields: Vec<String> = match separator {
            Some(sep) => line.split(sep).map(str::to_string).collect(),
            None => line.split_whitespace().map(str::to_string).collect(),
        };
        rows.push(fields);
    }

    log_debug!("Section parsed",
        "section" => &header.name,
        "rows" => rows.len(),
        "code" => codes::success::SECTION_PARSED);

    Ok(ParsedSection { header, rows })
}

//! Decision extraction from free-form agent output.
//!
//! The agent explains itself in prose and ends with a JSON decision block,
//! sometimes fenced, sometimes not, sometimes revised halfway through. The
//! scanner collects every balanced `{...}` region (brace counting skips
//! braces inside JSON strings) and the last region that parses as a
//! [`Decision`] wins.

use quartermaster_core::error::ParseError;
use quartermaster_core::procurement::Decision;

/// Byte ranges of every balanced brace region in `text`, by start offset.
///
/// Nested regions are reported too. A `{` with no matching `}` yields nothing.
pub fn brace_regions(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut regions = Vec::new();

    for (start, _) in text.match_indices('{') {
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, &b) in bytes[start..].iter().enumerate() {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        regions.push((start, start + offset + 1));
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    regions
}

/// Extract the last decision block in `text`.
///
/// - no brace region at all → [`ParseError::MissingDecision`]
/// - regions, none a valid decision → [`ParseError::MalformedDecision`]
///   carrying the error for the last candidate
pub fn extract_decision(text: &str) -> Result<Decision, ParseError> {
    let regions = brace_regions(text);
    if regions.is_empty() {
        return Err(ParseError::MissingDecision);
    }

    let mut last_error = None;
    for &(start, end) in regions.iter().rev() {
        match serde_json::from_str::<Decision>(&text[start..end]) {
            Ok(decision) => return Ok(decision),
            Err(e) => {
                if last_error.is_none() {
                    last_error = Some(e.to_string());
                }
            }
        }
    }

    Err(ParseError::MalformedDecision(
        last_error.unwrap_or_else(|| "no candidate parsed".into()),
    ))
}

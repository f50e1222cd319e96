//! Input handling shared by the HTTP server and the CLI.

use crate::aggregate::MAX_COMPARE;
use crate::error::{CodemateError, Result};

/// Split a comma-separated list of tool names. Segments are trimmed and
/// blank ones dropped; the result must hold 1..=[`MAX_COMPARE`] names.
pub fn parse_tool_list(raw: &str) -> Result<Vec<String>> {
    if raw.trim().is_empty() {
        return Err(CodemateError::Validation(
            "Query parameter 'tools' is required.".into(),
        ));
    }
    let names: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(CodemateError::Validation("No tool names provided.".into()));
    }
    if names.len() > MAX_COMPARE {
        return Err(CodemateError::Validation(format!(
            "At most {MAX_COMPARE} tools can be compared at once."
        )));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims() {
        assert_eq!(
            parse_tool_list(" Cursor , GitHub Copilot ").unwrap(),
            vec!["Cursor", "GitHub Copilot"]
        );
        assert_eq!(parse_tool_list("Tabnine").unwrap(), vec!["Tabnine"]);
    }

    #[test]
    fn blank_segments_are_dropped() {
        assert_eq!(parse_tool_list("Cursor,,").unwrap(), vec!["Cursor"]);
    }

    #[test]
    fn rejects_empty_and_too_many() {
        for raw in ["", "   ", ",", " , ", "a,b,c"] {
            let err = parse_tool_list(raw).unwrap_err();
            assert!(matches!(err, CodemateError::Validation(_)), "{raw:?}");
            assert_eq!(err.status_code(), 400);
        }
    }
}

/// Parse a boolean flag the way the pipeline deployment scripts write them.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"y"`,
/// `"on"`. Any other non-empty value is `false`; an empty value is treated as
/// "not provided".
pub fn parse_flag(raw: &str) -> Option<bool> {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() {
        return None;
    }
    Some(matches!(value.as_str(), "1" | "true" | "yes" | "y" | "on"))
}

/// Trim a raw value and drop it when nothing is left.
pub fn non_empty(raw: impl AsRef<str>) -> Option<String> {
    let trimmed = raw.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values_are_case_insensitive() {
        for raw in ["1", "true", "TRUE", "Yes", "y", "On", " true "] {
            assert_eq!(parse_flag(raw), Some(true), "{raw:?}");
        }
    }

    #[test]
    fn unknown_values_are_false_and_blank_is_unset() {
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("enabled"), Some(false));
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("   "), None);
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  abc "), Some("abc".to_string()));
        assert_eq!(non_empty("  "), None);
    }
}

//! Naming utilities for schema_ddl
//!
//! Identifier validation, quote trimming and deterministic names for
//! generated indexes and constraints.

use once_cell::sync::Lazy;
use regex::Regex;

static UNQUOTED_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

/// Quote characters recognised when parsing identifiers
const QUOTE_CHARS: [char; 4] = ['`', '"', '[', ']'];

/// Check whether a name is wrapped in identifier quotes
pub fn is_identifier_quoted(name: &str) -> bool {
    matches!(name.chars().next(), Some('`' | '"' | '['))
}

/// Strip identifier quote characters from a name
pub fn trim_quotes(name: &str) -> String {
    name.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

/// Check whether a single unquoted identifier part is acceptable
pub fn is_valid_unquoted_part(part: &str) -> bool {
    UNQUOTED_PART.is_match(part)
}

/// Check whether a quoted identifier part is acceptable
pub fn is_valid_quoted_part(part: &str) -> bool {
    !part.is_empty() && !part.contains('\0')
}

/// Generate a deterministic identifier from a list of name parts.
///
/// Every part contributes the hex form of its CRC32 checksum (no zero
/// padding), the result is prefixed, upper-cased and cut to `max_length`.
pub fn generate_identifier_name<S: AsRef<str>>(
    parts: &[S],
    prefix: &str,
    max_length: usize,
) -> String {
    let hash: String = parts
        .iter()
        .map(|part| format!("{:x}", crc32fast::hash(part.as_ref().as_bytes())))
        .collect();

    let mut name = format!("{}_{}", prefix, hash).to_uppercase();
    name.truncate(max_length);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_deterministic() {
        let first = generate_identifier_name(&["test", "foo_id"], "fk", 63);
        let second = generate_identifier_name(&["test", "foo_id"], "fk", 63);

        assert_eq!(first, "FK_D87F7E0C8E48560F");
        assert_eq!(first, second);
    }

    #[test]
    fn generated_names_respect_max_length() {
        let name = generate_identifier_name(&["a_table", "a", "b", "c", "d"], "idx", 12);
        assert_eq!(name.len(), 12);
        assert!(name.starts_with("IDX_"));
    }

    #[test]
    fn quote_detection() {
        assert!(is_identifier_quoted("`foo`"));
        assert!(is_identifier_quoted("\"foo\""));
        assert!(is_identifier_quoted("[foo]"));
        assert!(!is_identifier_quoted("foo"));
        assert_eq!(trim_quotes("\"Foo\""), "Foo");
    }

    #[test]
    fn unquoted_parts() {
        assert!(is_valid_unquoted_part("user_accounts"));
        assert!(is_valid_unquoted_part("_tmp$1"));
        assert!(!is_valid_unquoted_part("1abc"));
        assert!(!is_valid_unquoted_part("has space"));
        assert!(!is_valid_unquoted_part(""));
    }
}

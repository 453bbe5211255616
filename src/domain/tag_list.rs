//! Parsing of the `<formula> <bottle tag>` work list.

use thiserror::Error;

/// Why a tag-list line could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagLineError {
    #[error("blank line")]
    Blank,
    #[error("expected `<formula> <bottle tag>`, found {found} field(s)")]
    FieldCount { found: usize },
}

/// One unit of work from the tag list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLine {
    pub formula: String,
    pub bottle_tag: String,
}

impl TagLine {
    /// Parse a whitespace-separated `<formula> <bottle tag>` pair.
    ///
    /// # Errors
    /// Blank lines and lines with any other number of fields are rejected.
    pub fn parse(line: &str) -> Result<Self, TagLineError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => Err(TagLineError::Blank),
            [formula, tag] => Ok(Self {
                formula: (*formula).to_string(),
                bottle_tag: (*tag).to_string(),
            }),
            other => Err(TagLineError::FieldCount { found: other.len() }),
        }
    }
}

impl std::fmt::Display for TagLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.formula, self.bottle_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let line = TagLine::parse("  wget\tarm64_sonoma \n").unwrap();
        assert_eq!(line.formula, "wget");
        assert_eq!(line.bottle_tag, "arm64_sonoma");
        assert_eq!(line.to_string(), "wget arm64_sonoma");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(TagLine::parse("   "), Err(TagLineError::Blank));
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        assert_eq!(
            TagLine::parse("wget"),
            Err(TagLineError::FieldCount { found: 1 })
        );
        assert_eq!(
            TagLine::parse("wget arm64_sonoma extra"),
            Err(TagLineError::FieldCount { found: 3 })
        );
    }
}

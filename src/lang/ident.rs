// Used in both Token and the instruction stream

use super::{Column, Error};
use crate::error;

/// Byte that terminates a name written inline into bytecode.
pub const NAME_END: u8 = 0xFF;

/// A register or identifier name that is safe to write inline into
/// bytecode. The only way to build one is `Name::new`, so every name
/// that reaches the code buffer has already been checked for the
/// terminator byte.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Name(String);

impl Name {
    pub fn new(s: &str, col: &Column) -> Result<Name, Error> {
        if s.is_empty() {
            return Err(error!(BadToken, ..col; "EMPTY NAME"));
        }
        if s.bytes().any(|b| b == NAME_END) {
            return Err(error!(BadCharacter, ..col; "NAME CONTAINS TERMINATOR"));
        }
        Ok(Name(s.to_string()))
    }

    /// Rebuilds a name from the bytes found between an opcode and the
    /// terminator in a code buffer.
    pub fn from_code(bytes: &[u8]) -> Option<Name> {
        if bytes.is_empty() || bytes.contains(&NAME_END) {
            return None;
        }
        std::str::from_utf8(bytes)
            .ok()
            .map(|s| Name(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// bc identifiers: a lowercase letter followed by lowercase
    /// letters, digits, or underscores.
    pub fn is_bc_identifier(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty() {
        assert!(Name::new("", &(0..0)).is_err());
    }

    #[test]
    fn test_utf8_never_holds_terminator() {
        let name = Name::new("ä€𝄞", &(0..1)).unwrap();
        assert!(!name.as_bytes().contains(&NAME_END));
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Name::from_code(b"abc"), Some(Name("abc".to_string())));
        assert_eq!(Name::from_code(&[b'a', NAME_END]), None);
        assert_eq!(Name::from_code(b""), None);
    }

    #[test]
    fn test_bc_identifier() {
        assert!(Name::is_bc_identifier("a1_b"));
        assert!(!Name::is_bc_identifier("1a"));
        assert!(!Name::is_bc_identifier("Ab"));
        assert!(!Name::is_bc_identifier(""));
    }
}

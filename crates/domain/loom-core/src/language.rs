use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported language, identified by its lowercase ISO 639-1 code.
///
/// Equality and hashing are structural (the code string), never identity;
/// two keys built from the same code are the same language everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageKey(String);

impl LanguageKey {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_ascii_lowercase())
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageKey {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_structural_and_normalized() {
        assert_eq!(LanguageKey::new("ES"), LanguageKey::new(" es "));
        assert_eq!(LanguageKey::new("hi").code(), "hi");
        assert_ne!(LanguageKey::new("es"), LanguageKey::new("hi"));
    }
}

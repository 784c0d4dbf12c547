//! # Content Hash
//!
//! Natural key of a quote, independent of which provider delivered it.
//!
//! The hash is `SHA-256(lowercase(trim(author)) + "::" + lowercase(trim(text)))`,
//! encoded as unpadded base64url. It de-duplicates quotes across providers and
//! resolves cached quotes that have no persisted id yet.
//!
//! # Examples
//!
//! ```
//! use random_quotes::domain::value_objects::ContentHash;
//!
//! let a = ContentHash::of(" Author ", "Text ");
//! let b = ContentHash::of("author", "text");
//! assert_eq!(a, b);
//! assert_eq!(a.as_str().len(), 43);
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Separator between the normalized author and text.
const SEPARATOR: &str = "::";

/// Normalized digest of a quote's author and text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Computes the hash of an `(author, text)` pair.
    #[must_use]
    pub fn of(author: &str, text: &str) -> Self {
        let combined = format!(
            "{}{SEPARATOR}{}",
            author.trim().to_lowercase(),
            text.trim().to_lowercase()
        );
        let digest = Sha256::digest(combined.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(digest))
    }

    /// Wraps a hash previously computed and stored.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the encoded hash.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ignores_case_and_surrounding_whitespace() {
        assert_eq!(
            ContentHash::of(" Author ", "Text "),
            ContentHash::of("author", "text")
        );
    }

    #[test]
    fn separator_is_part_of_the_key() {
        assert_ne!(ContentHash::of("ab", "c"), ContentHash::of("a", "bc"));
    }

    #[test]
    fn encoding_is_url_safe_without_padding() {
        let hash = ContentHash::of("Seneca", "Luck is what happens when preparation meets opportunity.");
        assert_eq!(hash.as_str().len(), 43);
        assert!(!hash.as_str().contains('='));
        assert!(!hash.as_str().contains('+'));
        assert!(!hash.as_str().contains('/'));
    }

    #[test]
    fn known_digest() {
        // Normalization happens before hashing.
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(b"a::b"));
        assert_eq!(ContentHash::of("A", " B").as_str(), expected);
    }

    proptest! {
        #[test]
        fn deterministic(author in ".{0,40}", text in ".{0,80}") {
            prop_assert_eq!(ContentHash::of(&author, &text), ContentHash::of(&author, &text));
        }

        #[test]
        fn padding_and_case_do_not_matter(author in "[a-zA-Z ]{1,20}", text in "[a-zA-Z ]{1,40}") {
            let padded = ContentHash::of(&format!("  {}\t", author.to_uppercase()), &format!("\n{} ", text));
            prop_assert_eq!(padded, ContentHash::of(&author.to_lowercase(), &text.to_lowercase()));
        }
    }
}

//! # Quote Entity
//!
//! A quotation, either freshly fetched from a provider or persisted in the store.
//!
//! # Examples
//!
//! ```
//! use random_quotes::domain::entities::Quote;
//! use random_quotes::domain::value_objects::QuoteId;
//!
//! let fetched = Quote::new("Seneca", "Luck is what happens when preparation meets opportunity.");
//! assert!(fetched.id().is_none());
//!
//! let stored = fetched.clone().with_id(QuoteId::new(7).unwrap()).with_likes(3);
//! assert_eq!(stored.likes(), 3);
//! assert_eq!(stored.content_hash(), fetched.content_hash());
//! ```

use crate::domain::value_objects::{ContentHash, QuoteId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A quotation with its denormalized like counter.
///
/// # Identity
///
/// Two quotes that both carry an id are equal iff their ids match, whatever
/// their text. Otherwise they are equal iff `(author, text)` match exactly
/// (before normalization). Deduplication that runs ahead of hashing must use
/// the same rule.
///
/// `likes` is only authoritative when the quote was read from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Persisted identity, absent for quotes not yet matched in the store.
    id: Option<QuoteId>,
    /// Who said it.
    author: String,
    /// What was said.
    text: String,
    /// Number of users that liked the quote.
    likes: u32,
}

impl Quote {
    /// Creates an unpersisted quote with zero likes.
    #[must_use]
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            author: author.into(),
            text: text.into(),
            likes: 0,
        }
    }

    /// Reconstructs a quote read from storage.
    #[must_use]
    pub fn from_parts(id: QuoteId, author: String, text: String, likes: u32) -> Self {
        Self {
            id: Some(id),
            author,
            text,
            likes,
        }
    }

    /// Sets the persisted identity.
    #[must_use]
    pub fn with_id(mut self, id: QuoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the like counter.
    #[must_use]
    pub fn with_likes(mut self, likes: u32) -> Self {
        self.likes = likes;
        self
    }

    /// Returns the persisted identity, if any.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<QuoteId> {
        self.id
    }

    /// Returns the author.
    #[inline]
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the like counter.
    #[inline]
    #[must_use]
    pub fn likes(&self) -> u32 {
        self.likes
    }

    /// Returns true once the quote has a persisted identity.
    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Computes the normalized content hash. Not cached on the entity.
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(&self.author, &self.text)
    }
}

impl PartialEq for Quote {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.author == other.author && self.text == other.text,
        }
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Quote({id}) \"{}\" - {}", self.text, self.author),
            None => write!(f, "Quote(new) \"{}\" - {}", self.text, self.author),
        }
    }
}

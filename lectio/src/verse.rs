//! Verse records and keys

use crate::books::book_name;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub book_id: u8,
    pub chapter: u16,
    pub verse: u16,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseKey {
    pub book_id: u8,
    pub chapter: u16,
    pub verse: u16,
}

impl VerseKey {
    pub fn new(book_id: u8, chapter: u16, verse: u16) -> Self {
        Self { book_id, chapter, verse }
    }
}

impl Verse {
    pub fn key(&self) -> VerseKey {
        VerseKey::new(self.book_id, self.chapter, self.verse)
    }

    /// "Genesis 1:1"
    pub fn reference(&self) -> String {
        format_reference(self.book_id, self.chapter, self.verse)
    }

    /// The text as copied out of the viewer: verse text, then the reference on its own line.
    pub fn citation(&self) -> String {
        format!("{}\n— {}", self.text, self.reference())
    }
}

pub fn format_reference(book_id: u8, chapter: u16, verse: u16) -> String {
    let name = book_name(book_id).unwrap_or("?");
    format!("{} {}:{}", name, chapter, verse)
}

//! Book → chapter → verse navigation over a loaded corpus

use crate::books::{Book, BOOKS};
use crate::corpus::Corpus;
use crate::verse::{Verse, VerseKey};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct Navigator {
    corpus: Arc<Corpus>,
}

impl Navigator {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    /// All 66 books, whether or not the corpus has text for them.
    pub fn books(&self) -> &'static [Book] {
        &BOOKS
    }

    /// Distinct chapter numbers of a book, ascending.
    pub fn chapters_of(&self, book_id: u8) -> Vec<u16> {
        self.corpus
            .verses()
            .iter()
            .filter(|v| v.book_id == book_id)
            .map(|v| v.chapter)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Verses of one chapter, ordered by verse number regardless of source order.
    pub fn verses_of(&self, book_id: u8, chapter: u16) -> Vec<&Verse> {
        let mut verses: Vec<&Verse> = self
            .corpus
            .verses()
            .iter()
            .filter(|v| v.book_id == book_id && v.chapter == chapter)
            .collect();
        verses.sort_by_key(|v| v.verse);
        verses
    }

    pub fn verse(&self, key: &VerseKey) -> Option<&Verse> {
        self.corpus.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(book_id: u8, chapter: u16, verse: u16, text: &str) -> Verse {
        Verse {
            book_id,
            chapter,
            verse,
            text: text.to_string(),
        }
    }

    fn navigator(verses: Vec<Verse>) -> Navigator {
        Navigator::new(Arc::new(Corpus::from_verses(verses).unwrap()))
    }

    #[test]
    fn test_chapters_ascending_for_every_book() {
        // Deliberately interleaved and out of order.
        let mut verses = Vec::new();
        for book in BOOKS.iter() {
            for chapter in [3u16, 1, 2, 10] {
                for verse in [2u16, 1] {
                    verses.push(v(book.id, chapter, verse, "text"));
                }
            }
        }
        let nav = navigator(verses);

        for book in nav.books() {
            let chapters = nav.chapters_of(book.id);
            assert_eq!(chapters, vec![1, 2, 3, 10], "book {}", book.name);
            assert!(chapters.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_chapters_of_missing_book() {
        let nav = navigator(vec![v(1, 1, 1, "a")]);
        assert!(nav.chapters_of(2).is_empty());
        assert!(nav.chapters_of(0).is_empty());
    }

    #[test]
    fn test_verses_filtered_and_sorted() {
        let nav = navigator(vec![
            v(1, 1, 2, "g1:2"),
            v(1, 2, 1, "g2:1"),
            v(2, 1, 1, "e1:1"),
            v(1, 1, 1, "g1:1"),
            v(1, 1, 3, "g1:3"),
        ]);

        let verses = nav.verses_of(1, 1);
        assert!(verses.iter().all(|x| x.book_id == 1 && x.chapter == 1));
        let numbers: Vec<u16> = verses.iter().map(|x| x.verse).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        assert_eq!(nav.verses_of(2, 1).len(), 1);
        assert!(nav.verses_of(2, 2).is_empty());
    }

    #[test]
    fn test_single_verse_lookup() {
        let nav = navigator(vec![v(43, 11, 35, "Jesus wept.")]);
        assert_eq!(
            nav.verse(&VerseKey::new(43, 11, 35)).map(|x| x.text.as_str()),
            Some("Jesus wept.")
        );
        assert!(nav.verse(&VerseKey::new(43, 11, 34)).is_none());
    }

    #[test]
    fn test_empty_corpus() {
        let nav = Navigator::new(Arc::new(Corpus::empty()));
        assert_eq!(nav.books().len(), 66);
        assert!(nav.chapters_of(1).is_empty());
        assert!(nav.verses_of(1, 1).is_empty());
    }
}

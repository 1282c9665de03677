//! The fixed 66-book table

use serde::Serialize;

pub const BOOK_COUNT: u8 = 66;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: u8,
    pub name: &'static str,
}

const fn book(id: u8, name: &'static str) -> Book {
    Book { id, name }
}

pub static BOOKS: [Book; BOOK_COUNT as usize] = [
    book(1, "Genesis"),
    book(2, "Exodus"),
    book(3, "Leviticus"),
    book(4, "Numbers"),
    book(5, "Deuteronomy"),
    book(6, "Joshua"),
    book(7, "Judges"),
    book(8, "Ruth"),
    book(9, "1 Samuel"),
    book(10, "2 Samuel"),
    book(11, "1 Kings"),
    book(12, "2 Kings"),
    book(13, "1 Chronicles"),
    book(14, "2 Chronicles"),
    book(15, "Ezra"),
    book(16, "Nehemiah"),
    book(17, "Esther"),
    book(18, "Job"),
    book(19, "Psalms"),
    book(20, "Proverbs"),
    book(21, "Ecclesiastes"),
    book(22, "Song of Solomon"),
    book(23, "Isaiah"),
    book(24, "Jeremiah"),
    book(25, "Lamentations"),
    book(26, "Ezekiel"),
    book(27, "Daniel"),
    book(28, "Hosea"),
    book(29, "Joel"),
    book(30, "Amos"),
    book(31, "Obadiah"),
    book(32, "Jonah"),
    book(33, "Micah"),
    book(34, "Nahum"),
    book(35, "Habakkuk"),
    book(36, "Zephaniah"),
    book(37, "Haggai"),
    book(38, "Zechariah"),
    book(39, "Malachi"),
    book(40, "Matthew"),
    book(41, "Mark"),
    book(42, "Luke"),
    book(43, "John"),
    book(44, "Acts"),
    book(45, "Romans"),
    book(46, "1 Corinthians"),
    book(47, "2 Corinthians"),
    book(48, "Galatians"),
    book(49, "Ephesians"),
    book(50, "Philippians"),
    book(51, "Colossians"),
    book(52, "1 Thessalonians"),
    book(53, "2 Thessalonians"),
    book(54, "1 Timothy"),
    book(55, "2 Timothy"),
    book(56, "Titus"),
    book(57, "Philemon"),
    book(58, "Hebrews"),
    book(59, "James"),
    book(60, "1 Peter"),
    book(61, "2 Peter"),
    book(62, "1 John"),
    book(63, "2 John"),
    book(64, "3 John"),
    book(65, "Jude"),
    book(66, "Revelation"),
];

impl Book {
    pub fn from_id(id: u8) -> Option<&'static Book> {
        if (1..=BOOK_COUNT).contains(&id) {
            Some(&BOOKS[id as usize - 1])
        } else {
            None
        }
    }

    /// Case-insensitive lookup; runs of whitespace compare as a single space.
    pub fn from_name(name: &str) -> Option<&'static Book> {
        let wanted = squash(name);
        BOOKS.iter().find(|b| squash(b.name) == wanted)
    }

    /// Accepts either a numeric id or a book name.
    pub fn resolve(id_or_name: &str) -> Option<&'static Book> {
        match id_or_name.trim().parse::<u8>() {
            Ok(id) => Self::from_id(id),
            Err(_) => Self::from_name(id_or_name),
        }
    }
}

pub fn book_name(id: u8) -> Option<&'static str> {
    Book::from_id(id).map(|b| b.name)
}

fn squash(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

//! Wildcard patterns with exactly two operators
//!
//! `*` matches any run of characters (including none) and `?` matches exactly
//! one character. Every other character is literal, so a query such as
//! `a.b+c` only ever matches that exact text. Matching is case-insensitive and
//! unanchored: a pattern matches a text if it occurs anywhere inside it.
//!
//! Matching simulates the pattern as a small NFA over the text instead of
//! backtracking, so the cost is bounded by text length × pattern length per
//! start position no matter how many `*` a query contains.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    tokens: Vec<Token>,
}

pub fn has_wildcard(query: &str) -> bool {
    query.contains(['*', '?'])
}

/// Single-character lowercase mapping shared by queries and verse text.
/// Characters that lowercase to several characters are compared as-is so byte
/// offsets stay aligned with the text; final sigma folds to the medial form.
pub(crate) fn fold(c: char) -> char {
    if c == 'ς' {
        return 'σ';
    }
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

impl Pattern {
    /// Never fails: there is no syntax besides the two operators.
    pub fn compile(query: &str) -> Self {
        let mut tokens = Vec::with_capacity(query.len());
        for c in query.chars() {
            let token = match c {
                '*' => Token::AnyRun,
                '?' => Token::AnyOne,
                c => Token::Literal(fold(c)),
            };
            if token == Token::AnyRun && tokens.last() == Some(&Token::AnyRun) {
                continue;
            }
            tokens.push(token);
        }
        Self { tokens }
    }

    /// True when the pattern is empty or made only of `*`.
    pub fn matches_everything(&self) -> bool {
        self.tokens.iter().all(|t| *t == Token::AnyRun)
    }

    fn accept(&self) -> usize {
        self.tokens.len()
    }

    /// Follow `*` tokens without consuming input.
    fn close(&self, states: &mut [bool]) {
        for j in 0..self.tokens.len() {
            if states[j] && self.tokens[j] == Token::AnyRun {
                states[j + 1] = true;
            }
        }
    }

    fn start(&self, states: &mut [bool]) {
        states.fill(false);
        states[0] = true;
        self.close(states);
    }

    /// Advance every live state over `c`. Returns whether any state survived.
    fn step(&self, current: &[bool], next: &mut [bool], c: char) -> bool {
        next.fill(false);
        let folded = fold(c);
        let mut alive = false;
        for (j, token) in self.tokens.iter().enumerate() {
            if !current[j] {
                continue;
            }
            match *token {
                Token::Literal(l) if l == folded => {
                    next[j + 1] = true;
                    alive = true;
                }
                Token::Literal(_) => {}
                Token::AnyOne => {
                    next[j + 1] = true;
                    alive = true;
                }
                Token::AnyRun => {
                    next[j] = true;
                    alive = true;
                }
            }
        }
        self.close(next);
        alive
    }

    /// Does the pattern occur anywhere in `text`?
    pub fn is_match(&self, text: &str) -> bool {
        if self.matches_everything() {
            return true;
        }
        let accept = self.accept();
        let mut current = vec![false; accept + 1];
        let mut next = vec![false; accept + 1];
        self.start(&mut current);

        for c in text.chars() {
            self.step(&current, &mut next, c);
            // A new occurrence may begin after every character.
            next[0] = true;
            self.close(&mut next);
            if next[accept] {
                return true;
            }
            std::mem::swap(&mut current, &mut next);
        }
        false
    }

    /// Longest occurrence starting exactly at byte offset `start`.
    fn longest_at(&self, text: &str, start: usize, current: &mut Vec<bool>, next: &mut Vec<bool>) -> Option<usize> {
        let accept = self.accept();
        self.start(current);
        let mut end = current[accept].then_some(start);

        for (i, c) in text[start..].char_indices() {
            if !self.step(current, next, c) {
                break;
            }
            std::mem::swap(current, next);
            if current[accept] {
                end = Some(start + i + c.len_utf8());
            }
        }
        end
    }

    /// Leftmost occurrence at or after byte offset `from`, as long as possible.
    pub fn find_at(&self, text: &str, from: usize) -> Option<Range<usize>> {
        if from > text.len() {
            return None;
        }
        let accept = self.accept();
        let mut current = vec![false; accept + 1];
        let mut next = vec![false; accept + 1];
        let first = match self.tokens.first() {
            Some(Token::Literal(l)) => Some(*l),
            _ => None,
        };

        let starts = text[from..]
            .char_indices()
            .map(|(i, c)| (from + i, Some(c)))
            .chain(std::iter::once((text.len(), None)));

        for (start, c) in starts {
            if let Some(l) = first {
                // A leading literal can only start where that character sits.
                match c {
                    Some(c) if fold(c) == l => {}
                    _ => continue,
                }
            }
            if let Some(end) = self.longest_at(text, start, &mut current, &mut next) {
                return Some(start..end);
            }
        }
        None
    }

    /// All non-overlapping occurrences, left to right. An empty occurrence
    /// moves the search forward by one character and is dropped when it sits
    /// right at the end of the previous occurrence.
    pub fn find_iter(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut pos = 0;
        let mut last_end = None;
        while let Some(span) = self.find_at(text, pos) {
            if !span.is_empty() {
                pos = span.end;
                last_end = Some(span.end);
                spans.push(span);
                continue;
            }
            if last_end != Some(span.end) {
                last_end = Some(span.end);
                spans.push(span.clone());
            }
            match text[span.end..].chars().next() {
                Some(c) => pos = span.end + c.len_utf8(),
                None => break,
            }
        }
        spans
    }
}

//! Splitting of raw lister output into lines and paths into segments.
//!
//! Both splitters are zero-copy iterators over the input. Runs of
//! separators are collapsed, so no empty token is ever produced. A token
//! longer than the working limit is truncated (on a `char` boundary) but the
//! scan still resumes at the next separator, so one overlong line never
//! corrupts the ones after it.

use std::iter::FusedIterator;

/// Default working limit for a single listing line, in bytes.
pub const MAX_LINE_BYTES: usize = 4096;

/// Default working limit for a single path segment, in bytes.
pub const MAX_SEGMENT_BYTES: usize = 1024;

/// The separator used inside repository-relative paths.
pub const PATH_SEPARATOR: char = '/';

/// Smallest limit that still fits any single `char`.
const MIN_LIMIT: usize = 4;

/// Iterator over the non-empty lines of a listing. See [`lines`].
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    inner: Splitter<'a>,
}

/// Iterator over the non-empty segments of a path. See [`segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    inner: Splitter<'a>,
}

#[derive(Debug, Clone)]
struct Splitter<'a> {
    rest: &'a str,
    separator: char,
    limit: usize,
}

/// Splits `text` on line feeds, skipping empty lines.
pub fn lines(text: &str) -> Lines<'_> {
    lines_with_limit(text, MAX_LINE_BYTES)
}

/// Like [`lines`], truncating each line to at most `limit` bytes.
pub fn lines_with_limit(text: &str, limit: usize) -> Lines<'_> {
    Lines {
        inner: Splitter::new(text, '\n', limit),
    }
}

/// Splits `path` on `separator`, skipping empty segments.
pub fn segments(path: &str, separator: char) -> Segments<'_> {
    segments_with_limit(path, separator, MAX_SEGMENT_BYTES)
}

/// Like [`segments`], truncating each segment to at most `limit` bytes.
pub fn segments_with_limit(path: &str, separator: char, limit: usize) -> Segments<'_> {
    Segments {
        inner: Splitter::new(path, separator, limit),
    }
}

impl<'a> Splitter<'a> {
    fn new(text: &'a str, separator: char, limit: usize) -> Self {
        Self {
            rest: text,
            separator,
            limit: limit.max(MIN_LIMIT),
        }
    }

    fn next_token(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start_matches(self.separator);
        if rest.is_empty() {
            self.rest = "";
            return None;
        }
        let (token, next) = match rest.find(self.separator) {
            Some(i) => (&rest[..i], &rest[i + self.separator.len_utf8()..]),
            None => (rest, ""),
        };
        self.rest = next;
        Some(truncate(token, self.limit))
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_token()
    }
}

impl FusedIterator for Lines<'_> {}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next_token()
    }
}

impl FusedIterator for Segments<'_> {}

/// Cuts `s` to at most `limit` bytes without splitting a character.
fn truncate(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

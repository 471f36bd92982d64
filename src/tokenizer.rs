//! Chunked word tokenizer
//!
//! Input is read in fixed-size chunks and every chunk is split into words:
//! maximal runs of letters (Unicode general category `L*`), lower-cased.
//! Everything else (digits, punctuation, whitespace, symbols, combining
//! marks, letter-like numerals, invalid UTF-8) separates words and never
//! appears inside one.
//!
//! By default chunks are tokenized independently, so a word that straddles
//! two reads is counted as two fragments. [`ChunkBoundary::Carry`] holds the
//! trailing fragment back and joins it with the next chunk instead.

use crate::tally::WordCounts;
use std::collections::VecDeque;
use std::io::{self, Read};
use unicode_properties::{GeneralCategoryGroup, UnicodeGeneralCategory};

/// Default read size: 1 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// How words that straddle a chunk boundary are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkBoundary {
    /// Tokenize each chunk on its own; straddling words are split in two
    #[default]
    Split,
    /// Carry a trailing partial word (or partial UTF-8 sequence) into the next chunk
    Carry,
}

/// Whether `c` can be part of a word
///
/// Vowel signs (`Mn`/`Mc`) and numerals such as `Ⅻ` (`Nl`) are not letters,
/// even though `char::is_alphabetic` accepts them.
pub fn is_letter(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_alphabetic();
    }
    c.general_category_group() == GeneralCategoryGroup::Letter
}

/// Split one chunk of text into normalized words
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !is_letter(c))
        .filter(|run| !run.is_empty())
        .map(str::to_lowercase)
}

/// Tokenizer settings
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    chunk_size: usize,
    boundary: ChunkBoundary,
}

impl Tokenizer {
    /// Create a tokenizer reading `chunk_size` bytes at a time
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            boundary: ChunkBoundary::Split,
        }
    }

    /// Set the chunk boundary mode
    pub fn boundary(mut self, boundary: ChunkBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Lazily tokenize everything `reader` produces
    pub fn stream<R: Read>(&self, reader: R) -> WordStream<R> {
        WordStream {
            reader,
            buf: vec![0; self.chunk_size],
            boundary: self.boundary,
            partial_char: Vec::new(),
            carry: String::new(),
            pending: VecDeque::new(),
            error: None,
            done: false,
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

/// Lazy sequence of words read from a byte stream
///
/// Yields `Err` at most once, after every word read before the failure,
/// and nothing after it.
pub struct WordStream<R> {
    reader: R,
    buf: Vec<u8>,
    boundary: ChunkBoundary,
    /// Start of a multi-byte character cut off by the last read (at most 3 bytes)
    partial_char: Vec<u8>,
    /// Letters at the end of the text read so far, not yet known to be a whole word
    carry: String,
    pending: VecDeque<String>,
    error: Option<io::Error>,
    done: bool,
}

impl<R: Read> WordStream<R> {
    fn fill(&mut self, n: usize) {
        match self.boundary {
            ChunkBoundary::Split => {
                let text = String::from_utf8_lossy(&self.buf[..n]);
                self.pending.extend(words(&text));
            }
            ChunkBoundary::Carry => {
                let mut bytes = std::mem::take(&mut self.partial_char);
                bytes.extend_from_slice(&self.buf[..n]);
                let complete = bytes.len() - incomplete_utf8_tail(&bytes);
                let text = String::from_utf8_lossy(&bytes[..complete]);

                // Leading letters continue the carried word
                let lead = text.find(|c: char| !is_letter(c)).unwrap_or(text.len());
                self.carry.push_str(&text[..lead]);
                if lead < text.len() {
                    self.emit_carry();
                    let rest = &text[lead..];
                    let cut = trailing_word_start(rest);
                    self.pending.extend(words(&rest[..cut]));
                    self.carry.push_str(&rest[cut..]);
                }

                self.partial_char = bytes[complete..].to_vec();
            }
        }
    }

    fn emit_carry(&mut self) {
        if !self.carry.is_empty() {
            let word = self.carry.to_lowercase();
            self.carry.clear();
            self.pending.push_back(word);
        }
    }

    /// End of input: a cut-off character decodes to U+FFFD, which only ends the carried word
    fn flush_carry(&mut self) {
        self.partial_char.clear();
        self.emit_carry();
    }
}

impl<R: Read> Iterator for WordStream<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(word) = self.pending.pop_front() {
                return Some(Ok(word));
            }
            if self.done {
                return self.error.take().map(Err);
            }

            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    self.flush_carry();
                }
                Ok(n) => self.fill(n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    self.error = Some(e);
                    self.flush_carry();
                }
            }
        }
    }
}

/// Count every word in `stream`, stopping at the first read error
///
/// The counts gathered before the error are returned alongside it.
pub fn count_words<I>(stream: I) -> (WordCounts, Option<io::Error>)
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut counts = WordCounts::new();
    for item in stream {
        match item {
            Ok(word) => *counts.entry(word).or_insert(0) += 1,
            Err(e) => return (counts, Some(e)),
        }
    }
    (counts, None)
}

/// Number of bytes at the end of `bytes` that form an unfinished UTF-8 sequence
fn incomplete_utf8_tail(bytes: &[u8]) -> usize {
    for i in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - i];
        if b & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let needed = if b & 0b1110_0000 == 0b1100_0000 {
            2
        } else if b & 0b1111_0000 == 0b1110_0000 {
            3
        } else if b & 0b1111_1000 == 0b1111_0000 {
            4
        } else {
            1
        };
        return if needed > i { i } else { 0 };
    }
    0
}

/// Byte offset where the trailing run of letters in `text` begins
fn trailing_word_start(text: &str) -> usize {
    text.char_indices()
        .rev()
        .take_while(|(_, c)| is_letter(*c))
        .last()
        .map_or(text.len(), |(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tokenize(text: &str) -> Vec<String> {
        words(text).collect()
    }

    fn stream_words(input: &str, chunk_size: usize, boundary: ChunkBoundary) -> Vec<String> {
        Tokenizer::new(chunk_size)
            .boundary(boundary)
            .stream(Cursor::new(input.as_bytes().to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    /// Yields its data, then fails every read after that
    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "disk on fire")),
                n => Ok(n),
            }
        }
    }

    /// Interrupts every other read
    struct InterruptingReader {
        data: Cursor<Vec<u8>>,
        interrupt: bool,
    }

    impl Read for InterruptingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_punctuation_separates() {
        assert_eq!(
            tokenize("apple orange! banana? apple."),
            vec!["apple", "orange", "banana", "apple"]
        );
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(tokenize("Apple APPLE aPpLe"), vec!["apple"; 3]);
        assert_eq!(tokenize("ÉCOLE Straße"), vec!["école", "straße"]);
    }

    #[test]
    fn test_digits_and_hyphens_split() {
        assert_eq!(
            tokenize("co-op, co2 visits: co-op!"),
            vec!["co", "op", "co", "visits", "co", "op"]
        );
        assert!(tokenize("123 4.56 -- !!").is_empty());
    }

    #[test]
    fn test_letters_are_general_category_l() {
        // Devanagari vowel signs and the virama are marks, not letters
        assert_eq!(tokenize("हिन्दी"), vec!["ह", "न", "द"]);
        // Roman numerals are Nl
        assert_eq!(tokenize("chapter Ⅻ"), vec!["chapter"]);
        assert_eq!(tokenize("日本語 العربية"), vec!["日本語", "العربية"]);
        assert!(!is_letter('\u{0301}'));
        assert!(is_letter('ß'));
    }

    #[test]
    fn test_replacement_char_is_separator() {
        let text = String::from_utf8_lossy(b"ab\xffcd");
        assert_eq!(tokenize(&text), vec!["ab", "cd"]);
    }

    #[test]
    fn test_split_mode_breaks_straddling_words() {
        // chunks: "hell" "o wo" "rld"
        assert_eq!(
            stream_words("hello world", 4, ChunkBoundary::Split),
            vec!["hell", "o", "wo", "rld"]
        );
    }

    #[test]
    fn test_carry_mode_joins_straddling_words() {
        assert_eq!(
            stream_words("hello world", 4, ChunkBoundary::Carry),
            vec!["hello", "world"]
        );
    }

    #[test]
    fn test_split_multibyte_across_chunks() {
        // "café" is 5 bytes; the é is cut in half by a 4 byte chunk
        assert_eq!(stream_words("café", 4, ChunkBoundary::Split), vec!["caf"]);
        assert_eq!(stream_words("café", 4, ChunkBoundary::Carry), vec!["café"]);
    }

    #[test]
    fn test_carry_mode_handles_marks_across_chunks() {
        // each Devanagari code point is 3 bytes, so 4 byte chunks cut them all
        assert_eq!(
            stream_words("हिन्दी हिन्दी", 4, ChunkBoundary::Carry),
            vec!["ह", "न", "द", "ह", "न", "द"]
        );
    }

    #[test]
    fn test_carry_mode_edge_chunks() {
        assert_eq!(stream_words("ab cd", 1, ChunkBoundary::Carry), vec!["ab", "cd"]);
        assert_eq!(stream_words("ab ", 3, ChunkBoundary::Carry), vec!["ab"]);
        assert_eq!(stream_words(" ab", 1, ChunkBoundary::Carry), vec!["ab"]);
        assert_eq!(stream_words("Σοφία", 3, ChunkBoundary::Carry), vec!["σοφία"]);
    }

    #[test]
    fn test_carry_mode_long_letter_run() {
        let run = "a".repeat(4 * 1024 * 1024);
        let input = format!("{} tail", run);
        let start = std::time::Instant::now();
        let words = stream_words(&input, 4096, ChunkBoundary::Carry);
        let elapsed = start.elapsed();

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].len(), run.len());
        assert_eq!(words[1], "tail");
        // Each chunk is decoded once; rescanning the whole carried run per chunk
        // takes minutes at this size
        assert!(elapsed < std::time::Duration::from_secs(30), "took {:?}", elapsed);
    }

    #[test]
    fn test_carry_mode_truncated_character_at_eof() {
        let reader = Cursor::new(b"word\xe2\x82".to_vec());
        let stream = Tokenizer::new(3).boundary(ChunkBoundary::Carry).stream(reader);
        let words: Vec<String> = stream.collect::<io::Result<_>>().unwrap();
        assert_eq!(words, vec!["word"]);
    }

    #[test]
    fn test_large_chunk_matches_words() {
        let text = "The quick brown fox, the lazy dog; THE end.";
        assert_eq!(
            stream_words(text, DEFAULT_CHUNK_SIZE, ChunkBoundary::Split),
            tokenize(text)
        );
    }

    #[test]
    fn test_count_words_keeps_counts_before_error() {
        let reader = FailingReader {
            data: Cursor::new(b"alpha beta alpha ".to_vec()),
        };
        let (counts, err) = count_words(Tokenizer::new(64).stream(reader));
        assert_eq!(counts.get("alpha"), Some(&2));
        assert_eq!(counts.get("beta"), Some(&1));
        assert_eq!(err.map(|e| e.kind()), Some(io::ErrorKind::Other));
    }

    #[test]
    fn test_error_yielded_once() {
        let reader = FailingReader {
            data: Cursor::new(b"one".to_vec()),
        };
        let mut stream = Tokenizer::new(64).stream(reader);
        assert_eq!(stream.next().unwrap().unwrap(), "one");
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let reader = InterruptingReader {
            data: Cursor::new(b"red green red".to_vec()),
            interrupt: false,
        };
        let tokenizer = Tokenizer::new(3).boundary(ChunkBoundary::Carry);
        let (counts, err) = count_words(tokenizer.stream(reader));
        assert!(err.is_none());
        assert_eq!(counts.get("red"), Some(&2));
        assert_eq!(counts.get("green"), Some(&1));
    }

    #[test]
    fn test_incomplete_utf8_tail() {
        assert_eq!(incomplete_utf8_tail(b"abc"), 0);
        assert_eq!(incomplete_utf8_tail(b"ab\xc3"), 1);
        assert_eq!(incomplete_utf8_tail("é".as_bytes()), 0);
        assert_eq!(incomplete_utf8_tail(b"\xe2\x82"), 2);
        assert_eq!(incomplete_utf8_tail("€".as_bytes()), 0);
    }
}

//! Reading-time estimation from article text

use serde::{Deserialize, Serialize};

/// Words per minute used when none (or zero) is configured
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 250;

/// Predicate deciding whether a character separates words
pub type WordBound = fn(char) -> bool;

/// Returns true on space, newline, carriage return and tab
pub fn ansi_word_bound(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\r' | '\t')
}

/// Options for [`reading_time`]
#[derive(Debug, Clone, Copy)]
pub struct ReadingTimeOptions {
    pub words_per_minute: u32,
    pub word_bound: WordBound,
}

impl ReadingTimeOptions {
    pub fn new(words_per_minute: u32) -> Self {
        Self {
            words_per_minute,
            ..Self::default()
        }
    }

    /// Replace the word boundary predicate
    pub fn with_word_bound(mut self, word_bound: WordBound) -> Self {
        self.word_bound = word_bound;
        self
    }

    fn effective_wpm(&self) -> u32 {
        if self.words_per_minute == 0 {
            DEFAULT_WORDS_PER_MINUTE
        } else {
            self.words_per_minute
        }
    }
}

impl Default for ReadingTimeOptions {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            word_bound: ansi_word_bound,
        }
    }
}

/// Estimated total reading time of an article, fixed once computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingTimeEstimate {
    /// Display string such as `"3 min read"`
    pub text: String,
    pub minutes: f64,
    /// Estimated reading time in milliseconds
    pub time_ms: f64,
    pub words: usize,
}

impl ReadingTimeEstimate {
    /// Minutes shown to the reader: rounded to two decimals, then rounded up
    pub fn display_minutes(&self) -> u64 {
        display_minutes(self.minutes)
    }

    /// Data-layer value, e.g. `"4 min"`
    pub fn reading_time(&self) -> String {
        format!("{} min", self.minutes.round() as u64)
    }

    /// Estimated time as `m:ss`
    pub fn timestamp(&self) -> String {
        format_timestamp(self.time_ms)
    }
}

/// Estimate how long the given text takes to read
pub fn reading_time(text: &str, options: &ReadingTimeOptions) -> ReadingTimeEstimate {
    let words = count_words(text, options.word_bound);
    let minutes = words as f64 / f64::from(options.effective_wpm());
    let time_ms = minutes * 60.0 * 1000.0;

    ReadingTimeEstimate {
        text: format!("{} min read", display_minutes(minutes)),
        minutes,
        time_ms,
        words,
    }
}

/// Count maximal runs of non-boundary characters
pub fn count_words(text: &str, word_bound: WordBound) -> usize {
    text.trim_matches(word_bound)
        .split(word_bound)
        .filter(|word| !word.is_empty())
        .count()
}

/// Concatenate the text content of the article's direct children.
///
/// Whitespace runs inside a child collapse to one space and empty children
/// are skipped.
pub fn article_text<S: AsRef<str>>(children: &[S]) -> String {
    let mut text = String::new();
    for child in children.iter().map(AsRef::as_ref) {
        if child.is_empty() {
            continue;
        }
        let mut in_space = false;
        for c in child.chars() {
            if c.is_whitespace() {
                if !in_space {
                    text.push(' ');
                }
                in_space = true;
            } else {
                text.push(c);
                in_space = false;
            }
        }
    }
    text
}

fn display_minutes(minutes: f64) -> u64 {
    let hundredths = (minutes * 100.0).round() / 100.0;
    hundredths.ceil() as u64
}

fn format_timestamp(millis: f64) -> String {
    let millis = millis.max(0.0);
    let mut min = (millis / 60_000.0).floor() as u64;
    let mut sec = ((millis % 60_000.0) / 1000.0).round() as u64;
    if sec == 60 {
        min += 1;
        sec = 0;
    }
    format!("{}:{:02}", min, sec)
}

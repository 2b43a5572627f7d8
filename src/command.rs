//! Message classification and dispatch.
//!
//! A message is matched against [`RULES`] in order and the first matching
//! rule decides the command. Later rules test for generic punctuation, so
//! the order matters: `base64 [1-5]` is a base64 request, not a range.

use rand::Rng;
use tracing::debug;

use crate::engine::{Randomizer, DEFAULT_STRING_LENGTH, ERROR_REPLY};

/// Bounds extracted from a `[a-b]` or `(a-b)` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Range {
    Numeric { start: i32, end: i32 },
    Chars { start: char, end: char },
    /// A bound token was empty, so no character could be taken from it.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Guid,
    Dice,
    RandomString { length: i64 },
    /// `None` means the message carried no text; a random string is encoded instead.
    Base64 { text: Option<String> },
    /// `None` means the message carried no text; a random string is hashed instead.
    Sha256 { text: Option<String> },
    /// `None` means the message carried no text; a random string is hashed instead.
    Sha512 { text: Option<String> },
    RangeShuffle(Range),
    RangePick(Range),
    ListShuffle(Vec<String>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Guid => "guid",
            Command::Dice => "dice",
            Command::RandomString { .. } => "randomstring",
            Command::Base64 { .. } => "base64",
            Command::Sha256 { .. } => "sha256",
            Command::Sha512 { .. } => "sha512",
            Command::RangeShuffle(_) => "range_shuffle",
            Command::RangePick(_) => "range_pick",
            Command::ListShuffle(_) => "list_shuffle",
        }
    }
}

/// What a rule looks for in the message text.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Case-insensitive substring.
    Keyword(&'static str),
    /// All three characters present anywhere.
    Punctuation([char; 3]),
}

impl Matcher {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Keyword(keyword) => text.to_ascii_lowercase().contains(keyword),
            Matcher::Punctuation(marks) => marks.iter().all(|&c| text.contains(c)),
        }
    }
}

pub struct Rule {
    pub matcher: Matcher,
    pub extract: fn(&str) -> Command,
}

const GUID: &str = "guid";
const DICE: &str = "dice";
const RANDOM_STRING: &str = "randomstring";
const BASE64: &str = "base64";
const SHA256: &str = "sha256";
const SHA512: &str = "sha512";

/// Classification rules, highest priority first.
pub const RULES: &[Rule] = &[
    Rule {
        matcher: Matcher::Keyword(GUID),
        extract: extract_guid,
    },
    Rule {
        matcher: Matcher::Keyword(DICE),
        extract: extract_dice,
    },
    Rule {
        matcher: Matcher::Keyword(RANDOM_STRING),
        extract: extract_random_string,
    },
    Rule {
        matcher: Matcher::Keyword(BASE64),
        extract: extract_base64,
    },
    Rule {
        matcher: Matcher::Keyword(SHA256),
        extract: extract_sha256,
    },
    Rule {
        matcher: Matcher::Keyword(SHA512),
        extract: extract_sha512,
    },
    Rule {
        matcher: Matcher::Punctuation(['[', '-', ']']),
        extract: extract_range_shuffle,
    },
    Rule {
        matcher: Matcher::Punctuation(['(', '-', ')']),
        extract: extract_range_pick,
    },
    Rule {
        matcher: Matcher::Punctuation(['{', ',', '}']),
        extract: extract_list_shuffle,
    },
];

/// Pick the command for a message, or `None` if nothing matches.
pub fn classify(text: &str) -> Option<Command> {
    RULES
        .iter()
        .find(|rule| rule.matcher.matches(text))
        .map(|rule| (rule.extract)(text))
}

fn extract_guid(_text: &str) -> Command {
    Command::Guid
}

fn extract_dice(_text: &str) -> Command {
    Command::Dice
}

fn extract_random_string(text: &str) -> Command {
    let length = keyword_argument(text, RANDOM_STRING)
        .parse::<i32>()
        .map(i64::from)
        .unwrap_or(DEFAULT_STRING_LENGTH as i64);
    Command::RandomString { length }
}

fn extract_base64(text: &str) -> Command {
    Command::Base64 {
        text: non_empty(keyword_argument(text, BASE64)),
    }
}

fn extract_sha256(text: &str) -> Command {
    Command::Sha256 {
        text: non_empty(keyword_argument(text, SHA256)),
    }
}

fn extract_sha512(text: &str) -> Command {
    Command::Sha512 {
        text: non_empty(keyword_argument(text, SHA512)),
    }
}

fn extract_range_shuffle(text: &str) -> Command {
    Command::RangeShuffle(extract_range(text, '[', ']'))
}

fn extract_range_pick(text: &str) -> Command {
    Command::RangePick(extract_range(text, '(', ')'))
}

fn extract_list_shuffle(text: &str) -> Command {
    let stripped = text.replace('{', "").replace('}', "");
    Command::ListShuffle(stripped.split(',').map(str::to_string).collect())
}

/// The text with the first case-insensitive occurrence of `keyword` removed, trimmed.
fn keyword_argument(text: &str, keyword: &str) -> String {
    // ASCII lowercasing keeps byte offsets, so positions map back onto `text`.
    let lowered = text.to_ascii_lowercase();
    let remainder = match lowered.find(keyword) {
        Some(pos) => format!("{}{}", &text[..pos], &text[pos + keyword.len()..]),
        None => text.to_string(),
    };
    remainder.trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Strip the delimiters, split on `-` and read the first and last tokens.
fn extract_range(text: &str, open: char, close: char) -> Range {
    let stripped = text.replace(open, "").replace(close, "");
    let tokens: Vec<&str> = stripped.split('-').collect();
    let first = tokens.first().copied().unwrap_or_default();
    let last = tokens.last().copied().unwrap_or_default();

    if let (Ok(start), Ok(end)) = (first.trim().parse::<i32>(), last.trim().parse::<i32>()) {
        return Range::Numeric { start, end };
    }

    match (first.chars().next(), last.chars().last()) {
        (Some(start), Some(end)) => Range::Chars { start, end },
        _ => Range::Malformed,
    }
}

/// Classifies messages and runs them through the [`Randomizer`].
pub struct Dispatcher<R> {
    engine: Randomizer<R>,
}

impl<R: Rng> Dispatcher<R> {
    pub fn new(engine: Randomizer<R>) -> Self {
        Self { engine }
    }

    /// Reply for a message, or `None` if the message is not a command.
    pub fn handle(&mut self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let command = classify(text)?;
        debug!("Dispatching '{}' command", command.name());
        Some(self.execute(command))
    }

    pub fn execute(&mut self, command: Command) -> String {
        match command {
            Command::Guid => self.engine.guid(),
            Command::Dice => self.engine.dice(),
            Command::RandomString { length } => self.engine.random_string(length),
            Command::Base64 { text } => {
                let text = self.text_or_random(text);
                self.engine.base64(&text)
            }
            Command::Sha256 { text } => {
                let text = self.text_or_random(text);
                self.engine.sha256(&text)
            }
            Command::Sha512 { text } => {
                let text = self.text_or_random(text);
                self.engine.sha512(&text)
            }
            Command::RangeShuffle(range) => match range {
                Range::Numeric { start, end } => self.engine.shuffle_numbers(start, end),
                Range::Chars { start, end } => self.engine.shuffle_chars(start, end),
                Range::Malformed => ERROR_REPLY.to_string(),
            },
            Command::RangePick(range) => match range {
                Range::Numeric { start, end } => self.engine.pick_number(start, end),
                Range::Chars { start, end } => self.engine.pick_char(start, end),
                Range::Malformed => ERROR_REPLY.to_string(),
            },
            Command::ListShuffle(tokens) => self.engine.shuffle_list(tokens),
        }
    }

    fn text_or_random(&mut self, text: Option<String>) -> String {
        text.unwrap_or_else(|| self.engine.sample_string(DEFAULT_STRING_LENGTH))
    }
}

use base64::Engine as _;
use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256, Sha512};

use crate::config::{DigestFormat, LimitsConfig, NumericRange, RandomizerConfig};

/// Characters a random string is drawn from.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_STRING_LENGTH: usize = 32;

/// Reply for invalid or oversized ranges and strings.
pub const ERROR_REPLY: &str = "error";

impl DigestFormat {
    /// Turn digest bytes into reply text.
    pub fn render(self, digest: &[u8]) -> String {
        match self {
            DigestFormat::Hex => hex::encode(digest),
            DigestFormat::Raw => String::from_utf8_lossy(digest).into_owned(),
        }
    }
}

/// Produces every random or derived reply. Owns the random source.
pub struct Randomizer<R> {
    rng: R,
    digest_format: DigestFormat,
    numeric_range: NumericRange,
    max_range_len: usize,
    max_string_len: usize,
}

impl<R: Rng> Randomizer<R> {
    pub fn new(rng: R, settings: &RandomizerConfig, limits: &LimitsConfig) -> Self {
        Self {
            rng,
            digest_format: settings.digest_format,
            numeric_range: settings.numeric_range,
            max_range_len: limits.max_range_len,
            max_string_len: limits.max_string_len,
        }
    }

    /// Random (v4) UUID built from the shared random source.
    pub fn guid(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.gen();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    pub fn dice(&mut self) -> String {
        self.rng.gen_range(1..=6u8).to_string()
    }

    /// `length` characters from [`ALPHABET`]. Non-positive lengths give an
    /// empty string, lengths above the configured limit give [`ERROR_REPLY`].
    pub fn random_string(&mut self, length: i64) -> String {
        let Ok(length) = usize::try_from(length) else {
            return String::new();
        };
        if exceeds(length as u64, self.max_string_len) {
            return ERROR_REPLY.to_string();
        }
        self.sample_string(length)
    }

    /// Unchecked variant of [`Randomizer::random_string`].
    pub fn sample_string(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }

    pub fn base64(&self, text: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
    }

    pub fn sha256(&self, text: &str) -> String {
        self.digest_format.render(&Sha256::digest(text.as_bytes()))
    }

    pub fn sha512(&self, text: &str) -> String {
        self.digest_format.render(&Sha512::digest(text.as_bytes()))
    }

    /// All candidate integers in random order, as `[v1, v2, ...]`.
    pub fn shuffle_numbers(&mut self, start: i32, end: i32) -> String {
        let Some((first, len)) = self.numeric_bounds(start, end) else {
            return ERROR_REPLY.to_string();
        };
        if exceeds(len, self.max_range_len) {
            return ERROR_REPLY.to_string();
        }

        let mut values: Vec<i64> = (first..first + len as i64).collect();
        values.shuffle(&mut self.rng);
        format!("[{}]", join(&values))
    }

    /// One candidate integer, as `[v]`.
    pub fn pick_number(&mut self, start: i32, end: i32) -> String {
        let Some((first, len)) = self.numeric_bounds(start, end) else {
            return ERROR_REPLY.to_string();
        };
        let offset = self.rng.gen_range(0..len);
        format!("[{}]", first + offset as i64)
    }

    /// Every char from `start` to `end` in random order, as `[c1, c2, ...]`.
    pub fn shuffle_chars(&mut self, start: char, end: char) -> String {
        if end <= start || exceeds(u64::from(char_span(start, end)), self.max_range_len) {
            return ERROR_REPLY.to_string();
        }

        let mut chars: Vec<char> = (start..=end).collect();
        chars.shuffle(&mut self.rng);
        format!("[{}]", join(&chars))
    }

    /// One char from `start` to `end`, unbracketed.
    pub fn pick_char(&mut self, start: char, end: char) -> String {
        if end <= start {
            return ERROR_REPLY.to_string();
        }
        let index = self.rng.gen_range(0..char_span(start, end));
        match (start..=end).nth(index as usize) {
            Some(c) => c.to_string(),
            None => ERROR_REPLY.to_string(),
        }
    }

    /// The tokens in random order, as `{t1,t2,...}`.
    pub fn shuffle_list(&mut self, mut tokens: Vec<String>) -> String {
        tokens.shuffle(&mut self.rng);
        format!("{{{}}}", tokens.join(","))
    }

    /// First candidate and candidate count, or `None` for an empty range.
    fn numeric_bounds(&self, start: i32, end: i32) -> Option<(i64, u64)> {
        if end <= start {
            return None;
        }
        let (start, end) = (i64::from(start), i64::from(end));
        let len = match self.numeric_range {
            NumericRange::Inclusive => end - start + 1,
            NumericRange::Counted => end,
        };
        u64::try_from(len)
            .ok()
            .filter(|&len| len > 0)
            .map(|len| (start, len))
    }
}

/// Whether `len` is over `limit`, where a zero limit means unlimited.
fn exceeds(len: u64, limit: usize) -> bool {
    limit != 0 && len > limit as u64
}

/// Number of chars in `start..=end`, skipping the surrogate block.
fn char_span(start: char, end: char) -> u32 {
    let (s, e) = (start as u32, end as u32);
    let span = e - s + 1;
    if s < 0xD800 && e > 0xDFFF {
        span - 0x800
    } else {
        span
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn randomizer(seed: u64) -> Randomizer<StdRng> {
        Randomizer::new(
            StdRng::seed_from_u64(seed),
            &RandomizerConfig::default(),
            &LimitsConfig::default(),
        )
    }

    fn counted_randomizer(seed: u64) -> Randomizer<StdRng> {
        let settings = RandomizerConfig {
            numeric_range: NumericRange::Counted,
            ..Default::default()
        };
        Randomizer::new(
            StdRng::seed_from_u64(seed),
            &settings,
            &LimitsConfig::default(),
        )
    }

    fn parse_numbers(reply: &str) -> Vec<i64> {
        let inner = reply
            .strip_prefix('[')
            .and_then(|r| r.strip_suffix(']'))
            .expect("bracketed reply");
        inner.split(", ").map(|v| v.parse().unwrap()).collect()
    }

    fn sorted(mut values: Vec<i64>) -> Vec<i64> {
        values.sort();
        values
    }

    #[test]
    fn test_random_string_length_and_alphabet() {
        let mut r = randomizer(1);
        for length in [1, 5, 32, 100] {
            let s = r.random_string(length);
            assert_eq!(s.chars().count(), length as usize);
            assert!(s.bytes().all(|b| ALPHABET.contains(&b)), "bad char in {}", s);
        }
    }

    #[test]
    fn test_random_string_non_positive_is_empty() {
        let mut r = randomizer(1);
        assert_eq!(r.random_string(0), "");
        assert_eq!(r.random_string(-12), "");
    }

    #[test]
    fn test_random_string_over_limit() {
        let limits = LimitsConfig {
            max_string_len: 8,
            ..Default::default()
        };
        let mut r = Randomizer::new(
            StdRng::seed_from_u64(1),
            &RandomizerConfig::default(),
            &limits,
        );
        assert_eq!(r.random_string(8).len(), 8);
        assert_eq!(r.random_string(9), ERROR_REPLY);
    }

    #[test]
    fn test_default_limits_allow_long_outputs() {
        let mut r = randomizer(4);
        assert_eq!(r.random_string(5000).len(), 5000);

        let reply = r.shuffle_numbers(1, 1001);
        assert_ne!(reply, ERROR_REPLY);
        let mut values = parse_numbers(&reply);
        values.sort();
        assert_eq!(values, (1..=1001).collect::<Vec<i64>>());
    }

    #[test]
    fn test_zero_limit_is_unlimited() {
        let limits = LimitsConfig {
            max_range_len: 0,
            max_string_len: 0,
        };
        let mut r = Randomizer::new(
            StdRng::seed_from_u64(5),
            &RandomizerConfig::default(),
            &limits,
        );
        assert_eq!(r.random_string(200_000).len(), 200_000);
        assert_eq!(parse_numbers(&r.shuffle_numbers(1, 200_000)).len(), 200_000);
        assert_ne!(r.shuffle_chars('\u{0}', '\u{30000}'), ERROR_REPLY);
    }

    #[test]
    fn test_dice_covers_all_faces() {
        let mut r = randomizer(3);
        let faces: HashSet<String> = (0..600).map(|_| r.dice()).collect();
        let expected: HashSet<String> = (1..=6).map(|n: u8| n.to_string()).collect();
        assert_eq!(faces, expected);
    }

    #[test]
    fn test_guid_is_v4_and_seeded() {
        let mut a = randomizer(9);
        let mut b = randomizer(9);
        let guid = a.guid();
        let parsed = uuid::Uuid::parse_str(&guid).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(guid.len(), 36);
        assert_eq!(guid, b.guid());
        assert_ne!(a.guid(), guid);
    }

    #[test]
    fn test_base64() {
        let r = randomizer(1);
        assert_eq!(r.base64("hello"), "aGVsbG8=");
        assert_eq!(r.base64("ü"), "w7w=");
    }

    #[test]
    fn test_sha_hex() {
        let r = randomizer(1);
        assert_eq!(
            r.sha256("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let sha512 = r.sha512("abc");
        assert_eq!(sha512.len(), 128);
        assert!(sha512.starts_with("ddaf35a193617aba"));
    }

    #[test]
    fn test_sha_raw_format() {
        let settings = RandomizerConfig {
            digest_format: DigestFormat::Raw,
            ..Default::default()
        };
        let r = Randomizer::new(
            StdRng::seed_from_u64(1),
            &settings,
            &LimitsConfig::default(),
        );
        let digest = Sha256::digest(b"abc");
        assert_eq!(r.sha256("abc"), String::from_utf8_lossy(&digest));
        assert_ne!(r.sha256("abc"), hex::encode(digest));
    }

    #[test]
    fn test_invalid_ranges_are_errors() {
        for mut r in [randomizer(1), counted_randomizer(1)] {
            assert_eq!(r.shuffle_numbers(5, 5), ERROR_REPLY);
            assert_eq!(r.shuffle_numbers(9, 2), ERROR_REPLY);
            assert_eq!(r.pick_number(5, 5), ERROR_REPLY);
            assert_eq!(r.pick_number(9, 2), ERROR_REPLY);
            assert_eq!(r.shuffle_chars('f', 'a'), ERROR_REPLY);
            assert_eq!(r.shuffle_chars('a', 'a'), ERROR_REPLY);
            assert_eq!(r.pick_char('z', 'a'), ERROR_REPLY);
            assert_eq!(r.pick_char('q', 'q'), ERROR_REPLY);
        }
    }

    #[test]
    fn test_shuffle_one_to_five_in_both_modes() {
        for mut r in [randomizer(4), counted_randomizer(4)] {
            let reply = r.shuffle_numbers(1, 5);
            assert_eq!(sorted(parse_numbers(&reply)), vec![1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn test_inclusive_and_counted_candidates_differ() {
        let mut inclusive = randomizer(5);
        assert_eq!(sorted(parse_numbers(&inclusive.shuffle_numbers(3, 5))), vec![3, 4, 5]);

        let mut counted = counted_randomizer(5);
        assert_eq!(
            sorted(parse_numbers(&counted.shuffle_numbers(3, 5))),
            vec![3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_shuffle_format() {
        let mut r = randomizer(6);
        let reply = r.shuffle_numbers(10, 12);
        assert!(reply.starts_with('[') && reply.ends_with(']'));
        assert_eq!(reply.matches(", ").count(), 2);
    }

    #[test]
    fn test_pick_number_within_bounds() {
        let mut inclusive = randomizer(7);
        let mut counted = counted_randomizer(7);
        for _ in 0..200 {
            let v = parse_numbers(&inclusive.pick_number(3, 6));
            assert_eq!(v.len(), 1);
            assert!((3..=6).contains(&v[0]));

            let v = parse_numbers(&counted.pick_number(3, 6));
            assert!((3..9).contains(&v[0]));
        }
    }

    #[test]
    fn test_pick_number_ignores_range_limit() {
        let mut r = randomizer(8);
        assert_eq!(r.shuffle_numbers(1, 1_000_000), ERROR_REPLY);
        let v = parse_numbers(&r.pick_number(1, 1_000_000));
        assert!((1..=1_000_000).contains(&v[0]));
    }

    #[test]
    fn test_shuffle_chars_is_permutation() {
        let mut r = randomizer(10);
        let reply = r.shuffle_chars('a', 'f');
        let inner = reply.strip_prefix('[').unwrap().strip_suffix(']').unwrap();
        let mut chars: Vec<char> = inner
            .split(", ")
            .map(|c| c.chars().next().unwrap())
            .collect();
        chars.sort();
        assert_eq!(chars, vec!['a', 'b', 'c', 'd', 'e', 'f']);
    }

    #[test]
    fn test_pick_char_is_bare() {
        let mut r = randomizer(11);
        for _ in 0..100 {
            let reply = r.pick_char('a', 'f');
            assert_eq!(reply.chars().count(), 1);
            assert!(('a'..='f').contains(&reply.chars().next().unwrap()));
        }
    }

    #[test]
    fn test_char_range_skips_surrogates() {
        assert_eq!(char_span('\u{D7FF}', '\u{E000}'), 2);
        assert_eq!(char_span('a', 'c'), 3);

        let mut r = randomizer(12);
        let reply = r.shuffle_chars('\u{D7FF}', '\u{E000}');
        assert_eq!(reply.chars().filter(|c| *c == '\u{D7FF}' || *c == '\u{E000}').count(), 2);
    }

    #[test]
    fn test_shuffle_list_reaches_every_permutation() {
        let mut r = randomizer(13);
        let tokens: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let mut seen = HashSet::new();
        for _ in 0..300 {
            let reply = r.shuffle_list(tokens.clone());
            let inner = reply.strip_prefix('{').unwrap().strip_suffix('}').unwrap();
            let mut items: Vec<&str> = inner.split(',').collect();
            seen.insert(inner.to_string());
            items.sort();
            assert_eq!(items, vec!["a", "b", "c"]);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_same_seed_same_replies() {
        let mut a = randomizer(99);
        let mut b = randomizer(99);
        assert_eq!(a.random_string(32), b.random_string(32));
        assert_eq!(a.shuffle_numbers(1, 20), b.shuffle_numbers(1, 20));
        assert_eq!(a.guid(), b.guid());
    }
}

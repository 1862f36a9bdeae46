//! Deterministic program names.
//!
//! Names are keyed by a hash of the full program text, so the same text
//! always yields the same name.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of unique names for program identity constructors.
pub trait NameOracle {
    /// Produce a name for `hash`. Identical inputs must give identical names.
    fn name(&self, hash: u64, length: usize) -> String;
}

impl<N: NameOracle + ?Sized> NameOracle for &N {
    fn name(&self, hash: u64, length: usize) -> String {
        (**self).name(hash, length)
    }
}

/// Syllables combined into pronounceable names.
const SYLLABLES: &[&str] = &[
    "ba", "be", "bo", "da", "de", "di", "do", "fa", "fe", "ga", "go", "ha", "hi", "ka", "ke",
    "ki", "ko", "la", "le", "li", "lo", "lu", "ma", "me", "mi", "mo", "na", "ne", "ni", "no",
    "nu", "pa", "pe", "po", "ra", "re", "ri", "ro", "ru", "sa", "se", "si", "so", "ta", "te",
    "ti", "to", "tu", "va", "ve", "vo", "wa", "we", "ya", "yo", "za", "ze", "zo", "qua", "xe",
];

/// Builds a capitalised name of `length` syllables from an RNG seeded by
/// the hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyllableNamer;

impl SyllableNamer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl NameOracle for SyllableNamer {
    fn name(&self, hash: u64, length: usize) -> String {
        let mut rng = StdRng::seed_from_u64(hash);
        let mut name = String::new();
        for _ in 0..length.max(1) {
            name.push_str(SYLLABLES[rng.gen_range(0..SYLLABLES.len())]);
        }
        capitalise(&name)
    }
}

fn capitalise(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hash of a program text: the first eight bytes of its BLAKE3 digest,
/// little-endian.
#[must_use]
pub fn text_hash(text: &str) -> u64 {
    let digest = blake3::hash(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

//! Placeholder instantiation: rewrites the `string` markers left by the
//! completion engine into quoted, context-appropriate literals.

use rand::Rng;

use crate::naming::{text_hash, NameOracle};
use crate::ReplacementPool;

/// The free-text marker emitted for `string` argument slots.
pub const STRING_MARKER: &str = "string";

/// Syllables requested for program identity names.
pub const IDENTITY_NAME_LENGTH: usize = 4;

/// Constructors whose `string` argument is the program's own name.
const IDENTITY_CONSTRUCTORS: [&str; 3] = ["game", "match", "subgame"];

/// Single left-to-right pass replacing free-text markers.
///
/// # Example
///
/// ```
/// use ludeme_forge::{Instantiator, ReplacementPool, SyllableNamer};
/// use rand::SeedableRng;
///
/// let pool = ReplacementPool::builder().group(&["piece"], &["Disc"]).build();
/// let namer = SyllableNamer::new();
/// let instantiator = Instantiator::new(&pool, &namer);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
///
/// let text = instantiator.instantiate("(equipment { (piece string Each) })", &mut rng);
/// assert_eq!(text, "(equipment { (piece \"Disc\" Each) })");
/// ```
pub struct Instantiator<'a> {
    pool: &'a ReplacementPool,
    namer: &'a dyn NameOracle,
}

impl<'a> Instantiator<'a> {
    pub fn new(pool: &'a ReplacementPool, namer: &'a dyn NameOracle) -> Self {
        Self { pool, namer }
    }

    /// Replace every marker in `text`.
    ///
    /// Text without markers comes back trimmed and otherwise unchanged, so
    /// running the instantiator on its own output is a no-op.
    pub fn instantiate<R: Rng>(&self, text: &str, rng: &mut R) -> String {
        let mut text = text.trim().to_owned();
        let mut pos = 0;

        while let Some(found) = text[pos..].find(STRING_MARKER) {
            let start = pos + found;
            let end = start + STRING_MARKER.len();
            if !is_marker(&text, start, end) {
                pos = end;
                continue;
            }

            let owner = enclosing_name(&text, start).to_owned();
            let value = self.replacement(&text, &owner, rng);
            let quoted = format!("\"{value}\"");
            text.replace_range(start..end, &quoted);
            pos = start + quoted.len();
        }
        text
    }

    fn replacement<R: Rng>(&self, text: &str, owner: &str, rng: &mut R) -> String {
        if IDENTITY_CONSTRUCTORS
            .iter()
            .any(|id| id.eq_ignore_ascii_case(owner))
        {
            return self.namer.name(text_hash(text), IDENTITY_NAME_LENGTH);
        }

        if let Some(values) = self.pool.get(owner) {
            return values[rng.gen_range(0..values.len())].clone();
        }

        let letter = char::from(rng.gen_range(b'A'..=b'Z'));
        format!("{letter}{}", rng.gen_range(0..26))
    }
}

impl std::fmt::Debug for Instantiator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instantiator")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

/// A marker must sit between structural delimiters on both sides.
fn is_marker(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let before = start
        .checked_sub(1)
        .map(|i| bytes[i])
        .is_some_and(|b| matches!(b, b' ' | b':' | b'{'));
    let after = bytes
        .get(end)
        .is_some_and(|b| matches!(b, b' ' | b')' | b'}'));
    before && after
}

/// Head token of the innermost unclosed `(` before `pos`, or the first
/// token of the text when there is none.
fn enclosing_name(text: &str, pos: usize) -> &str {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for i in (0..pos).rev() {
        match bytes[i] {
            b')' => depth += 1,
            b'(' if depth == 0 => return head_token(&text[i + 1..]),
            b'(' => depth -= 1,
            _ => {}
        }
    }
    text.split_whitespace().next().unwrap_or("")
}

fn head_token(rest: &str) -> &str {
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .unwrap_or(rest.len());
    &rest[..end]
}

use std::collections::HashMap;

/// Read-only table mapping ludeme names to the literal strings that may
/// fill a `string` slot inside them.
///
/// Duplicate entries raise the sampling weight of a value. Lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct ReplacementPool {
    entries: HashMap<String, Vec<String>>,
}

/// Builder for a custom [`ReplacementPool`].
#[derive(Debug, Default)]
pub struct ReplacementPoolBuilder {
    entries: HashMap<String, Vec<String>>,
}

impl ReplacementPool {
    #[must_use]
    pub fn builder() -> ReplacementPoolBuilder {
        ReplacementPoolBuilder::default()
    }

    /// The pool used for game generation: player, piece, region, track,
    /// vote, proposal and hint names.
    #[must_use]
    pub fn standard() -> Self {
        Self::builder()
            .group(
                &["player"],
                &["A", "A", "A", "A", "B", "B", "B", "B", "C", "C", "D"],
            )
            .group(
                &[
                    "piece", "hop", "slide", "fromTo", "place", "leap", "step", "shoot",
                    "promotion", "count",
                ],
                &[
                    "Disc", "Disc", "Disc", "Disc", "Disc0", "Disc0", "Disc1", "Disc1", "Disc2",
                    "Disc2", "Disc3", "Disc3", "Disc4", "Disc4", "Disc5", "Disc6", "DiscA",
                    "DiscB", "DiscA1", "DiscB1", "DiscA2", "DiscB2", "Pawn", "Pawn", "Pawn0",
                    "Pawn1", "Pawn2", "Pawn3", "Pawn4", "King", "King0", "King1", "King2",
                    "King3",
                ],
            )
            .group(
                &["regions", "region", "sites"],
                &["Region", "Region0", "Region1", "Region2", "Region3", "Region4"],
            )
            .group(
                &["track"],
                &["Track", "Track0", "Track1", "Track2", "Track3", "Track4"],
            )
            .group(&["vote"], &["Yes", "No", "Maybe"])
            .group(&["propose"], &["Win", "Draw", "Loss", "Tie", "Pass"])
            .group(
                &["hints"],
                &["Hints", "Hints0", "Hints1", "Hints2", "Hints3"],
            )
            .build()
    }

    /// Weighted candidates for a ludeme, if the pool knows it.
    #[must_use]
    pub fn get(&self, ludeme: &str) -> Option<&[String]> {
        self.entries
            .get(&ludeme.to_lowercase())
            .map(Vec::as_slice)
            .filter(|values| !values.is_empty())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReplacementPoolBuilder {
    /// Register the same weighted values for several ludemes.
    ///
    /// Values for a ludeme that is already registered are appended.
    #[must_use]
    pub fn group(mut self, ludemes: &[&str], values: &[&str]) -> Self {
        for ludeme in ludemes {
            self.entries
                .entry(ludeme.to_lowercase())
                .or_default()
                .extend(values.iter().map(|v| (*v).to_owned()));
        }
        self
    }

    #[must_use]
    pub fn build(self) -> ReplacementPool {
        ReplacementPool {
            entries: self.entries,
        }
    }
}

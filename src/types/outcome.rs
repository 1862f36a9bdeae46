use std::fmt;

/// Result of one generation attempt.
///
/// `Failed` is an ordinary value, not an error: the attempt produced no
/// usable text and must be discarded as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum GenerationOutcome {
    Complete(String),
    Failed,
}

impl GenerationOutcome {
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationOutcome::Complete(text) => Some(text),
            GenerationOutcome::Failed => None,
        }
    }

    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            GenerationOutcome::Complete(text) => Some(text),
            GenerationOutcome::Failed => None,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, GenerationOutcome::Complete(_))
    }
}

impl From<Option<String>> for GenerationOutcome {
    fn from(text: Option<String>) -> Self {
        text.map_or(GenerationOutcome::Failed, GenerationOutcome::Complete)
    }
}

/// Classification of one pipeline iteration, in funnel order.
///
/// Each variant names the first gate the candidate failed, or `Accepted`
/// when it passed them all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidationOutcome {
    GenerationFailed,
    StructurallyRejected,
    Unparsable,
    Uncompilable,
    NonFunctional,
    Unplayable,
    Accepted,
}

impl ValidationOutcome {
    /// Every outcome in funnel order.
    pub const ALL: [ValidationOutcome; 7] = [
        ValidationOutcome::GenerationFailed,
        ValidationOutcome::StructurallyRejected,
        ValidationOutcome::Unparsable,
        ValidationOutcome::Uncompilable,
        ValidationOutcome::NonFunctional,
        ValidationOutcome::Unplayable,
        ValidationOutcome::Accepted,
    ];

    /// Persistence bucket for texts with this outcome.
    ///
    /// `None` for generation failures, which have no text.
    #[must_use]
    pub fn bucket(self) -> Option<&'static str> {
        match self {
            ValidationOutcome::GenerationFailed => None,
            ValidationOutcome::StructurallyRejected => Some("structurally-rejected"),
            ValidationOutcome::Unparsable => Some("unparsable"),
            ValidationOutcome::Uncompilable => Some("uncompilable"),
            ValidationOutcome::NonFunctional => Some("nonfunctional"),
            ValidationOutcome::Unplayable => Some("unplayable"),
            ValidationOutcome::Accepted => Some("accepted"),
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationOutcome::GenerationFailed => "generation failed",
            ValidationOutcome::StructurallyRejected => "structurally rejected",
            ValidationOutcome::Unparsable => "unparsable",
            ValidationOutcome::Uncompilable => "uncompilable",
            ValidationOutcome::NonFunctional => "non-functional",
            ValidationOutcome::Unplayable => "unplayable",
            ValidationOutcome::Accepted => "accepted",
        };
        f.write_str(label)
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("duplicate rule name '{name}'")]
    DuplicateRule { name: String },

    #[error("rule '{rule}' has no clauses")]
    NoClauses { rule: String },

    #[error("rule with an empty name")]
    EmptyName,

    #[error("constructor with an empty head in rule '{rule}'")]
    EmptyHead { rule: String },
}

/// Configuration errors reported to the caller of
/// [`Generator::generate()`](crate::Generator::generate).
///
/// Depth exhaustion and unresolved references inside the grammar are not
/// errors; they surface as [`GenerationOutcome::Failed`](crate::GenerationOutcome::Failed).
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("start symbol '{symbol}' matches no grammar rule")]
    UnknownSymbol { symbol: String },
}

/// A [`RandomPolicyConfig`](crate::RandomPolicyConfig) that would make
/// the policy panic on its first draw.
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be a probability in 0..=1, got {value}")]
    Probability { field: &'static str, value: f64 },

    #[error("item count range {min}..={max} is empty")]
    ItemCount { min: usize, max: usize },
}

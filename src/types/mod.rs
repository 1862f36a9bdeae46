mod clause;
mod error;
mod grammar;
mod outcome;
mod replacement;
mod report;

pub(crate) use clause::strip_delimiters;
pub use clause::{Clause, ClauseArg, GrammarRule, TerminalCategory};
pub use error::{GenerateError, GrammarError, PolicyError};
pub use grammar::{ConstructorBuilder, Grammar, GrammarBuilder, RuleBuilder};
pub use outcome::{GenerationOutcome, ValidationOutcome};
pub use replacement::{ReplacementPool, ReplacementPoolBuilder};
pub use report::{Gate, PipelineReport};

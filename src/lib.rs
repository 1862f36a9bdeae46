//! Grammar-driven random generation of ludeme game descriptions.
//!
//! A [`Grammar`] is built with [`GrammarBuilder`] or loaded from an EBNF
//! listing. A [`Generator`] completes a start symbol into candidate text,
//! steered by a [`DecisionPolicy`]. The [`Instantiator`] fills the `string`
//! placeholders, and a [`Pipeline`] classifies candidates with an external
//! [`GameEngine`].
//!
//! ```
//! use ludeme_forge::{GenerationOutcome, Generator, GrammarBuilder, RandomPolicy};
//!
//! let grammar = GrammarBuilder::new()
//!     .rule("<game>", |r| r.constructor("game", |c| c.arg("string").arg("<end>")))
//!     .rule("<end>", |r| r.constructor("end", |c| c.arg("<result>")))
//!     .rule("<result>", |r| r.terminal("Win").terminal("Draw"))
//!     .build()
//!     .unwrap();
//!
//! let mut generator = Generator::new(&grammar, RandomPolicy::new(7));
//! let outcome = generator.generate("game", 42).unwrap();
//! assert!(matches!(outcome, GenerationOutcome::Complete(ref t) if t.starts_with("(game string (end ")));
//! ```

mod audit;
mod build;
mod error;
pub mod generate;
mod index;
pub mod instantiate;
pub mod naming;
pub mod oracle;
pub mod parse;
pub mod pipeline;
pub mod policy;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;

pub use audit::GrammarAudit;
pub use error::ForgeError;
pub use generate::{Generator, ARG_DEPTH_LIMIT, MAX_DEPTH, WEAK_MARKER};
pub use instantiate::Instantiator;
pub use naming::{text_hash, NameOracle, SyllableNamer};
pub use oracle::{
    program_name, CompiledGame, DirectorySink, EngineError, GameEngine, NullSink, ParseReport,
    Sink, Trial, TrialMove,
};
pub use pipeline::{Pipeline, PipelineOptions, Restriction, RestrictionSet};
pub use policy::{DecisionPolicy, FixedPolicy, RandomPolicy, RandomPolicyConfig};
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    Clause, ClauseArg, ConstructorBuilder, Gate, GenerateError, GenerationOutcome, Grammar,
    GrammarBuilder, GrammarError, GrammarRule, PipelineReport, PolicyError, ReplacementPool,
    ReplacementPoolBuilder, RuleBuilder, TerminalCategory, ValidationOutcome,
};

use std::collections::HashMap;
use std::fmt;

use super::clause::{Clause, ClauseArg, GrammarRule};
use super::error::GrammarError;

/// Builder for constructing a [`Grammar`].
///
/// Rules are defined via closures and validated into an immutable grammar
/// that the completion engine borrows for its whole lifetime.
///
/// # Example
///
/// ```
/// use ludeme_forge::GrammarBuilder;
///
/// let grammar = GrammarBuilder::new()
///     .rule("<game>", |r| {
///         r.constructor("game", |c| c.arg("string").arg("<players>").optional("<end>"))
///     })
///     .rule("<players>", |r| r.constructor("players", |c| c.arg("<int>")))
///     .rule("<int>", |r| r.terminal("2"))
///     .rule("<end>", |r| r.constructor("end", |c| c.arg("<result>")))
///     .rule("<result>", |r| r.terminal("Win").terminal("Draw"))
///     .build()
///     .unwrap();
///
/// assert_eq!(grammar.len(), 5);
/// ```
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<GrammarRule>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug)]
pub struct RuleBuilder {
    clauses: Vec<Clause>,
}

/// Intermediate builder passed to the constructor definition closure.
#[derive(Debug)]
pub struct ConstructorBuilder {
    args: Vec<ClauseArg>,
    next_group: u32,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a rule. The closure adds the rule's alternatives in order.
    ///
    /// A rule without alternatives fails [`build()`](Self::build) with
    /// [`GrammarError::NoClauses`].
    #[must_use]
    pub fn rule(mut self, name: &str, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder {
            clauses: Vec::new(),
        });
        self.rules.push(GrammarRule {
            name: name.to_owned(),
            clauses: builder.clauses,
        });
        self
    }

    /// Add an already assembled rule.
    #[must_use]
    pub fn push(mut self, rule: GrammarRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validate the rules into an immutable `Grammar`.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError`] if validation fails.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        crate::build::build(self.rules)
    }
}

impl RuleBuilder {
    /// Add a literal alternative.
    #[must_use]
    pub fn terminal(mut self, text: &str) -> Self {
        self.clauses.push(Clause::Terminal(text.to_owned()));
        self
    }

    /// Add an alternative that expands another rule.
    #[must_use]
    pub fn reference(mut self, target: &str) -> Self {
        self.clauses.push(Clause::RuleRef(target.to_owned()));
        self
    }

    /// Add a constructor alternative `(head ...)`.
    #[must_use]
    pub fn constructor(
        mut self,
        head: &str,
        f: impl FnOnce(ConstructorBuilder) -> ConstructorBuilder,
    ) -> Self {
        let builder = f(ConstructorBuilder {
            args: Vec::new(),
            next_group: 1,
        });
        self.clauses.push(Clause::Constructor {
            head: head.to_owned(),
            args: builder.args,
        });
        self
    }
}

impl ConstructorBuilder {
    /// Required scalar argument.
    #[must_use]
    pub fn arg(self, token: &str) -> Self {
        self.with(ClauseArg::new(token))
    }

    /// Optional scalar argument.
    #[must_use]
    pub fn optional(self, token: &str) -> Self {
        self.with(ClauseArg::new(token).optional())
    }

    /// Required argument emitted as `label:value`.
    #[must_use]
    pub fn labelled(self, label: &str, token: &str) -> Self {
        self.with(ClauseArg::new(token).label(label))
    }

    /// Required collection argument with the given nesting level.
    #[must_use]
    pub fn nested(self, token: &str, nesting: u8) -> Self {
        self.with(ClauseArg::new(token).nesting(nesting))
    }

    /// Mutually exclusive alternatives sharing a fresh or-group id.
    #[must_use]
    pub fn or_group(mut self, alternatives: impl IntoIterator<Item = ClauseArg>) -> Self {
        let group = self.next_group;
        self.next_group += 1;
        self.args
            .extend(alternatives.into_iter().map(|a| a.or_group(group)));
        self
    }

    /// Add a fully specified argument as-is.
    #[must_use]
    pub fn with(mut self, arg: ClauseArg) -> Self {
        if arg.or_group >= self.next_group {
            self.next_group = arg.or_group + 1;
        }
        self.args.push(arg);
        self
    }
}

/// An immutable grammar: ordered rules plus an index by left-hand symbol.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) rules: Vec<GrammarRule>,
    pub(crate) by_name: HashMap<String, usize>,
}

impl Grammar {
    /// Resolve a symbolic name to the rules it denotes.
    ///
    /// Never fails: unknown names yield an empty list and ambiguous names
    /// yield several rules. The caller decides what a non-singleton
    /// result means.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Vec<&GrammarRule> {
        crate::index::resolve(&self.rules, &self.by_name, name)
    }

    /// Look up a rule by its exact left-hand symbol.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&GrammarRule> {
        self.by_name.get(name).map(|&idx| &self.rules[idx])
    }

    /// All rules in definition order.
    #[must_use]
    pub fn rules(&self) -> &[GrammarRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of alternatives across all rules.
    #[must_use]
    pub fn clause_count(&self) -> usize {
        self.rules.iter().map(|r| r.clauses.len()).sum()
    }

    /// Load a grammar listing.
    ///
    /// This is a convenience method combining [`parse`](crate::parse::parse)
    /// and [`GrammarBuilder::build()`].
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`](crate::ForgeError) on parse or validation failure.
    pub fn from_ebnf(input: &str) -> Result<Self, crate::ForgeError> {
        let parsed = crate::parse::parse(input)?;
        let grammar = crate::build::build(parsed.rules)?;
        Ok(grammar)
    }

    /// Read a grammar listing from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError`](crate::ForgeError) on I/O, parse, or validation failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::ForgeError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_ebnf(&input)
    }
}

#[cfg(feature = "binary-cache")]
impl Grammar {
    /// Snapshot the validated rules.
    ///
    /// Pass the listing as `source_text` to record its digest; compare it
    /// with [`snapshot_source_digest`](Self::snapshot_source_digest) to
    /// detect a stale snapshot.
    ///
    /// # Errors
    ///
    /// Fails only if bincode cannot encode the rules.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Restore a grammar from a [`to_bytes`](Self::to_bytes) snapshot.
    ///
    /// # Errors
    ///
    /// Refuses blobs whose header or checksum does not match, and rules
    /// that no longer pass the builder checks.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// [`to_bytes`](Self::to_bytes), written to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::Io`](crate::serial::SerializeError::Io)
    /// when the file cannot be written, otherwise as
    /// [`to_bytes`](Self::to_bytes).
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// [`from_bytes`](Self::from_bytes) on the contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError::Io`](crate::serial::DeserializeError::Io)
    /// when the file cannot be read, otherwise as
    /// [`from_bytes`](Self::from_bytes).
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// BLAKE3 digest of the source text recorded in a snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) when
    /// the snapshot cannot be read.
    pub fn snapshot_source_digest(
        bytes: &[u8],
    ) -> Result<Option<[u8; 32]>, crate::serial::DeserializeError> {
        crate::serial::source_digest(bytes)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Grammar({} rules, {} clauses)",
            self.rules.len(),
            self.clause_count(),
        )
    }
}

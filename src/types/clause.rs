use std::fmt;

/// Built-in leaf categories whose argument slots are emitted verbatim as
/// placeholder markers instead of being expanded through the grammar.
///
/// Only the `string` marker is later rewritten (see
/// [`Instantiator`](crate::Instantiator)); numeric and boolean *rules* are
/// synthesised directly by the completion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalCategory {
    String,
    Int,
    Boolean,
    Float,
}

impl TerminalCategory {
    /// Recognise an argument token as a terminal category.
    ///
    /// Only the bare form (`int`) counts. A delimited `<int>` names a rule
    /// and is expanded through the grammar.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "boolean" => Some(Self::Boolean),
            "float" => Some(Self::Float),
            _ => None,
        }
    }

    /// The placeholder text emitted for this category.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::Float => "float",
        }
    }
}

impl fmt::Display for TerminalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// One argument slot of a [`Clause::Constructor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseArg {
    /// Symbol name (`<players>`) or terminal category (`string`, `int`, ...).
    pub token: String,
    /// Explicit label emitted as `label:` before the value.
    pub label: Option<String>,
    pub optional: bool,
    /// 0 = scalar, 1 = collection, 2 = collection of collections.
    /// Deeper nesting is accepted but never emitted.
    pub nesting: u8,
    /// 0 = independent; ids > 0 mark mutually exclusive alternatives.
    pub or_group: u32,
}

impl ClauseArg {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            label: None,
            optional: false,
            nesting: 0,
            or_group: 0,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn nesting(mut self, nesting: u8) -> Self {
        self.nesting = nesting;
        self
    }

    #[must_use]
    pub fn or_group(mut self, group: u32) -> Self {
        self.or_group = group;
        self
    }

    /// The terminal category this argument denotes, if any.
    #[must_use]
    pub fn terminal_category(&self) -> Option<TerminalCategory> {
        TerminalCategory::from_token(&self.token)
    }
}

impl fmt::Display for ClauseArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            f.write_str("[")?;
        }
        if let Some(label) = &self.label {
            write!(f, "{label}:")?;
        }
        for _ in 0..self.nesting {
            f.write_str("{")?;
        }
        f.write_str(&self.token)?;
        for _ in 0..self.nesting {
            f.write_str("}")?;
        }
        if self.optional {
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// One production alternative of a [`GrammarRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Literal text, emitted as-is.
    Terminal(String),
    /// Reference to another rule, expanded by recursion.
    RuleRef(String),
    /// Parenthesised keyworded expression with argument slots.
    Constructor { head: String, args: Vec<ClauseArg> },
}

impl Clause {
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(self, Clause::Constructor { .. })
    }

    /// Arguments of a constructor clause; empty for the other variants.
    #[must_use]
    pub fn args(&self) -> &[ClauseArg] {
        match self {
            Clause::Constructor { args, .. } => args,
            Clause::Terminal(_) | Clause::RuleRef(_) => &[],
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Terminal(text) | Clause::RuleRef(text) => f.write_str(text),
            Clause::Constructor { head, args } => {
                write!(f, "({head}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                    if arg.or_group > 0 {
                        write!(f, "#{}", arg.or_group)?;
                    }
                }
                f.write_str(")")
            }
        }
    }
}

/// A named production with its ordered alternatives.
///
/// Rules are created via [`GrammarBuilder`](super::GrammarBuilder) or by
/// loading a grammar listing with [`Grammar::from_ebnf()`](super::Grammar::from_ebnf).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarRule {
    /// Left-hand symbol, usually wrapped in `<...>`.
    pub name: String,
    pub clauses: Vec<Clause>,
}

impl GrammarRule {
    /// The left-hand symbol without its `<...>` delimiters.
    #[must_use]
    pub fn bare_name(&self) -> &str {
        strip_delimiters(&self.name)
    }
}

impl fmt::Display for GrammarRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ::=", self.name)?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" |")?;
            }
            write!(f, " {clause}")?;
        }
        Ok(())
    }
}

/// Remove one leading `<` and one trailing `>` if present.
pub(crate) fn strip_delimiters(name: &str) -> &str {
    let name = name.strip_prefix('<').unwrap_or(name);
    name.strip_suffix('>').unwrap_or(name)
}

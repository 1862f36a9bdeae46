//! The completion engine: turns a grammar rule into finished expression text.
//!
//! Every sub-expression is built into its own `String` and merged into the
//! parent only on success, so a failure anywhere below discards the whole
//! candidate without leaving partial text behind.

use std::collections::BTreeMap;

use tracing::debug;

use crate::policy::DecisionPolicy;
use crate::{
    Clause, ClauseArg, GenerateError, GenerationOutcome, Grammar, GrammarRule, TerminalCategory,
};

/// Maximum rule-level recursion depth.
pub const MAX_DEPTH: usize = 100;

/// Safety bound for argument-level recursion. Deliberately distinct from
/// [`MAX_DEPTH`].
pub const ARG_DEPTH_LIMIT: usize = 1000;

/// Marker embedded in the output for an argument whose symbol resolves to
/// zero or several rules. Unlike a rule-level failure it does not abort the
/// candidate; downstream oracles reject the text.
pub const WEAK_MARKER: &str = "?";

/// Unproductive or-group answers tolerated before the engine settles the
/// group itself.
pub const MAX_OR_GROUP_DRAWS: usize = 1000;

const INT_RANGE: (i32, i32) = (-10, 1000);
const DIM_RANGE: (i32, i32) = (0, 20);
const FLOAT_RANGE: (f32, f32) = (-10.0, 1000.0);

/// A partial result: `None` is the strong failure sentinel.
type Completion = Option<String>;

/// Rule names the engine may cut short with a synthesised literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primitive {
    Int,
    Boolean,
    Float,
    Dim,
}

impl Primitive {
    fn of(rule: &GrammarRule) -> Option<Self> {
        match rule.name.as_str() {
            "<int>" => Some(Self::Int),
            "<boolean>" => Some(Self::Boolean),
            "<float>" => Some(Self::Float),
            "<dim>" => Some(Self::Dim),
            _ => None,
        }
    }
}

/// Recursive generator over a borrowed [`Grammar`].
///
/// # Example
///
/// ```
/// use ludeme_forge::{FixedPolicy, GenerationOutcome, Generator, GrammarBuilder};
///
/// let grammar = GrammarBuilder::new()
///     .rule("<result>", |r| r.terminal("Win"))
///     .build()
///     .unwrap();
/// let mut generator = Generator::new(&grammar, FixedPolicy::new());
///
/// let outcome = generator.generate("result", 0).unwrap();
/// assert_eq!(outcome, GenerationOutcome::Complete("Win".into()));
/// ```
#[derive(Debug)]
pub struct Generator<'g, P> {
    grammar: &'g Grammar,
    policy: P,
}

impl<'g, P: DecisionPolicy> Generator<'g, P> {
    pub fn new(grammar: &'g Grammar, policy: P) -> Self {
        Self { grammar, policy }
    }

    #[must_use]
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    /// Complete the rule named `symbol` into a candidate text.
    ///
    /// The policy is reseeded with `seed` first, so a seeded policy yields
    /// the same text for the same seed.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnknownSymbol`] when `symbol` resolves to
    /// no rule. Every other problem is reported as
    /// [`GenerationOutcome::Failed`].
    pub fn generate(&mut self, symbol: &str, seed: u64) -> Result<GenerationOutcome, GenerateError> {
        let rules = self.grammar.resolve(symbol);
        if rules.is_empty() {
            return Err(GenerateError::UnknownSymbol {
                symbol: symbol.to_owned(),
            });
        }

        self.policy.reseed(seed);
        let rule = if rules.len() == 1 {
            rules[0]
        } else {
            self.policy.choose_rule(&rules)
        };

        let outcome = GenerationOutcome::from(self.complete(rule, 0));
        if !outcome.is_complete() {
            debug!(symbol, seed, "generation attempt failed");
        }
        Ok(outcome)
    }

    /// Complete a specific rule at the given depth.
    pub fn complete_rule(&mut self, rule: &GrammarRule, depth: usize) -> GenerationOutcome {
        GenerationOutcome::from(self.complete(rule, depth))
    }

    fn complete(&mut self, rule: &GrammarRule, depth: usize) -> Completion {
        if depth > MAX_DEPTH {
            debug!(rule = %rule.name, depth, "maximum depth exceeded in rule completion");
            return None;
        }

        if let Some(primitive) = Primitive::of(rule) {
            if self.policy.choose_exit_with_primitive() {
                return Some(self.primitive_literal(primitive));
            }
        }

        if rule.clauses.is_empty() {
            debug!(rule = %rule.name, "rule has no clauses");
            return None;
        }

        let grammar = self.grammar;
        let clause = self.policy.choose_clause(&rule.clauses);
        match clause {
            Clause::Terminal(text) => Some(text.clone()),
            Clause::RuleRef(target) => {
                let targets = grammar.resolve(target);
                if targets.len() != 1 {
                    debug!(
                        reference = %target,
                        matches = targets.len(),
                        "rule reference does not resolve to exactly one rule"
                    );
                    return None;
                }
                if depth + 1 >= MAX_DEPTH {
                    return None;
                }
                self.complete(targets[0], depth + 1)
            }
            Clause::Constructor { head, args } => self.handle_constructor(head, args, depth),
        }
    }

    fn primitive_literal(&mut self, primitive: Primitive) -> String {
        match primitive {
            Primitive::Int => self
                .policy
                .choose_primitive_integer(INT_RANGE.0, INT_RANGE.1)
                .to_string(),
            Primitive::Dim => self
                .policy
                .choose_primitive_integer(DIM_RANGE.0, DIM_RANGE.1)
                .to_string(),
            Primitive::Boolean => self.policy.choose_primitive_boolean().to_string(),
            // Debug formatting keeps the decimal point on whole numbers.
            Primitive::Float => format!(
                "{:?}",
                self.policy
                    .choose_primitive_float(FLOAT_RANGE.0, FLOAT_RANGE.1)
            ),
        }
    }

    fn handle_constructor(&mut self, head: &str, args: &[ClauseArg], depth: usize) -> Completion {
        if depth > MAX_DEPTH {
            debug!(head, depth, "maximum depth exceeded in constructor");
            return None;
        }

        let used = self.select_args(args, depth);

        let mut out = format!("({head}");
        for (arg, _) in args.iter().zip(&used).filter(|(_, keep)| **keep) {
            if arg.nesting > 2 {
                continue;
            }

            out.push(' ');
            if let Some(label) = &arg.label {
                out.push_str(label);
                out.push(':');
            }

            match arg.nesting {
                0 => out.push_str(&self.handle_arg(arg, depth)?),
                1 => {
                    out.push('{');
                    let count = self.policy.choose_item_count();
                    for _ in 0..count {
                        out.push(' ');
                        out.push_str(&self.handle_arg(arg, depth)?);
                    }
                    out.push_str(" }");
                }
                _ => {
                    out.push('{');
                    let outer = self.policy.choose_item_count();
                    for _ in 0..outer {
                        out.push_str(" {");
                        let inner = self.policy.choose_item_count();
                        for _ in 0..inner {
                            out.push(' ');
                            out.push_str(&self.handle_arg(arg, depth)?);
                        }
                        out.push_str(" }");
                    }
                    out.push_str(" }");
                }
            }
        }
        out.push(')');
        Some(out)
    }

    /// Decide which arguments of a constructor are emitted.
    fn select_args(&mut self, args: &[ClauseArg], depth: usize) -> Vec<bool> {
        let mut used = vec![true; args.len()];

        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, arg) in args.iter().enumerate() {
            if arg.or_group > 0 {
                groups.entry(arg.or_group).or_default().push(idx);
            }
        }
        for members in groups.values() {
            self.resolve_or_group(members, args.len(), &mut used);
        }

        for (idx, arg) in args.iter().enumerate() {
            if arg.or_group == 0 && arg.optional && self.policy.choose_drop_argument(depth) {
                used[idx] = false;
            }
        }
        used
    }

    /// Drop members of one or-group until at most one survives.
    fn resolve_or_group(&mut self, members: &[usize], arg_count: usize, used: &mut [bool]) {
        let mut survivors = members.len();
        let mut draws = 0;
        while survivors > 1 {
            if draws == MAX_OR_GROUP_DRAWS {
                debug!(draws, "or-group unresolved by policy, keeping earliest member");
                let extra: Vec<usize> =
                    members.iter().copied().filter(|&i| used[i]).skip(1).collect();
                for idx in extra {
                    used[idx] = false;
                }
                return;
            }
            draws += 1;

            let idx = self.policy.choose_or_group(arg_count) % arg_count;
            if used[idx] && members.contains(&idx) {
                used[idx] = false;
                survivors -= 1;
            }
        }
    }

    fn handle_arg(&mut self, arg: &ClauseArg, depth: usize) -> Completion {
        if depth > MAX_DEPTH {
            debug!(token = %arg.token, depth, "maximum depth exceeded in argument");
            return None;
        }

        if let Some(category) = TerminalCategory::from_token(&arg.token) {
            return Some(category.marker().to_owned());
        }

        let targets = self.grammar.resolve(&arg.token);
        if targets.len() != 1 {
            debug!(
                token = %arg.token,
                matches = targets.len(),
                "argument does not resolve to exactly one rule"
            );
            return Some(WEAK_MARKER.to_owned());
        }

        if depth + 1 >= ARG_DEPTH_LIMIT {
            debug!(token = %arg.token, depth, "argument depth limit exceeded");
            return None;
        }
        self.complete(targets[0], depth + 1)
    }
}

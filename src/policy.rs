//! Decision policies: the only source of choice in the completion engine.
//!
//! Every branching point of a traversal (which rule, which clause, whether
//! to stop at a primitive, which alternatives to drop, how many items to
//! emit) is delegated to a [`DecisionPolicy`]. The engine never touches a
//! random number generator itself, so seeded, weighted, scripted or
//! interactive policies can be swapped in without changing the traversal.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Clause, GrammarRule, PolicyError};

/// Contract for every nondeterministic decision the engine makes.
///
/// Slice arguments are never empty.
pub trait DecisionPolicy {
    /// Pick one of several rules matching the same name.
    fn choose_rule<'g>(&mut self, candidates: &[&'g GrammarRule]) -> &'g GrammarRule;

    /// Pick the alternative to expand.
    fn choose_clause<'g>(&mut self, clauses: &'g [Clause]) -> &'g Clause;

    /// Whether a primitive rule (`<int>`, `<boolean>`, `<float>`, `<dim>`)
    /// should be cut short with a synthesised literal.
    fn choose_exit_with_primitive(&mut self) -> bool;

    /// An integer in `min..=max`.
    fn choose_primitive_integer(&mut self, min: i32, max: i32) -> i32;

    fn choose_primitive_boolean(&mut self) -> bool;

    /// A float in `min..max`.
    fn choose_primitive_float(&mut self, min: f32, max: f32) -> f32;

    /// Index of an argument to drop from an or-group with more than one
    /// surviving member. `arg_count` is the constructor's argument count.
    fn choose_or_group(&mut self, arg_count: usize) -> usize;

    /// Whether to drop an optional independent argument at this depth.
    fn choose_drop_argument(&mut self, depth: usize) -> bool;

    /// Number of items in a collection argument.
    fn choose_item_count(&mut self) -> usize;

    /// Restart the policy's randomness from `seed`. No-op by default.
    fn reseed(&mut self, _seed: u64) {}
}

impl<P: DecisionPolicy + ?Sized> DecisionPolicy for &mut P {
    fn choose_rule<'g>(&mut self, candidates: &[&'g GrammarRule]) -> &'g GrammarRule {
        (**self).choose_rule(candidates)
    }

    fn choose_clause<'g>(&mut self, clauses: &'g [Clause]) -> &'g Clause {
        (**self).choose_clause(clauses)
    }

    fn choose_exit_with_primitive(&mut self) -> bool {
        (**self).choose_exit_with_primitive()
    }

    fn choose_primitive_integer(&mut self, min: i32, max: i32) -> i32 {
        (**self).choose_primitive_integer(min, max)
    }

    fn choose_primitive_boolean(&mut self) -> bool {
        (**self).choose_primitive_boolean()
    }

    fn choose_primitive_float(&mut self, min: f32, max: f32) -> f32 {
        (**self).choose_primitive_float(min, max)
    }

    fn choose_or_group(&mut self, arg_count: usize) -> usize {
        (**self).choose_or_group(arg_count)
    }

    fn choose_drop_argument(&mut self, depth: usize) -> bool {
        (**self).choose_drop_argument(depth)
    }

    fn choose_item_count(&mut self) -> usize {
        (**self).choose_item_count()
    }

    fn reseed(&mut self, seed: u64) {
        (**self).reseed(seed);
    }
}

impl<P: DecisionPolicy + ?Sized> DecisionPolicy for Box<P> {
    fn choose_rule<'g>(&mut self, candidates: &[&'g GrammarRule]) -> &'g GrammarRule {
        (**self).choose_rule(candidates)
    }

    fn choose_clause<'g>(&mut self, clauses: &'g [Clause]) -> &'g Clause {
        (**self).choose_clause(clauses)
    }

    fn choose_exit_with_primitive(&mut self) -> bool {
        (**self).choose_exit_with_primitive()
    }

    fn choose_primitive_integer(&mut self, min: i32, max: i32) -> i32 {
        (**self).choose_primitive_integer(min, max)
    }

    fn choose_primitive_boolean(&mut self) -> bool {
        (**self).choose_primitive_boolean()
    }

    fn choose_primitive_float(&mut self, min: f32, max: f32) -> f32 {
        (**self).choose_primitive_float(min, max)
    }

    fn choose_or_group(&mut self, arg_count: usize) -> usize {
        (**self).choose_or_group(arg_count)
    }

    fn choose_drop_argument(&mut self, depth: usize) -> bool {
        (**self).choose_drop_argument(depth)
    }

    fn choose_item_count(&mut self) -> usize {
        (**self).choose_item_count()
    }

    fn reseed(&mut self, seed: u64) {
        (**self).reseed(seed);
    }
}

// ---------------------------------------------------------------------------
// RandomPolicy
// ---------------------------------------------------------------------------

/// Tuning knobs for [`RandomPolicy`].
#[derive(Debug, Clone, PartialEq)]
pub struct RandomPolicyConfig {
    /// Probability of cutting a primitive rule short.
    pub exit_with_primitive: f64,
    /// Drop probability for optional arguments at depth 0.
    pub drop_base: f64,
    /// Added drop probability per level of depth.
    pub drop_per_depth: f64,
    /// Upper bound for the drop probability.
    pub drop_max: f64,
    /// Inclusive bounds for collection item counts.
    pub item_count: (usize, usize),
}

impl Default for RandomPolicyConfig {
    fn default() -> Self {
        Self {
            exit_with_primitive: 0.5,
            drop_base: 0.3,
            drop_per_depth: 0.05,
            drop_max: 0.95,
            item_count: (1, 3),
        }
    }
}

impl RandomPolicyConfig {
    #[must_use]
    pub fn exit_with_primitive(mut self, probability: f64) -> Self {
        self.exit_with_primitive = probability;
        self
    }

    #[must_use]
    pub fn drop_probability(mut self, base: f64, per_depth: f64, max: f64) -> Self {
        self.drop_base = base;
        self.drop_per_depth = per_depth;
        self.drop_max = max;
        self
    }

    #[must_use]
    pub fn item_count(mut self, min: usize, max: usize) -> Self {
        self.item_count = (min, max.max(min));
        self
    }

    /// Check that every probability lies in `0..=1` and the item count
    /// range is not empty.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyError`] found.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let probabilities = [
            ("exit_with_primitive", self.exit_with_primitive),
            ("drop_base", self.drop_base),
            ("drop_per_depth", self.drop_per_depth),
            ("drop_max", self.drop_max),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError::Probability { field, value });
            }
        }

        let (min, max) = self.item_count;
        if min > max {
            return Err(PolicyError::ItemCount { min, max });
        }
        Ok(())
    }

    /// Drop probability at `depth`, clamped to `0.0..=drop_max`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn drop_probability_at(&self, depth: usize) -> f64 {
        let p = self.drop_base + self.drop_per_depth * depth as f64;
        p.clamp(0.0, self.drop_max.clamp(0.0, 1.0))
    }
}

/// Uniform random decisions from a seeded [`StdRng`], with optional
/// arguments dropped more often the deeper the expression.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
    config: RandomPolicyConfig,
}

impl RandomPolicy {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config: RandomPolicyConfig::default(),
        }
    }

    /// A policy with custom tuning.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when `config` fails
    /// [`RandomPolicyConfig::validate`].
    pub fn with_config(seed: u64, config: RandomPolicyConfig) -> Result<Self, PolicyError> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RandomPolicyConfig {
        &self.config
    }
}

impl DecisionPolicy for RandomPolicy {
    fn choose_rule<'g>(&mut self, candidates: &[&'g GrammarRule]) -> &'g GrammarRule {
        candidates[self.rng.gen_range(0..candidates.len())]
    }

    fn choose_clause<'g>(&mut self, clauses: &'g [Clause]) -> &'g Clause {
        &clauses[self.rng.gen_range(0..clauses.len())]
    }

    fn choose_exit_with_primitive(&mut self) -> bool {
        self.rng.gen_bool(self.config.exit_with_primitive)
    }

    fn choose_primitive_integer(&mut self, min: i32, max: i32) -> i32 {
        self.rng.gen_range(min..=max.max(min))
    }

    fn choose_primitive_boolean(&mut self) -> bool {
        self.rng.gen()
    }

    fn choose_primitive_float(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    fn choose_or_group(&mut self, arg_count: usize) -> usize {
        self.rng.gen_range(0..arg_count.max(1))
    }

    fn choose_drop_argument(&mut self, depth: usize) -> bool {
        let p = self.config.drop_probability_at(depth);
        self.rng.gen_bool(p)
    }

    fn choose_item_count(&mut self) -> usize {
        let (min, max) = self.config.item_count;
        self.rng.gen_range(min..=max)
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

// ---------------------------------------------------------------------------
// FixedPolicy
// ---------------------------------------------------------------------------

/// Deterministic decisions: first rule, first clause, keep every argument,
/// a constant item count and the lower bound of every primitive range.
///
/// Useful for reproducing a single expansion path and in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPolicy {
    pub clause_index: usize,
    pub exit_with_primitive: bool,
    pub drop_optional: bool,
    pub item_count: usize,
}

impl Default for FixedPolicy {
    fn default() -> Self {
        Self {
            clause_index: 0,
            exit_with_primitive: false,
            drop_optional: false,
            item_count: 1,
        }
    }
}

impl FixedPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always pick the clause at `index` (clamped to the last clause).
    #[must_use]
    pub fn clause(mut self, index: usize) -> Self {
        self.clause_index = index;
        self
    }

    #[must_use]
    pub fn exit_with_primitive(mut self, exit: bool) -> Self {
        self.exit_with_primitive = exit;
        self
    }

    #[must_use]
    pub fn drop_optional(mut self, drop: bool) -> Self {
        self.drop_optional = drop;
        self
    }

    #[must_use]
    pub fn item_count(mut self, count: usize) -> Self {
        self.item_count = count;
        self
    }
}

impl DecisionPolicy for FixedPolicy {
    fn choose_rule<'g>(&mut self, candidates: &[&'g GrammarRule]) -> &'g GrammarRule {
        candidates[0]
    }

    fn choose_clause<'g>(&mut self, clauses: &'g [Clause]) -> &'g Clause {
        &clauses[self.clause_index.min(clauses.len() - 1)]
    }

    fn choose_exit_with_primitive(&mut self) -> bool {
        self.exit_with_primitive
    }

    fn choose_primitive_integer(&mut self, min: i32, _max: i32) -> i32 {
        min
    }

    fn choose_primitive_boolean(&mut self) -> bool {
        true
    }

    fn choose_primitive_float(&mut self, min: f32, _max: f32) -> f32 {
        min
    }

    /// Drops the last argument first, so the earliest alternative survives.
    fn choose_or_group(&mut self, arg_count: usize) -> usize {
        arg_count.saturating_sub(1)
    }

    fn choose_drop_argument(&mut self, _depth: usize) -> bool {
        self.drop_optional
    }

    fn choose_item_count(&mut self) -> usize {
        self.item_count
    }
}

//! Generate-and-validate funnel.
//!
//! Each attempt generates a candidate, fills its placeholders and pushes it
//! through cheap text checks before the expensive engine oracles. Every
//! attempt ends in exactly one [`ValidationOutcome`].

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::generate::Generator;
use crate::instantiate::Instantiator;
use crate::naming::{NameOracle, SyllableNamer};
use crate::oracle::{guarded, program_name, CompiledGame, GameEngine, NullSink, Sink};
use crate::policy::DecisionPolicy;
use crate::{Gate, GenerateError, PipelineReport, ReplacementPool, ValidationOutcome};

/// Default hard cap on moves per simulation.
pub const DEFAULT_MOVE_CAP: usize = 2000;

/// Default number of playability simulations.
pub const DEFAULT_PLAYOUTS: usize = 10;

// ---------------------------------------------------------------------------
// Restrictions
// ---------------------------------------------------------------------------

/// A structural constraint on candidates.
///
/// Text restrictions run before the parser; program restrictions need a
/// compiled program and run right after compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    /// Text must contain a `(play` form.
    RequirePlay,
    /// Text must contain an `(end` form.
    RequireEnd,
    /// Text must not contain a `(match` form.
    ForbidMatch,
    /// Text must not mention `boardless`.
    ForbidBoardlessText,
    ForbidSubgames,
    ForbidBoardless,
    ForbidDeductionPuzzle,
    ForbidCards,
    ForbidDominoes,
    ForbidLargePiece,
    RequireAlternating,
    ForbidHiddenInformation,
}

impl Restriction {
    /// `true` when this restriction is checked on raw text.
    #[must_use]
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            Restriction::RequirePlay
                | Restriction::RequireEnd
                | Restriction::ForbidMatch
                | Restriction::ForbidBoardlessText
        )
    }

    fn rejects_text(self, text: &str) -> bool {
        match self {
            Restriction::RequirePlay => !text.contains("(play"),
            Restriction::RequireEnd => !text.contains("(end"),
            Restriction::ForbidMatch => text.contains("(match"),
            Restriction::ForbidBoardlessText => text.contains("boardless"),
            _ => false,
        }
    }

    fn rejects_program<G: CompiledGame>(self, game: &G) -> bool {
        match self {
            Restriction::ForbidSubgames => game.has_subgames(),
            Restriction::ForbidBoardless => game.is_boardless(),
            Restriction::ForbidDeductionPuzzle => game.is_deduction_puzzle(),
            Restriction::ForbidCards => game.has_cards(),
            Restriction::ForbidDominoes => game.has_dominoes(),
            Restriction::ForbidLargePiece => game.has_large_piece(),
            Restriction::RequireAlternating => !game.is_alternating(),
            Restriction::ForbidHiddenInformation => game.has_hidden_information(),
            _ => false,
        }
    }
}

/// The set of structural gates active for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestrictionSet {
    restrictions: Vec<Restriction>,
}

impl RestrictionSet {
    /// No structural gates.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Require play and end phases and forbid multi-game matches.
    #[must_use]
    pub fn standard() -> Self {
        Self::none()
            .with(Restriction::RequirePlay)
            .with(Restriction::RequireEnd)
            .with(Restriction::ForbidMatch)
    }

    /// [`standard()`](Self::standard) plus every program restriction: only
    /// single, board-based, alternating games with perfect information and
    /// ordinary pieces pass.
    #[must_use]
    pub fn dlp() -> Self {
        Self::standard()
            .with(Restriction::ForbidBoardlessText)
            .with(Restriction::ForbidSubgames)
            .with(Restriction::ForbidBoardless)
            .with(Restriction::ForbidDeductionPuzzle)
            .with(Restriction::ForbidCards)
            .with(Restriction::ForbidDominoes)
            .with(Restriction::ForbidLargePiece)
            .with(Restriction::RequireAlternating)
            .with(Restriction::ForbidHiddenInformation)
    }

    #[must_use]
    pub fn with(mut self, restriction: Restriction) -> Self {
        if !self.restrictions.contains(&restriction) {
            self.restrictions.push(restriction);
        }
        self
    }

    #[must_use]
    pub fn contains(&self, restriction: Restriction) -> bool {
        self.restrictions.contains(&restriction)
    }

    pub fn iter(&self) -> impl Iterator<Item = Restriction> + '_ {
        self.restrictions.iter().copied()
    }

    /// First text restriction `text` violates.
    #[must_use]
    pub fn text_violation(&self, text: &str) -> Option<Restriction> {
        self.iter().find(|r| r.rejects_text(text))
    }

    /// First program restriction `game` violates.
    pub fn program_violation<G: CompiledGame>(&self, game: &G) -> Option<Restriction> {
        self.iter().find(|r| r.rejects_program(game))
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    pub start_symbol: String,
    pub restrictions: RestrictionSet,
    /// Functional playouts must consist of decision moves only.
    pub decision_only: bool,
    /// Hand classified texts to the sink.
    pub persist: bool,
    /// Reject programs the engine flags with a missing requirement or as
    /// known to crash.
    pub reject_flagged: bool,
    pub move_cap: usize,
    pub playouts: usize,
    /// Master seed for per-attempt seeds and placeholder draws. `None`
    /// seeds from OS entropy.
    pub seed: Option<u64>,
    /// Upper bound on attempts for [`Pipeline::run_until_accepted()`].
    pub max_attempts: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            start_symbol: "game".to_owned(),
            restrictions: RestrictionSet::standard(),
            decision_only: false,
            persist: false,
            reject_flagged: true,
            move_cap: DEFAULT_MOVE_CAP,
            playouts: DEFAULT_PLAYOUTS,
            seed: None,
            max_attempts: None,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn start_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.start_symbol = symbol.into();
        self
    }

    #[must_use]
    pub fn restrictions(mut self, restrictions: RestrictionSet) -> Self {
        self.restrictions = restrictions;
        self
    }

    #[must_use]
    pub fn decision_only(mut self, on: bool) -> Self {
        self.decision_only = on;
        self
    }

    #[must_use]
    pub fn persist(mut self, on: bool) -> Self {
        self.persist = on;
        self
    }

    #[must_use]
    pub fn reject_flagged(mut self, on: bool) -> Self {
        self.reject_flagged = on;
        self
    }

    #[must_use]
    pub fn move_cap(mut self, cap: usize) -> Self {
        self.move_cap = cap;
        self
    }

    #[must_use]
    pub fn playouts(mut self, count: usize) -> Self {
        self.playouts = count;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, limit: usize) -> Self {
        self.max_attempts = Some(limit);
        self
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives a [`Generator`] and a [`GameEngine`] through the acceptance
/// funnel.
pub struct Pipeline<'g, P, E> {
    generator: Generator<'g, P>,
    engine: E,
    options: PipelineOptions,
    sink: Box<dyn Sink + 'g>,
    pool: ReplacementPool,
    namer: Box<dyn NameOracle + 'g>,
    rng: StdRng,
}

/// Verdict on one candidate plus the file name it is persisted under.
struct Classified {
    outcome: ValidationOutcome,
    file_stem: String,
}

impl Classified {
    fn new(outcome: ValidationOutcome, file_stem: &str) -> Self {
        Self {
            outcome,
            file_stem: file_stem.to_owned(),
        }
    }
}

impl<'g, P: DecisionPolicy, E: GameEngine> Pipeline<'g, P, E> {
    pub fn new(generator: Generator<'g, P>, engine: E, options: PipelineOptions) -> Self {
        let rng = options
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            generator,
            engine,
            options,
            sink: Box::new(NullSink),
            pool: ReplacementPool::standard(),
            namer: Box::new(SyllableNamer::new()),
            rng,
        }
    }

    /// Destination for classified texts when
    /// [`persist`](PipelineOptions::persist) is on.
    #[must_use]
    pub fn with_sink(mut self, sink: impl Sink + 'g) -> Self {
        self.sink = Box::new(sink);
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: ReplacementPool) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn with_namer(mut self, namer: impl NameOracle + 'g) -> Self {
        self.namer = Box::new(namer);
        self
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run exactly `count` attempts.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnknownSymbol`] when the start symbol
    /// matches no rule.
    pub fn run_fixed_attempts(&mut self, count: usize) -> Result<PipelineReport, GenerateError> {
        let started = Instant::now();
        let mut report = PipelineReport::default();
        for _ in 0..count {
            self.attempt(&mut report)?;
        }
        report.finish(started.elapsed());
        info!("{report}");
        Ok(report)
    }

    /// Run until `target` candidates are accepted, or until
    /// [`max_attempts`](PipelineOptions::max_attempts) is reached.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnknownSymbol`] when the start symbol
    /// matches no rule.
    pub fn run_until_accepted(&mut self, target: usize) -> Result<PipelineReport, GenerateError> {
        let started = Instant::now();
        let mut report = PipelineReport::default();
        while report.accepted() < target {
            if self
                .options
                .max_attempts
                .is_some_and(|limit| report.attempts() >= limit)
            {
                debug!(attempts = report.attempts(), "attempt limit reached");
                break;
            }
            self.attempt(&mut report)?;
        }
        report.finish(started.elapsed());
        info!("{report}");
        Ok(report)
    }

    fn attempt(&mut self, report: &mut PipelineReport) -> Result<ValidationOutcome, GenerateError> {
        let seed: u64 = self.rng.gen();
        let generated = self.generator.generate(&self.options.start_symbol, seed)?;

        let Some(raw) = generated.into_text() else {
            report.record(ValidationOutcome::GenerationFailed);
            return Ok(ValidationOutcome::GenerationFailed);
        };
        report.pass(Gate::Generated);

        let text =
            Instantiator::new(&self.pool, &*self.namer).instantiate(&raw, &mut self.rng);
        let classified = self.classify(&text, report);
        let outcome = classified.outcome;

        debug!(attempt = report.attempts(), seed, %outcome, "candidate classified");
        report.record(outcome);
        if outcome == ValidationOutcome::Accepted {
            report.accept(text.clone());
        }
        if self.options.persist {
            if let Some(bucket) = outcome.bucket() {
                let file_name = format!("{}.lud", classified.file_stem);
                self.sink.save(&text, bucket, &file_name);
            }
        }
        Ok(outcome)
    }

    fn classify(&self, text: &str, report: &mut PipelineReport) -> Classified {
        let name = program_name(text);

        if let Some(restriction) = self.options.restrictions.text_violation(text) {
            debug!(?restriction, "text restriction violated");
            return Classified::new(ValidationOutcome::StructurallyRejected, name);
        }
        report.pass(Gate::Structural);

        match guarded(|| Ok(self.engine.parse(text))) {
            Ok(parsed) if parsed.is_clean() => {}
            Ok(_) => return Classified::new(ValidationOutcome::Unparsable, name),
            Err(e) => {
                debug!(error = %e, "parser raised");
                return Classified::new(ValidationOutcome::Unparsable, name);
            }
        }
        report.pass(Gate::Parsed);

        let game = match guarded(|| self.engine.compile(text)) {
            Ok(Some(game)) => game,
            Ok(None) => return Classified::new(ValidationOutcome::Uncompilable, name),
            Err(e) => {
                debug!(error = %e, "compilation raised");
                return Classified::new(ValidationOutcome::Uncompilable, name);
            }
        };
        report.pass(Gate::Compiled);

        let name = if game.name().is_empty() {
            name
        } else {
            game.name()
        };

        if let Some(restriction) = self.options.restrictions.program_violation(&game) {
            debug!(?restriction, "program restriction violated");
            return Classified::new(ValidationOutcome::StructurallyRejected, name);
        }
        if self.options.reject_flagged && (game.has_missing_requirement() || game.will_crash()) {
            return Classified::new(ValidationOutcome::NonFunctional, name);
        }

        if !self.is_functional(&game) {
            return Classified::new(ValidationOutcome::NonFunctional, name);
        }
        report.pass(Gate::Functional);

        if !self.is_playable(&game) {
            return Classified::new(ValidationOutcome::Unplayable, name);
        }
        report.pass(Gate::Playable);

        Classified::new(ValidationOutcome::Accepted, name)
    }

    /// One bounded playout must finish without error.
    fn is_functional(&self, game: &E::Game) -> bool {
        match guarded(|| self.engine.playout(game, self.options.move_cap)) {
            Ok(Some(trial)) => !self.options.decision_only || trial.all_decisions(),
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "functional playout raised");
                false
            }
        }
    }

    /// At least half of the playouts must have a reasonable length:
    /// between two moves per player and 90% of the move cap. With no
    /// playouts configured nothing is playable.
    fn is_playable(&self, game: &E::Game) -> bool {
        if self.options.playouts == 0 {
            return false;
        }

        let min_moves = 2 * game.player_count();
        let max_moves = self.options.move_cap * 9 / 10;

        let mut reasonable = 0;
        for _ in 0..self.options.playouts {
            match guarded(|| self.engine.playout(game, self.options.move_cap)) {
                Ok(Some(trial)) => {
                    if (min_moves..=max_moves).contains(&trial.num_moves()) {
                        reasonable += 1;
                    }
                }
                Ok(None) => return false,
                Err(e) => {
                    debug!(error = %e, "playability playout raised");
                    return false;
                }
            }
        }
        2 * reasonable >= self.options.playouts
    }
}

impl<P: std::fmt::Debug, E: std::fmt::Debug> std::fmt::Debug for Pipeline<'_, P, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("generator", &self.generator)
            .field("engine", &self.engine)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

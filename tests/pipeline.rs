use std::cell::Cell;
use std::fs;

use ludeme_forge::{
    CompiledGame, DirectorySink, EngineError, FixedPolicy, Gate, GameEngine, GenerateError,
    Generator, Grammar, GrammarBuilder, ParseReport, Pipeline, PipelineOptions, RandomPolicy,
    RestrictionSet, Sink, Trial, TrialMove, ValidationOutcome,
};

// ---- Test doubles ----

#[derive(Debug, Clone)]
struct MockGame {
    name: String,
    players: usize,
    /// Playout lengths, used in turn.
    lengths: Vec<usize>,
    next: Cell<usize>,
    forced_moves: bool,
    boardless: bool,
    flagged: bool,
}

impl MockGame {
    fn with_lengths(lengths: &[usize]) -> Self {
        Self {
            name: "Tac".to_owned(),
            players: 2,
            lengths: lengths.to_vec(),
            next: Cell::new(0),
            forced_moves: false,
            boardless: false,
            flagged: false,
        }
    }

    fn next_length(&self) -> usize {
        let idx = self.next.get();
        self.next.set(idx + 1);
        self.lengths[idx % self.lengths.len()]
    }
}

impl CompiledGame for MockGame {
    fn has_missing_requirement(&self) -> bool {
        self.flagged
    }
    fn will_crash(&self) -> bool {
        false
    }
    fn has_subgames(&self) -> bool {
        false
    }
    fn is_boardless(&self) -> bool {
        self.boardless
    }
    fn is_deduction_puzzle(&self) -> bool {
        false
    }
    fn has_cards(&self) -> bool {
        false
    }
    fn has_dominoes(&self) -> bool {
        false
    }
    fn has_large_piece(&self) -> bool {
        false
    }
    fn is_alternating(&self) -> bool {
        true
    }
    fn has_hidden_information(&self) -> bool {
        false
    }
    fn player_count(&self) -> usize {
        self.players
    }
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compile {
    Game,
    Nothing,
    Raise,
    Panic,
}

#[derive(Debug)]
struct MockEngine {
    parse_errors: bool,
    parse_panics: bool,
    compile: Compile,
    game: MockGame,
    /// Panic on this playout call and every later one.
    panic_from: Option<usize>,
    parses: Cell<usize>,
    compiles: Cell<usize>,
    playouts: Cell<usize>,
}

impl MockEngine {
    fn accepting() -> Self {
        Self::with_game(MockGame::with_lengths(&[40]))
    }

    fn with_game(game: MockGame) -> Self {
        Self {
            parse_errors: false,
            parse_panics: false,
            compile: Compile::Game,
            game,
            panic_from: None,
            parses: Cell::new(0),
            compiles: Cell::new(0),
            playouts: Cell::new(0),
        }
    }
}

impl GameEngine for MockEngine {
    type Game = MockGame;

    fn parse(&self, _text: &str) -> ParseReport {
        self.parses.set(self.parses.get() + 1);
        if self.parse_panics {
            panic!("parser bug");
        }
        let mut report = ParseReport::default();
        if self.parse_errors {
            report.errors.push("unexpected token".to_owned());
        }
        report
    }

    fn compile(&self, _text: &str) -> Result<Option<MockGame>, EngineError> {
        self.compiles.set(self.compiles.get() + 1);
        match self.compile {
            Compile::Game => Ok(Some(self.game.clone())),
            Compile::Nothing => Ok(None),
            Compile::Raise => Err(EngineError::new("no such ludeme")),
            Compile::Panic => panic!("compiler bug"),
        }
    }

    fn playout(&self, game: &MockGame, move_cap: usize) -> Result<Option<Trial>, EngineError> {
        let call = self.playouts.get();
        self.playouts.set(call + 1);
        if self.panic_from.is_some_and(|from| call >= from) {
            panic!("simulation bug");
        }

        let length = game.next_length().min(move_cap);
        let mut trial = Trial::of_decisions(length);
        if game.forced_moves {
            trial.moves.push(TrialMove { decision: false });
        }
        Ok(Some(trial))
    }
}

#[derive(Debug, Default)]
struct RecordingSink {
    saved: Vec<(String, String, String)>,
}

impl Sink for RecordingSink {
    fn save(&mut self, text: &str, bucket: &str, file_name: &str) {
        self.saved
            .push((text.to_owned(), bucket.to_owned(), file_name.to_owned()));
    }
}

// ---- Fixtures ----

fn game_grammar() -> Grammar {
    GrammarBuilder::new()
        .rule("<game>", |r| {
            r.constructor("game", |c| c.arg("string").arg("<players>").arg("<rules>"))
        })
        .rule("<players>", |r| r.constructor("players", |c| c.arg("<num>")))
        .rule("<num>", |r| r.terminal("2"))
        .rule("<rules>", |r| {
            r.constructor("rules", |c| c.arg("<play>").optional("<end>"))
        })
        .rule("<play>", |r| r.constructor("play", |c| c.arg("<moves>")))
        .rule("<moves>", |r| r.terminal("Add"))
        .rule("<end>", |r| r.constructor("end", |c| c.arg("<result>")))
        .rule("<result>", |r| r.terminal("Win"))
        .build()
        .unwrap()
}

fn options() -> PipelineOptions {
    PipelineOptions::new().seed(7)
}

fn run_once(grammar: &Grammar, engine: MockEngine, options: PipelineOptions) -> ValidationOutcome {
    let generator = Generator::new(grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, engine, options);
    let report = pipeline.run_fixed_attempts(1).unwrap();
    assert_eq!(report.attempts(), 1);
    ValidationOutcome::ALL
        .into_iter()
        .find(|&o| report.count(o) == 1)
        .unwrap()
}

// ---- Structural gates ----

#[test]
fn missing_end_phase_never_reaches_the_parser() {
    let grammar = game_grammar();
    let generator = Generator::new(&grammar, FixedPolicy::new().drop_optional(true));
    let mut pipeline = Pipeline::new(generator, MockEngine::accepting(), options());

    let report = pipeline.run_fixed_attempts(5).unwrap();
    assert_eq!(report.count(ValidationOutcome::StructurallyRejected), 5);
    assert_eq!(report.passed(Gate::Generated), 5);
    assert_eq!(report.passed(Gate::Structural), 0);
    assert_eq!(pipeline.engine().parses.get(), 0);
}

#[test]
fn empty_restriction_set_lets_everything_through_to_the_engine() {
    let grammar = game_grammar();
    let generator = Generator::new(&grammar, FixedPolicy::new().drop_optional(true));
    let mut pipeline = Pipeline::new(
        generator,
        MockEngine::accepting(),
        options().restrictions(RestrictionSet::none()),
    );

    let report = pipeline.run_fixed_attempts(3).unwrap();
    assert_eq!(report.accepted(), 3);
    assert_eq!(pipeline.engine().parses.get(), 3);
}

#[test]
fn program_restrictions_apply_after_compilation() {
    let grammar = game_grammar();
    let mut game = MockGame::with_lengths(&[40]);
    game.boardless = true;

    let outcome = run_once(
        &grammar,
        MockEngine::with_game(game.clone()),
        options().restrictions(RestrictionSet::dlp()),
    );
    assert_eq!(outcome, ValidationOutcome::StructurallyRejected);

    let outcome = run_once(&grammar, MockEngine::with_game(game), options());
    assert_eq!(outcome, ValidationOutcome::Accepted);
}

// ---- Engine gates ----

#[test]
fn parse_errors_stop_before_compilation() {
    let grammar = game_grammar();
    let mut engine = MockEngine::accepting();
    engine.parse_errors = true;

    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, engine, options());
    let report = pipeline.run_fixed_attempts(2).unwrap();

    assert_eq!(report.count(ValidationOutcome::Unparsable), 2);
    assert_eq!(report.passed(Gate::Structural), 2);
    assert_eq!(report.passed(Gate::Parsed), 0);
    assert_eq!(pipeline.engine().compiles.get(), 0);
}

#[test]
fn parser_panic_is_unparsable_and_the_run_continues() {
    let grammar = game_grammar();
    let mut engine = MockEngine::accepting();
    engine.parse_panics = true;

    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, engine, options());
    let report = pipeline.run_fixed_attempts(3).unwrap();

    assert_eq!(report.attempts(), 3);
    assert_eq!(report.count(ValidationOutcome::Unparsable), 3);
    assert_eq!(report.passed(Gate::Parsed), 0);
    assert_eq!(pipeline.engine().parses.get(), 3);
    assert_eq!(pipeline.engine().compiles.get(), 0);
}

#[test]
fn every_compile_failure_is_uncompilable() {
    let grammar = game_grammar();
    for mode in [Compile::Nothing, Compile::Raise, Compile::Panic] {
        let mut engine = MockEngine::accepting();
        engine.compile = mode;
        assert_eq!(
            run_once(&grammar, engine, options()),
            ValidationOutcome::Uncompilable,
            "{mode:?}"
        );
    }
}

#[test]
fn flagged_programs_are_non_functional_unless_allowed() {
    let grammar = game_grammar();
    let mut game = MockGame::with_lengths(&[40]);
    game.flagged = true;

    let engine = MockEngine::with_game(game.clone());
    assert_eq!(
        run_once(&grammar, engine, options()),
        ValidationOutcome::NonFunctional
    );

    let engine = MockEngine::with_game(game);
    assert_eq!(
        run_once(&grammar, engine, options().reject_flagged(false)),
        ValidationOutcome::Accepted
    );
}

#[test]
fn decision_only_rejects_forced_moves() {
    let grammar = game_grammar();
    let mut game = MockGame::with_lengths(&[40]);
    game.forced_moves = true;

    let engine = MockEngine::with_game(game.clone());
    assert_eq!(
        run_once(&grammar, engine, options().decision_only(true)),
        ValidationOutcome::NonFunctional
    );

    let engine = MockEngine::with_game(game);
    assert_eq!(
        run_once(&grammar, engine, options()),
        ValidationOutcome::Accepted
    );
}

// ---- Playability ----

#[test]
fn games_ending_immediately_are_unplayable() {
    let grammar = game_grammar();
    let engine = MockEngine::with_game(MockGame::with_lengths(&[1]));

    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, engine, options());
    let report = pipeline.run_fixed_attempts(1).unwrap();

    assert_eq!(report.count(ValidationOutcome::Unplayable), 1);
    assert_eq!(report.passed(Gate::Functional), 1);
    // One functional playout plus ten playability playouts.
    assert_eq!(pipeline.engine().playouts.get(), 11);
}

#[test]
fn six_reasonable_playouts_of_ten_are_enough() {
    let grammar = game_grammar();
    let lengths = [4, 1800, 100, 50, 20, 10, 1, 3, 1801, 2000];
    let engine = MockEngine::with_game(MockGame::with_lengths(&lengths));
    assert_eq!(
        run_once(&grammar, engine, options()),
        ValidationOutcome::Accepted
    );
}

#[test]
fn four_reasonable_playouts_of_ten_are_not() {
    let grammar = game_grammar();
    let lengths = [4, 1800, 100, 50, 1, 1, 1, 3, 1801, 2000];
    let engine = MockEngine::with_game(MockGame::with_lengths(&lengths));
    assert_eq!(
        run_once(&grammar, engine, options()),
        ValidationOutcome::Unplayable
    );
}

#[test]
fn half_means_half_with_an_odd_playout_count() {
    let grammar = game_grammar();

    // First length feeds the functional playout.
    let engine = MockEngine::with_game(MockGame::with_lengths(&[40, 40, 1, 1]));
    assert_eq!(
        run_once(&grammar, engine, options().playouts(3)),
        ValidationOutcome::Unplayable
    );

    let engine = MockEngine::with_game(MockGame::with_lengths(&[40, 40, 40, 1]));
    assert_eq!(
        run_once(&grammar, engine, options().playouts(3)),
        ValidationOutcome::Accepted
    );
}

#[test]
fn zero_playouts_never_prove_playability() {
    let grammar = game_grammar();
    assert_eq!(
        run_once(&grammar, MockEngine::accepting(), options().playouts(0)),
        ValidationOutcome::Unplayable
    );
}

#[test]
fn minimum_length_scales_with_players() {
    let grammar = game_grammar();
    let mut game = MockGame::with_lengths(&[7]);
    game.players = 4;
    assert_eq!(
        run_once(&grammar, MockEngine::with_game(game), options()),
        ValidationOutcome::Unplayable
    );
}

#[test]
fn simulation_panic_is_contained() {
    let grammar = game_grammar();
    let mut engine = MockEngine::accepting();
    engine.panic_from = Some(1);
    assert_eq!(
        run_once(&grammar, engine, options()),
        ValidationOutcome::Unplayable
    );

    let mut engine = MockEngine::accepting();
    engine.panic_from = Some(0);
    assert_eq!(
        run_once(&grammar, engine, options()),
        ValidationOutcome::NonFunctional
    );
}

// ---- Drivers ----

#[test]
fn run_until_accepted_stops_at_the_target() {
    let grammar = game_grammar();
    let generator = Generator::new(&grammar, RandomPolicy::new(0));
    let mut pipeline = Pipeline::new(generator, MockEngine::accepting(), options());

    let report = pipeline.run_until_accepted(3).unwrap();
    assert_eq!(report.accepted(), 3);
    assert!(report.attempts() >= 3);
    let last = report.last_accepted().unwrap();
    assert!(last.starts_with("(game \""));
    assert!(last.contains("(end Win)"));
}

#[test]
fn run_until_accepted_honours_the_attempt_limit() {
    let grammar = game_grammar();
    let mut engine = MockEngine::accepting();
    engine.parse_errors = true;

    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, engine, options().max_attempts(12));
    let report = pipeline.run_until_accepted(1).unwrap();

    assert_eq!(report.attempts(), 12);
    assert_eq!(report.accepted(), 0);
    assert!(report.last_accepted().is_none());
}

#[test]
fn unknown_start_symbol_aborts_the_run() {
    let grammar = game_grammar();
    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(
        generator,
        MockEngine::accepting(),
        options().start_symbol("match"),
    );
    assert!(matches!(
        pipeline.run_fixed_attempts(1),
        Err(GenerateError::UnknownSymbol { .. })
    ));
}

#[test]
fn same_seed_same_report() {
    let grammar = game_grammar();
    let run = || {
        let generator = Generator::new(&grammar, RandomPolicy::new(0));
        let mut pipeline = Pipeline::new(generator, MockEngine::accepting(), options());
        let report = pipeline.run_fixed_attempts(20).unwrap();
        (
            report.count(ValidationOutcome::StructurallyRejected),
            report.into_last_accepted(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn report_summarises_every_gate() {
    let grammar = game_grammar();
    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, MockEngine::accepting(), options());
    let report = pipeline.run_fixed_attempts(4).unwrap();

    let summary = report.to_string();
    assert!(summary.starts_with("4 random games generated in "));
    assert!(summary.contains("4 playable (100.0%)."));
}

// ---- Persistence ----

#[test]
fn persisted_candidates_land_in_outcome_buckets() {
    let grammar = game_grammar();
    let mut sink = RecordingSink::default();
    {
        let generator = Generator::new(&grammar, FixedPolicy::new().drop_optional(true));
        let mut pipeline = Pipeline::new(generator, MockEngine::accepting(), options().persist(true))
            .with_sink(&mut sink);
        pipeline.run_fixed_attempts(2).unwrap();
    }

    assert_eq!(sink.saved.len(), 2);
    for (text, bucket, file_name) in &sink.saved {
        assert_eq!(bucket, "structurally-rejected");
        let name = ludeme_forge::program_name(text);
        assert_ne!(name, "Anon");
        assert_eq!(file_name, &format!("{name}.lud"));
    }
}

#[test]
fn nothing_is_persisted_by_default() {
    let grammar = game_grammar();
    let mut sink = RecordingSink::default();
    {
        let generator = Generator::new(&grammar, FixedPolicy::new());
        let mut pipeline =
            Pipeline::new(generator, MockEngine::accepting(), options()).with_sink(&mut sink);
        pipeline.run_fixed_attempts(3).unwrap();
    }
    assert!(sink.saved.is_empty());
}

#[test]
fn directory_sink_writes_accepted_games_under_compiled_name() {
    let dir = tempfile::tempdir().unwrap();
    let grammar = game_grammar();
    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(generator, MockEngine::accepting(), options().persist(true))
        .with_sink(DirectorySink::new(dir.path()));

    let report = pipeline.run_fixed_attempts(1).unwrap();
    assert_eq!(report.accepted(), 1);

    let saved = fs::read_to_string(dir.path().join("accepted").join("Tac.lud")).unwrap();
    assert_eq!(Some(saved.as_str()), report.last_accepted());
}

#[test]
fn program_names_cannot_write_outside_the_sink_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("runs");
    let grammar = game_grammar();
    let mut game = MockGame::with_lengths(&[40]);
    game.name = "../../Tac".to_owned();

    let generator = Generator::new(&grammar, FixedPolicy::new());
    let mut pipeline = Pipeline::new(
        generator,
        MockEngine::with_game(game),
        options().persist(true),
    )
    .with_sink(DirectorySink::new(&root));
    assert_eq!(pipeline.run_fixed_attempts(1).unwrap().accepted(), 1);

    assert!(!dir.path().join("Tac.lud").exists());
    assert!(root.join("accepted").join(".._.._Tac.lud").exists());
}

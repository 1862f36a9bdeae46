use ludeme_forge::{
    text_hash, CompiledGame, EngineError, GameEngine, Generator, Grammar, ParseReport, Pipeline,
    PipelineOptions, RandomPolicy, Trial,
};

/// Stand-in engine: checks brackets, "compiles" anything with a board and
/// simulates games whose length depends on the text.
struct ToyEngine;

struct ToyGame {
    players: usize,
    length: usize,
}

impl CompiledGame for ToyGame {
    fn has_missing_requirement(&self) -> bool {
        false
    }
    fn will_crash(&self) -> bool {
        false
    }
    fn has_subgames(&self) -> bool {
        false
    }
    fn is_boardless(&self) -> bool {
        false
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
        ""
    }
}

impl GameEngine for ToyEngine {
    type Game = ToyGame;

    fn parse(&self, text: &str) -> ParseReport {
        let mut report = ParseReport::default();
        if text.matches('(').count() != text.matches(')').count() {
            report.errors.push("unbalanced parentheses".to_owned());
        }
        report
    }

    fn compile(&self, text: &str) -> Result<Option<ToyGame>, EngineError> {
        if !text.contains("(board") {
            return Ok(None);
        }
        let players = if text.contains("(players 2)") { 2 } else { 3 };
        #[allow(clippy::cast_possible_truncation)]
        let length = (text_hash(text) % 60) as usize;
        Ok(Some(ToyGame { players, length }))
    }

    fn playout(&self, game: &ToyGame, move_cap: usize) -> Result<Option<Trial>, EngineError> {
        Ok(Some(Trial::of_decisions(game.length.min(move_cap))))
    }
}

fn main() {
    let grammar = Grammar::from_file("demos/board.ebnf").expect("failed to load grammar");
    let generator = Generator::new(&grammar, RandomPolicy::new(0));
    let options = PipelineOptions::new().seed(42).max_attempts(500);

    let mut pipeline = Pipeline::new(generator, ToyEngine, options);
    let report = pipeline.run_until_accepted(3).expect("unknown start symbol");

    println!("{report}");
    if let Some(text) = report.last_accepted() {
        println!("Last accepted: {text}");
    }
}

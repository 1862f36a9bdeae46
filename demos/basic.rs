use ludeme_forge::{
    GenerationOutcome, Generator, GrammarBuilder, Instantiator, RandomPolicy, ReplacementPool,
    SyllableNamer,
};
use rand::SeedableRng;

fn main() {
    // Define rules
    let grammar = GrammarBuilder::new()
        .rule("<game>", |r| {
            r.constructor("game", |c| c.arg("string").arg("<players>").arg("<rules>"))
        })
        .rule("<players>", |r| r.constructor("players", |c| c.arg("<num>")))
        .rule("<num>", |r| r.terminal("2").terminal("3"))
        .rule("<rules>", |r| {
            r.constructor("rules", |c| c.arg("<play>").optional("<end>"))
        })
        .rule("<play>", |r| r.constructor("play", |c| c.arg("<move>")))
        .rule("<move>", |r| {
            r.constructor("move", |c| c.arg("<kind>").labelled("piece", "string"))
        })
        .rule("<kind>", |r| r.terminal("Add").terminal("Remove"))
        .rule("<end>", |r| r.constructor("end", |c| c.arg("<result>")))
        .rule("<result>", |r| r.terminal("Win").terminal("Draw"))
        .build()
        .expect("failed to build grammar");

    println!("{grammar}");

    // Generate a few candidates and fill their placeholders
    let pool = ReplacementPool::standard();
    let namer = SyllableNamer::new();
    let instantiator = Instantiator::new(&pool, &namer);
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    let mut generator = Generator::new(&grammar, RandomPolicy::new(0));

    for seed in 0..5 {
        match generator.generate("game", seed) {
            Ok(GenerationOutcome::Complete(text)) => {
                println!("{}", instantiator.instantiate(&text, &mut rng));
            }
            Ok(GenerationOutcome::Failed) => println!("attempt {seed} failed"),
            Err(e) => println!("error: {e}"),
        }
    }
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ludeme_forge::{
    ForgeError, Generator, Grammar, Instantiator, RandomPolicy, ReplacementPool, SyllableNamer,
};

#[derive(Parser)]
#[command(name = "ludeme-forge")]
#[command(about = "Generate random game descriptions from a ludeme grammar")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print randomly generated descriptions, one per line
    Generate {
        /// Grammar listing
        #[arg(long)]
        grammar: PathBuf,

        /// Start symbol
        #[arg(long, default_value = "game")]
        symbol: String,

        /// Number of generation attempts
        #[arg(long, default_value = "1")]
        count: usize,

        /// Master seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Leave `string` placeholders in the output
        #[arg(long)]
        no_instantiate: bool,
    },
    /// Report grammar size and arguments that resolve to no rule
    Audit {
        /// Grammar listing
        #[arg(long)]
        grammar: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate {
            grammar,
            symbol,
            count,
            seed,
            no_instantiate,
        } => generate(&grammar, &symbol, count, seed, !no_instantiate),
        Command::Audit { grammar } => audit(&grammar),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn generate(
    path: &Path,
    symbol: &str,
    count: usize,
    seed: Option<u64>,
    instantiate: bool,
) -> Result<(), ForgeError> {
    let grammar = Grammar::from_file(path)?;
    info!(%grammar, "grammar loaded");

    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut generator = Generator::new(&grammar, RandomPolicy::new(0));
    let pool = ReplacementPool::standard();
    let namer = SyllableNamer::new();
    let instantiator = Instantiator::new(&pool, &namer);

    let mut failed = 0;
    for _ in 0..count {
        let attempt_seed: u64 = rng.gen();
        match generator.generate(symbol, attempt_seed)?.into_text() {
            Some(text) if instantiate => println!("{}", instantiator.instantiate(&text, &mut rng)),
            Some(text) => println!("{text}"),
            None => failed += 1,
        }
    }
    info!(attempts = count, failed, "generation finished");
    Ok(())
}

fn audit(path: &Path) -> Result<(), ForgeError> {
    let grammar = Grammar::from_file(path)?;
    println!("{}", grammar.audit());
    Ok(())
}

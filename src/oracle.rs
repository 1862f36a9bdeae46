//! Seams to the external game engine and the persistence sink.
//!
//! The pipeline only talks to these traits; a real engine binding or a
//! test double plugs in behind them.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use tracing::warn;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Diagnostics reported by the engine's parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ParseReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// An error raised inside the engine during compilation or simulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine error: {message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One move of a simulated trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialMove {
    /// `false` for automatic or forced moves.
    pub decision: bool,
}

/// Ordered record of the moves taken in one simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trial {
    pub moves: Vec<TrialMove>,
}

impl Trial {
    #[must_use]
    pub fn new(moves: Vec<TrialMove>) -> Self {
        Self { moves }
    }

    /// A trial of `count` decision moves.
    #[must_use]
    pub fn of_decisions(count: usize) -> Self {
        Self::new(vec![TrialMove { decision: true }; count])
    }

    #[must_use]
    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn all_decisions(&self) -> bool {
        self.moves.iter().all(|m| m.decision)
    }
}

/// Introspection queries on a compiled program.
pub trait CompiledGame {
    fn has_missing_requirement(&self) -> bool;
    fn will_crash(&self) -> bool;
    fn has_subgames(&self) -> bool;
    fn is_boardless(&self) -> bool;
    fn is_deduction_puzzle(&self) -> bool;
    fn has_cards(&self) -> bool;
    fn has_dominoes(&self) -> bool;
    fn has_large_piece(&self) -> bool;
    fn is_alternating(&self) -> bool;
    fn has_hidden_information(&self) -> bool;
    fn player_count(&self) -> usize;
    fn name(&self) -> &str;
}

/// Parser, compiler and simulator of the target game language.
pub trait GameEngine {
    type Game: CompiledGame;

    fn parse(&self, text: &str) -> ParseReport;

    /// `Ok(None)` means the compiler produced nothing without raising.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when compilation raises.
    fn compile(&self, text: &str) -> Result<Option<Self::Game>, EngineError>;

    /// Run one simulation from a fresh start, stopping after `move_cap`
    /// moves.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the simulation raises.
    fn playout(&self, game: &Self::Game, move_cap: usize) -> Result<Option<Trial>, EngineError>;
}

/// Run an engine call, converting a panic into an [`EngineError`].
pub(crate) fn guarded<T>(
    call: impl FnOnce() -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "engine panicked".to_owned());
            warn!(%message, "engine call panicked");
            Err(EngineError::new(message))
        }
    }
}

/// Name declared by the leading `(game "...")` form, or `Anon`.
#[must_use]
pub fn program_name(text: &str) -> &str {
    text.trim_start()
        .strip_prefix('(')
        .and_then(|rest| rest.split_once('"'))
        .filter(|(head, _)| !head.contains(|c: char| c == '(' || c == ')'))
        .and_then(|(_, rest)| rest.split_once('"'))
        .map(|(name, _)| name)
        .filter(|name| !name.is_empty())
        .unwrap_or("Anon")
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Fire-and-forget destination for classified candidates.
pub trait Sink {
    fn save(&mut self, text: &str, bucket: &str, file_name: &str);
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn save(&mut self, text: &str, bucket: &str, file_name: &str) {
        (**self).save(text, bucket, file_name);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn save(&mut self, _text: &str, _bucket: &str, _file_name: &str) {}
}

/// Writes each candidate to `root/bucket/file_name`.
///
/// Bucket and file names become single path components: separators and
/// control characters are replaced by `_`, so a generated program name
/// cannot reach outside `root`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sink for DirectorySink {
    fn save(&mut self, text: &str, bucket: &str, file_name: &str) {
        let dir = self.root.join(path_component(bucket));
        let path = dir.join(path_component(file_name));
        if let Err(e) = fs::create_dir_all(&dir).and_then(|()| fs::write(&path, text)) {
            warn!(path = %path.display(), error = %e, "failed to persist candidate");
        }
    }
}

fn path_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_owned(),
        _ => cleaned,
    }
}

use crate::GrammarRule;

/// The result of parsing a grammar listing.
#[derive(Debug)]
pub struct ParsedGrammar {
    pub rules: Vec<GrammarRule>,
}

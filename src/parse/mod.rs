mod error;
mod grammar;
mod parser;

pub use error::ParseError;
pub use parser::ParsedGrammar;

/// Parse a grammar listing into a [`ParsedGrammar`].
///
/// The rules are not validated yet; see [`Grammar::from_ebnf()`](crate::Grammar::from_ebnf).
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid listing.
pub fn parse(input: &str) -> Result<ParsedGrammar, ParseError> {
    use winnow::Parser;
    grammar::parse_grammar.parse(input).map_err(|e| {
        let line = input[..e.offset()].matches('\n').count() + 1;
        ParseError::new(e.inner().to_string(), line)
    })
}

#![cfg(feature = "binary-cache")]

use ludeme_forge::{
    ClauseArg, DeserializeError, FixedPolicy, Generator, Grammar, GrammarBuilder, SerializeError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LISTING: &str = "
<game> ::= (game string <players> <rules>)
<players> ::= (players <num>)
<num> ::= 2 | 4
<rules> ::= (rules <play> [<end>])
<play> ::= (play (<add> | <move>))
<add> ::= (add {<site>})
<move> ::= (move from:<site> to:<site>)
<site> ::= <int>
<int> ::= 0
<end> ::= (end <result>)
<result> ::= Win | Draw
";

fn simple_grammar() -> Grammar {
    GrammarBuilder::new()
        .rule("<end>", |r| r.constructor("end", |c| c.arg("<result>")))
        .rule("<result>", |r| r.terminal("Win").terminal("Loss"))
        .build()
        .unwrap()
}

fn decorated_grammar() -> Grammar {
    GrammarBuilder::new()
        .rule("<poly>", |r| {
            r.constructor("poly", |c| {
                c.labelled("name", "string")
                    .nested("<pt>", 2)
                    .with(ClauseArg::new("<x>").nesting(3).optional())
                    .or_group([ClauseArg::new("<a>"), ClauseArg::new("<b>").label("b")])
            })
            .reference("<pt>")
        })
        .rule("<pt>", |r| r.terminal("P"))
        .build()
        .unwrap()
}

fn first_text(grammar: &Grammar, symbol: &str) -> Option<String> {
    let mut generator = Generator::new(grammar, FixedPolicy::new().exit_with_primitive(true));
    generator.generate(symbol, 0).unwrap().into_text()
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn round_trip_simple() {
    let original = simple_grammar();
    let bytes = original.to_bytes(None).unwrap();
    let restored = Grammar::from_bytes(&bytes).unwrap();

    assert_eq!(original.rules(), restored.rules());
    assert_eq!(first_text(&restored, "end").as_deref(), Some("(end Win)"));
}

#[test]
fn round_trip_keeps_argument_decorations() {
    let original = decorated_grammar();
    let restored = Grammar::from_bytes(&original.to_bytes(None).unwrap()).unwrap();

    assert_eq!(original.rules(), restored.rules());
    assert_eq!(first_text(&original, "poly"), first_text(&restored, "poly"));
}

#[test]
fn round_trip_listing_with_source_digest() {
    let original = Grammar::from_ebnf(LISTING).unwrap();
    let bytes = original.to_bytes(Some(LISTING)).unwrap();
    let restored = Grammar::from_bytes(&bytes).unwrap();

    assert_eq!(original.len(), restored.len());
    assert_eq!(first_text(&original, "game"), first_text(&restored, "game"));

    let digest = Grammar::snapshot_source_digest(&bytes).unwrap();
    assert_eq!(digest, Some(*blake3::hash(LISTING.as_bytes()).as_bytes()));
}

#[test]
fn digest_is_absent_without_source() {
    let bytes = simple_grammar().to_bytes(None).unwrap();
    assert_eq!(Grammar::snapshot_source_digest(&bytes).unwrap(), None);
}

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grammar.bin");

    let original = Grammar::from_ebnf(LISTING).unwrap();
    original.to_binary_file(&path, Some(LISTING)).unwrap();
    let restored = Grammar::from_binary_file(&path).unwrap();

    assert_eq!(original.rules(), restored.rules());
}

#[test]
fn large_grammar_round_trip() {
    let mut builder = GrammarBuilder::new();
    for i in 0..200 {
        let next = format!("<r{}>", i + 1);
        builder = builder.rule(&format!("<r{i}>"), |r| {
            r.constructor("step", |c| c.optional(&next)).terminal("Stop")
        });
    }
    let original = builder.rule("<r200>", |r| r.terminal("End")).build().unwrap();

    let restored = Grammar::from_bytes(&original.to_bytes(None).unwrap()).unwrap();
    assert_eq!(restored.len(), 201);
    assert_eq!(restored.clause_count(), original.clause_count());
}

#[test]
fn encoding_determinism() {
    let grammar = Grammar::from_ebnf(LISTING).unwrap();
    assert_eq!(
        grammar.to_bytes(Some(LISTING)).unwrap(),
        grammar.to_bytes(Some(LISTING)).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corruption_byte_flip() {
    let mut bytes = simple_grammar().to_bytes(None).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;

    assert!(matches!(
        Grammar::from_bytes(&bytes),
        Err(DeserializeError::ChecksumMismatch)
    ));
}

#[test]
fn corruption_truncation() {
    let bytes = simple_grammar().to_bytes(None).unwrap();
    let truncated = &bytes[..bytes.len() - 3];

    assert!(matches!(
        Grammar::from_bytes(truncated),
        Err(DeserializeError::LengthMismatch { .. })
    ));
}

#[test]
fn bad_magic() {
    let mut bytes = simple_grammar().to_bytes(None).unwrap();
    bytes[..4].copy_from_slice(b"LUDI");

    assert!(matches!(
        Grammar::from_bytes(&bytes),
        Err(DeserializeError::BadMagic)
    ));
}

#[test]
fn version_mismatch() {
    let mut bytes = simple_grammar().to_bytes(None).unwrap();
    bytes[4..6].copy_from_slice(&99u16.to_le_bytes());

    assert!(matches!(
        Grammar::from_bytes(&bytes),
        Err(DeserializeError::IncompatibleVersion { blob: 99, .. })
    ));
}

#[test]
fn empty_input_rejected() {
    assert!(matches!(
        Grammar::from_bytes(&[]),
        Err(DeserializeError::LengthMismatch { actual: 0, .. })
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Grammar::from_binary_file(dir.path().join("absent.bin")),
        Err(DeserializeError::Io(_))
    ));
}

#[test]
fn unwritable_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("grammar.bin");
    assert!(matches!(
        simple_grammar().to_binary_file(&path, None),
        Err(SerializeError::Io(_))
    ));
}

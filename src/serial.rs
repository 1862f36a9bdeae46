//! Binary snapshots of validated grammars.
//!
//! A production grammar listing holds thousands of rules. A snapshot stores
//! the rules after validation so later runs skip the text loader.
//!
//! ## Layout
//!
//! ```text
//! Offset  Size  Field
//! 0       4     b"LGRM"
//! 4       2     Format version (u16, LE)
//! 6       2     Flags (u16, unused)
//! 8       4     Rule count (u32, LE)
//! 12      4     Payload length (u32, LE)
//! 16      16    BLAKE3 of the payload, first 16 bytes
//! 32..    var   bincode payload
//! ```
//!
//! Snapshots from another format version are refused with
//! [`DeserializeError::IncompatibleVersion`]; rebuild them from the listing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Clause, ClauseArg, Grammar, GrammarRule};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"LGRM";
const FORMAT_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure to write a grammar snapshot.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("cannot encode grammar snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("cannot write grammar snapshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to read a grammar snapshot.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a grammar snapshot")]
    BadMagic,

    #[error("snapshot format v{blob} is not supported (expected v{supported})")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("snapshot payload is corrupt")]
    ChecksumMismatch,

    #[error("snapshot truncated: need {expected} bytes, have {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("cannot decode snapshot payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("invalid snapshot: {0}")]
    Validation(String),

    #[error("cannot read grammar snapshot: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedGrammar {
    metadata: GrammarMetadata,
    rules: Vec<SerializedRule>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GrammarMetadata {
    rule_count: usize,
    clause_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    name: String,
    clauses: Vec<SerializedClause>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedClause {
    Terminal(String),
    RuleRef(String),
    Constructor {
        head: String,
        args: Vec<SerializedArg>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedArg {
    token: String,
    label: Option<String>,
    optional: bool,
    nesting: u8,
    or_group: u32,
}

// ---------------------------------------------------------------------------
// Clause conversion
// ---------------------------------------------------------------------------

fn serialize_arg(arg: &ClauseArg) -> SerializedArg {
    SerializedArg {
        token: arg.token.clone(),
        label: arg.label.clone(),
        optional: arg.optional,
        nesting: arg.nesting,
        or_group: arg.or_group,
    }
}

fn deserialize_arg(arg: SerializedArg) -> ClauseArg {
    ClauseArg {
        token: arg.token,
        label: arg.label,
        optional: arg.optional,
        nesting: arg.nesting,
        or_group: arg.or_group,
    }
}

fn serialize_clause(clause: &Clause) -> SerializedClause {
    match clause {
        Clause::Terminal(text) => SerializedClause::Terminal(text.clone()),
        Clause::RuleRef(target) => SerializedClause::RuleRef(target.clone()),
        Clause::Constructor { head, args } => SerializedClause::Constructor {
            head: head.clone(),
            args: args.iter().map(serialize_arg).collect(),
        },
    }
}

fn deserialize_clause(clause: SerializedClause) -> Clause {
    match clause {
        SerializedClause::Terminal(text) => Clause::Terminal(text),
        SerializedClause::RuleRef(target) => Clause::RuleRef(target),
        SerializedClause::Constructor { head, args } => Clause::Constructor {
            head,
            args: args.into_iter().map(deserialize_arg).collect(),
        },
    }
}

// ---------------------------------------------------------------------------
// Grammar <-> SerializedGrammar
// ---------------------------------------------------------------------------

fn grammar_to_serialized(grammar: &Grammar, source_text: Option<&str>) -> SerializedGrammar {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    let rules = grammar
        .rules()
        .iter()
        .map(|r| SerializedRule {
            name: r.name.clone(),
            clauses: r.clauses.iter().map(serialize_clause).collect(),
        })
        .collect();

    SerializedGrammar {
        metadata: GrammarMetadata {
            rule_count: grammar.len(),
            clause_count: grammar.clause_count(),
            source_digest,
        },
        rules,
    }
}

fn serialized_to_grammar(ser: SerializedGrammar) -> Result<Grammar, DeserializeError> {
    validate(&ser)?;

    let rules = ser
        .rules
        .into_iter()
        .map(|r| GrammarRule {
            name: r.name,
            clauses: r.clauses.into_iter().map(deserialize_clause).collect(),
        })
        .collect();

    crate::build::build(rules).map_err(|e| DeserializeError::Validation(e.to_string()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedGrammar) -> Result<(), DeserializeError> {
    if ser.metadata.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count,
            ser.rules.len()
        )));
    }

    let clause_count: usize = ser.rules.iter().map(|r| r.clauses.len()).sum();
    if ser.metadata.clause_count != clause_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} clauses but payload has {}",
            ser.metadata.clause_count, clause_count
        )));
    }

    for rule in &ser.rules {
        for clause in &rule.clauses {
            validate_clause(clause, &rule.name)?;
        }
    }
    Ok(())
}

fn validate_clause(clause: &SerializedClause, rule: &str) -> Result<(), DeserializeError> {
    match clause {
        SerializedClause::RuleRef(target) if target.is_empty() => Err(
            DeserializeError::Validation(format!("rule '{rule}' has an empty reference")),
        ),
        SerializedClause::Constructor { args, .. } => {
            if args.iter().any(|a| a.token.is_empty()) {
                return Err(DeserializeError::Validation(format!(
                    "rule '{rule}' has a constructor argument without a token"
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Header {
    version: u16,
    rule_count: u32,
    payload_len: u32,
    checksum: [u8; 16],
}

impl Header {
    fn for_payload(payload: &[u8], rule_count: usize) -> Self {
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&blake3::hash(payload).as_bytes()[..16]);
        Self {
            version: FORMAT_VERSION,
            rule_count: u32::try_from(rule_count).unwrap_or(u32::MAX),
            payload_len: u32::try_from(payload.len()).unwrap_or(u32::MAX),
            checksum,
        }
    }

    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&self.rule_count.to_le_bytes());
        buf.extend_from_slice(&self.payload_len.to_le_bytes());
        buf.extend_from_slice(&self.checksum);
    }

    fn read(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let Some(head) = bytes.get(..HEADER_SIZE) else {
            return Err(DeserializeError::LengthMismatch {
                expected: HEADER_SIZE as u32,
                actual: bytes.len(),
            });
        };
        if &head[..4] != MAGIC {
            return Err(DeserializeError::BadMagic);
        }

        let word =
            |at: usize| u32::from_le_bytes([head[at], head[at + 1], head[at + 2], head[at + 3]]);
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(&head[16..32]);
        Ok(Self {
            version: u16::from_le_bytes([head[4], head[5]]),
            rule_count: word(8),
            payload_len: word(12),
            checksum,
        })
    }

    /// The payload this header describes, once version and checksum match.
    fn payload<'b>(&self, bytes: &'b [u8]) -> Result<&'b [u8], DeserializeError> {
        if self.version != FORMAT_VERSION {
            return Err(DeserializeError::IncompatibleVersion {
                blob: self.version,
                supported: FORMAT_VERSION,
            });
        }

        let body = &bytes[HEADER_SIZE..];
        let Some(payload) = body.get(..self.payload_len as usize) else {
            return Err(DeserializeError::LengthMismatch {
                expected: self.payload_len,
                actual: body.len(),
            });
        };
        if blake3::hash(payload).as_bytes()[..16] != self.checksum {
            return Err(DeserializeError::ChecksumMismatch);
        }
        Ok(payload)
    }
}

fn read_payload(bytes: &[u8]) -> Result<SerializedGrammar, DeserializeError> {
    let header = Header::read(bytes)?;
    let payload = header.payload(bytes)?;

    let (serialized, _): (SerializedGrammar, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    if header.rule_count as usize != serialized.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "header lists {} rules, payload holds {}",
            header.rule_count,
            serialized.rules.len()
        )));
    }
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    grammar: &Grammar,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = grammar_to_serialized(grammar, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    Header::for_payload(&payload, grammar.len()).write(&mut out);
    out.extend_from_slice(&payload);
    Ok(out)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Grammar, DeserializeError> {
    serialized_to_grammar(read_payload(bytes)?)
}

pub(crate) fn source_digest(bytes: &[u8]) -> Result<Option<[u8; 32]>, DeserializeError> {
    Ok(read_payload(bytes)?.metadata.source_digest)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

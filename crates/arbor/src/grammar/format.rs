//! Binary layout of a compiled grammar.
//!
//! ```text
//! +--------+-------------------+---------------------------------+
//! | "ARBR" | ABI version (u32) | bincode-encoded CompiledGrammar |
//! +--------+-------------------+---------------------------------+
//! ```
//!
//! The version is little-endian. Loaders accept versions in
//! [`MIN_COMPATIBLE_ABI_VERSION`]`..=`[`ABI_VERSION`] and reject the rest.

use super::action::Action;
use super::rule::Rule;
use super::symbol::{StateId, SymbolId, SymbolInfo};
use crate::error::GrammarLoadError;
use crate::lexer::Pattern;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

pub const MAGIC: [u8; 4] = *b"ARBR";
/// Version written by this runtime
pub const ABI_VERSION: u32 = 2;
/// Oldest version this runtime still reads
pub const MIN_COMPATIBLE_ABI_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// A grammar exactly as the generator emits it. Nothing here has been
/// checked; [`super::GrammarTable::from_compiled`] validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledGrammar {
    pub name: CompactString,
    pub symbols: Vec<SymbolInfo>,
    pub rules: Vec<Rule>,
    pub states: Vec<CompiledState>,
    pub lex_modes: Vec<CompiledLexMode>,
    pub tokens: Vec<TokenRule>,
    pub extras: Vec<SymbolId>,
    pub externals: Vec<SymbolId>,
    pub start_state: StateId,
}

/// One row of the parse table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledState {
    /// Candidate actions per lookahead terminal; more than one is a conflict
    pub actions: Vec<(SymbolId, Vec<Action>)>,
    pub gotos: Vec<(SymbolId, StateId)>,
    pub lex_mode: u16,
}

/// Which token rules and external tokens may appear in a state
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompiledLexMode {
    /// Indices into [`CompiledGrammar::tokens`]
    pub tokens: Vec<u16>,
    /// Indices into [`CompiledGrammar::externals`]
    pub externals: Vec<u16>,
}

/// A lexical rule: the pattern that produces `symbol`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRule {
    pub symbol: SymbolId,
    pub pattern: Pattern,
}

impl CompiledGrammar {
    /// Encode with the current ABI version.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GrammarLoadError> {
        let body = bincode::serialize(self)?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&ABI_VERSION.to_le_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode, checking the header and version but not the contents.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GrammarLoadError> {
        let version = read_header(bytes)?;
        if !(MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION).contains(&version) {
            return Err(GrammarLoadError::IncompatibleVersion {
                found: version,
                min: MIN_COMPATIBLE_ABI_VERSION,
                max: ABI_VERSION,
            });
        }
        Ok(bincode::deserialize(&bytes[HEADER_LEN..])?)
    }
}

/// Read the version from a header
pub fn read_header(bytes: &[u8]) -> Result<u32, GrammarLoadError> {
    let Some((header, _)) = bytes.split_first_chunk::<HEADER_LEN>() else {
        return Err(GrammarLoadError::TooShort { len: bytes.len() });
    };
    if header[..4] != MAGIC {
        return Err(GrammarLoadError::BadMagic);
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&header[4..]);
    Ok(u32::from_le_bytes(version))
}

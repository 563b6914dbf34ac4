//! Symbol numbering conventions shared across the pipeline.
//!
//! Symbols are numbered `0..nsyms` with tokens first (`0..ntokens`) and
//! nonterminals last (`ntokens..nsyms`). Token 0 is always `$end`, token 1 is
//! always `error`. This mirrors byacc's own numbering and lets every stage
//! tell a token from a nonterminal with a single comparison against
//! `ntokens` instead of carrying a tag alongside every symbol id.

use std::fmt;

/// A symbol id, valid in `0..nsyms`.
pub type Sym = usize;

/// The end-of-input pseudo-token. Always symbol 0.
pub const END_SYMBOL: Sym = 0;

/// The error-recovery pseudo-token. Always symbol 1.
pub const ERROR_SYMBOL: Sym = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolClass {
    Token,
    NonTerm,
}

/// Declared associativity, used to break shift/reduce and (optionally)
/// reduce/reduce ties of equal precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
    NonAssoc,
    /// Declared with `%precedence` rather than `%left`/`%right`/`%nonassoc`:
    /// sets a symbol's precedence for `%prec` resolution without implying an
    /// associativity of its own. Byacc's `Assoc_t` carries it for the same
    /// reason; it never participates in conflict resolution here either
    /// (only reachable via an explicit `%prec` override already resolved by
    /// the external reader).
    Precedence,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Assoc::None => "none",
            Assoc::Left => "left",
            Assoc::Right => "right",
            Assoc::NonAssoc => "nonassoc",
            Assoc::Precedence => "precedence",
        };
        f.write_str(s)
    }
}

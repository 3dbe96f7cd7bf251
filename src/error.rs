//! Error taxonomy for the scheduling core.
//!
//! Three kinds of failure surface through [`Error`]:
//! - capacity: power-set enumeration over more indexes than a machine-word
//!   bitmask can encode,
//! - input integrity: malformed or inconsistent cost-table text,
//! - external: a live cost oracle reporting a database-layer failure, which
//!   is propagated unchanged (no retry happens here).
//!
//! Infeasibility is *not* an error: a step with no feasible predecessor
//! carries an infinite cumulative cost, and path reconstruction returns a
//! path whose final cost is infinite rather than failing.

use std::io;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Subsets are encoded as a machine-word bitmask, so full enumeration
    /// supports at most 31 indexes. Larger pools go through the splitter and
    /// the greedy builder instead.
    #[error("cannot enumerate the power set of {0} indexes (at most 31 are supported)")]
    Overflow(usize),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Database-layer failure raised by a live cost oracle.
    #[error("cost oracle failed for query `{query}`")]
    Oracle {
        query: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failures while reading the line-oriented cost-table format.
///
/// Every variant except [`ParseError::Io`] carries the 1-based line number
/// at which the problem was detected.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: duplicate index `{name}`")]
    DuplicateIndex { line: usize, name: String },

    #[error("line {line}: duplicate query `{name}`")]
    DuplicateQuery { line: usize, name: String },

    #[error("line {line}: reference to undeclared index `{name}`")]
    UnknownIndex { line: usize, name: String },

    #[error("line {line}: reference to undeclared query `{name}`")]
    UnknownQuery { line: usize, name: String },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ParseError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        ParseError::Malformed {
            line,
            message: message.into(),
        }
    }
}

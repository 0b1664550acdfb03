use thiserror::Error;

/// Failure rewriting one formula.
///
/// A rewrite either produces a complete token stream or fails with one of these; there is no
/// partially rewritten output. Cross-sheet references are not errors, they are passed through.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// A rewriter was handed a token that is not a cell or range reference. The classifier and
    /// the rewriters disagree about which tokens can be expanded.
    #[error("cannot rewrite {ptg}: not a cell or range reference")]
    UnsupportedExpansion { ptg: &'static str },
    /// `rewrite_many` needs at least two target rows.
    #[error("multi-row expansion needs at least 2 target rows, got {count}")]
    TooFewTargets { count: usize },
    /// Moving a reference would place it outside the sheet.
    #[error("row {row} shifted by {delta} falls outside the sheet")]
    RowOutOfBounds { row: u32, delta: i64 },
    /// An aggregate would need more operands than the function accepts.
    #[error("{function} cannot take {count} operands (max {max})")]
    TooManyOperands {
        function: &'static str,
        count: u32,
        max: u8,
    },
    /// A reference expands to several rows but is neither followed by a parenthesis marker nor
    /// (with operator chains enabled) by a value operator.
    #[error(
        "reference to template row {template_row} at token {position} expands to {targets} rows \
         but is not wrapped in parentheses"
    )]
    ParenthesisConventionViolated {
        position: usize,
        template_row: u32,
        targets: usize,
    },
}

impl RewriteError {
    /// Token position the error refers to, when there is one.
    pub fn position(&self) -> Option<usize> {
        match *self {
            RewriteError::ParenthesisConventionViolated { position, .. } => Some(position),
            RewriteError::UnsupportedExpansion { .. }
            | RewriteError::TooFewTargets { .. }
            | RewriteError::RowOutOfBounds { .. }
            | RewriteError::TooManyOperands { .. } => None,
        }
    }
}

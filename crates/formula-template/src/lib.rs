//! Rewrites formula token streams so that references to template rows follow the rows those
//! templates were materialized into.
//!
//! A template sheet holds a row that gets repeated once per data item. Formulas that point at the
//! template row need to point at the materialized rows afterwards:
//! - a reference to a row that became exactly one row is moved there;
//! - a reference written as `(A1)` to a row that became several rows is expanded into one
//!   parenthesized operand per row, and a following `SUM`/variadic aggregate is given the new
//!   operand count;
//! - references into other sheets are left alone.
//!
//! Entry points are [`rewrite_formula`] for one formula, [`rewrite_ptgs`] to reuse a
//! [`RewriteContext`], and [`rewrite_formulas`] for a whole sweep.

mod arity;
mod batch;
mod classify;
mod error;
mod options;
mod rewrite;
mod rows;
mod walker;

pub use arity::{fix_aggregate_arity, is_aggregate_marker};
pub use batch::rewrite_formulas;
pub use classify::{classify, first_supported_row, watched_rows, RowAnchor};
pub use error::RewriteError;
pub use options::{NarrowingPolicy, RewriteOptions};
pub use rewrite::{rewrite_many, rewrite_one, ExpansionStrategy, Lookahead};
pub use rows::{resolve_rows, Row, RowExpansionMap};
pub use walker::{rewrite_formula, rewrite_ptgs, ExpansionCount, RewriteContext, RewriteOutcome};

use serde::{Deserialize, Serialize};

/// What to do when a reference expands to several rows but the formula does not wrap it in
/// parentheses (`(A1)`, `SUM((A1:B1))`), so there is no place to put the extra operands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NarrowingPolicy {
    /// Point the reference at the first materialized row only, and log a warning.
    #[default]
    FirstTarget,
    /// Fail the rewrite with [`crate::RewriteError::ParenthesisConventionViolated`].
    Reject,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RewriteOptions {
    pub narrowing: NarrowingPolicy,
    /// Expand an unparenthesized single-cell reference that feeds a value operator (`A1+B1`)
    /// into an addition chain over all of its rows, instead of narrowing it.
    pub operator_chain: bool,
}

impl RewriteOptions {
    pub fn strict() -> Self {
        Self {
            narrowing: NarrowingPolicy::Reject,
            ..Self::default()
        }
    }
}

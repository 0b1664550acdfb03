//! Single left-to-right pass over a formula's token stream.

use std::collections::BTreeSet;

use formula_ptg::{render_ptgs, Ptg};
use smallvec::{smallvec, SmallVec};

use crate::arity::{fix_aggregate_arity, is_aggregate_marker};
use crate::classify::classify;
use crate::error::RewriteError;
use crate::options::{NarrowingPolicy, RewriteOptions};
use crate::rewrite::{rewrite_many, rewrite_one, ExpansionStrategy, Lookahead};
use crate::rows::{resolve_rows, RowExpansionMap};

/// Operands produced by the most recently rewritten reference.
///
/// Threaded through the pass so an aggregate that follows an expansion can take the right number
/// of operands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExpansionCount {
    /// No watched reference seen yet.
    #[default]
    Initial,
    /// The last watched reference had no materialized rows and was left alone.
    Unchanged,
    /// The last watched reference became this many reference tokens (`1` for one-to-one).
    Rewritten(u32),
}

impl ExpansionCount {
    /// Integer form: `0` initial, `-1` unchanged, `n` rewritten.
    pub fn raw(self) -> i64 {
        match self {
            ExpansionCount::Initial => 0,
            ExpansionCount::Unchanged => -1,
            ExpansionCount::Rewritten(n) => i64::from(n),
        }
    }

    pub fn operand_count(self) -> Option<u32> {
        match self {
            ExpansionCount::Rewritten(n) => Some(n),
            ExpansionCount::Initial | ExpansionCount::Unchanged => None,
        }
    }

    fn rewritten(targets: usize) -> Self {
        ExpansionCount::Rewritten(u32::try_from(targets).unwrap_or(u32::MAX))
    }
}

/// Per-formula rewrite state.
///
/// Holds the template rows to watch and the active expansion maps (borrowed, read-only), and
/// records the outcome of the last [`rewrite_ptgs`] pass.
#[derive(Clone, Debug)]
pub struct RewriteContext<'a> {
    watch_list: &'a BTreeSet<u32>,
    maps: Vec<&'a RowExpansionMap>,
    expansion_count: ExpansionCount,
    formula_changed: bool,
}

impl<'a> RewriteContext<'a> {
    pub fn new(
        watch_list: &'a BTreeSet<u32>,
        maps: impl IntoIterator<Item = &'a RowExpansionMap>,
    ) -> Self {
        Self {
            watch_list,
            maps: maps.into_iter().collect(),
            expansion_count: ExpansionCount::Initial,
            formula_changed: false,
        }
    }

    pub fn watch_list(&self) -> &BTreeSet<u32> {
        self.watch_list
    }

    pub fn maps(&self) -> &[&'a RowExpansionMap] {
        &self.maps
    }

    /// Counter left by the last pass.
    pub fn expansion_count(&self) -> ExpansionCount {
        self.expansion_count
    }

    /// Whether the last pass pointed at least one watched reference at materialized rows.
    pub fn formula_changed(&self) -> bool {
        self.formula_changed
    }
}

/// Result of [`rewrite_formula`].
#[derive(Clone, Debug, PartialEq)]
pub struct RewriteOutcome {
    pub ptgs: Vec<Ptg>,
    pub expansion_count: ExpansionCount,
    pub changed: bool,
}

struct Step {
    produced: SmallVec<[Ptg; 1]>,
    count: ExpansionCount,
    rewritten: bool,
}

impl Step {
    fn passthrough(ptg: Ptg, count: ExpansionCount) -> Self {
        Self {
            produced: smallvec![ptg],
            count,
            rewritten: false,
        }
    }
}

/// Rewrite `ptgs` so watched references follow their materialized rows.
///
/// One pass, left to right, with the expansion counter carried from step to step. On success the
/// final counter and change flag are stored in `ctx`.
pub fn rewrite_ptgs(
    ptgs: &[Ptg],
    ctx: &mut RewriteContext<'_>,
    options: &RewriteOptions,
) -> Result<Vec<Ptg>, RewriteError> {
    let mut out = Vec::with_capacity(ptgs.len());
    let mut changed = false;

    let count = (0..ptgs.len()).try_fold(ExpansionCount::Initial, |count, position| {
        let step = rewrite_step(ptgs, position, ctx, options, count)?;
        changed |= step.rewritten;
        out.extend(step.produced);
        Ok::<_, RewriteError>(step.count)
    })?;

    ctx.expansion_count = count;
    ctx.formula_changed = changed;

    if changed && log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "rewrote formula {} -> {}",
            render_for_log(ptgs),
            render_for_log(&out)
        );
    }

    Ok(out)
}

/// Rewrite one formula with a fresh context.
pub fn rewrite_formula(
    ptgs: &[Ptg],
    watch_list: &BTreeSet<u32>,
    maps: &[&RowExpansionMap],
    options: &RewriteOptions,
) -> Result<RewriteOutcome, RewriteError> {
    let mut ctx = RewriteContext::new(watch_list, maps.iter().copied());
    let rewritten = rewrite_ptgs(ptgs, &mut ctx, options)?;
    Ok(RewriteOutcome {
        ptgs: rewritten,
        expansion_count: ctx.expansion_count(),
        changed: ctx.formula_changed(),
    })
}

fn rewrite_step(
    ptgs: &[Ptg],
    position: usize,
    ctx: &RewriteContext<'_>,
    options: &RewriteOptions,
    count: ExpansionCount,
) -> Result<Step, RewriteError> {
    let ptg = &ptgs[position];
    let original_class = ptg.operand_class();

    let watched = classify(ptg)
        .filter(|anchor| anchor.supported && ctx.watch_list.contains(&anchor.row));
    let Some(anchor) = watched else {
        let out = if is_aggregate_marker(ptg) {
            fix_aggregate_arity(ptg, count)?
        } else {
            ptg.clone()
        };
        return Ok(Step::passthrough(out, count));
    };

    let targets = resolve_rows(anchor.row, &ctx.maps);
    let restore_class = |mut ptg: Ptg| {
        if let Some(class) = original_class {
            ptg.set_operand_class(class);
        }
        ptg
    };

    match targets.len() {
        0 => Ok(Step::passthrough(ptg.clone(), ExpansionCount::Unchanged)),
        1 => Ok(Step {
            produced: smallvec![restore_class(rewrite_one(ptg, targets[0])?)],
            count: ExpansionCount::Rewritten(1),
            rewritten: true,
        }),
        n => {
            let lookahead = Lookahead::scan(ptgs, position);
            let strategy = lookahead.strategy_for(ptg);
            let chain = options.operator_chain && strategy == ExpansionStrategy::OperatorChain;

            if lookahead.next_is_paren || chain {
                log::debug!(
                    "template row {} expands to {n} rows ({strategy:?})",
                    anchor.row
                );
                let produced = rewrite_many(
                    ptg,
                    original_class.unwrap_or_default(),
                    &targets,
                    lookahead,
                )?;
                return Ok(Step {
                    produced: produced.into(),
                    count: ExpansionCount::rewritten(n),
                    rewritten: true,
                });
            }

            match options.narrowing {
                NarrowingPolicy::FirstTarget => {
                    log::warn!(
                        "reference to template row {} at token {position} expands to {n} rows but \
                         is not parenthesized; keeping row {} only",
                        anchor.row,
                        targets[0].row_num()
                    );
                    Ok(Step {
                        produced: smallvec![restore_class(rewrite_one(ptg, targets[0])?)],
                        count: ExpansionCount::Rewritten(1),
                        rewritten: true,
                    })
                }
                NarrowingPolicy::Reject => Err(RewriteError::ParenthesisConventionViolated {
                    position,
                    template_row: anchor.row,
                    targets: n,
                }),
            }
        }
    }
}

fn render_for_log(ptgs: &[Ptg]) -> String {
    match render_ptgs(ptgs) {
        Ok(text) => format!("={text}"),
        Err(err) => format!("<{} tokens: {err}>", ptgs.len()),
    }
}

//! Rewriting every formula of a sheet sweep.
//!
//! Formulas are independent of each other: each gets its own [`RewriteContext`] and the maps are
//! only read, so the sweep runs on a rayon pool when the `parallel` feature is enabled.

use std::collections::BTreeSet;

use formula_ptg::Ptg;

use crate::error::RewriteError;
use crate::options::RewriteOptions;
use crate::rows::RowExpansionMap;
use crate::walker::{rewrite_formula, RewriteOutcome};

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
mod pool {
    use rayon::ThreadPool;
    use std::sync::OnceLock;

    // Crate-local so a failed global pool init never panics a sweep; `None` means run inline.
    static POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

    fn thread_count() -> usize {
        std::env::var("RAYON_NUM_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }

    fn build() -> Option<ThreadPool> {
        let requested = thread_count();
        let try_build = |n| rayon::ThreadPoolBuilder::new().num_threads(n).build();
        match try_build(requested) {
            Ok(pool) => Some(pool),
            Err(err) if requested > 1 => {
                log::warn!("could not start {requested} rewrite threads ({err}); retrying with 1");
                try_build(1).ok()
            }
            Err(err) => {
                log::warn!("could not start rewrite thread pool ({err}); rewriting inline");
                None
            }
        }
    }

    pub(super) fn get() -> Option<&'static ThreadPool> {
        POOL.get_or_init(build).as_ref()
    }
}

/// Rewrite each formula of `formulas` against the same watch list and maps.
///
/// Outcomes are returned in input order. If any formula fails the whole batch fails; which error
/// is reported when several formulas fail is unspecified.
pub fn rewrite_formulas(
    formulas: &[Vec<Ptg>],
    watch_list: &BTreeSet<u32>,
    maps: &[&RowExpansionMap],
    options: &RewriteOptions,
) -> Result<Vec<RewriteOutcome>, RewriteError> {
    let outcomes = run(formulas, |ptgs| {
        rewrite_formula(ptgs, watch_list, maps, options)
    })?;

    log::debug!(
        "rewrote {} of {} formulas against {} template rows",
        outcomes.iter().filter(|o| o.changed).count(),
        formulas.len(),
        watch_list.len()
    );
    Ok(outcomes)
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
fn run<F>(formulas: &[Vec<Ptg>], f: F) -> Result<Vec<RewriteOutcome>, RewriteError>
where
    F: Fn(&[Ptg]) -> Result<RewriteOutcome, RewriteError> + Sync,
{
    use rayon::prelude::*;

    match pool::get() {
        Some(pool) => pool.install(|| formulas.par_iter().map(|ptgs| f(ptgs)).collect()),
        None => formulas.iter().map(|ptgs| f(ptgs)).collect(),
    }
}

#[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
fn run<F>(formulas: &[Vec<Ptg>], f: F) -> Result<Vec<RewriteOutcome>, RewriteError>
where
    F: Fn(&[Ptg]) -> Result<RewriteOutcome, RewriteError>,
{
    formulas.iter().map(|ptgs| f(ptgs)).collect()
}

use std::collections::BTreeSet;

use formula_ptg::Ptg;

/// Row a reference token is anchored to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowAnchor {
    /// Row of a single cell, or first row of a range.
    pub row: u32,
    /// `false` for references into another sheet; those are never rewritten.
    pub supported: bool,
}

/// Extract the anchor row of a reference token.
///
/// Returns `None` for anything that is not a cell or range reference.
pub fn classify(ptg: &Ptg) -> Option<RowAnchor> {
    let (row, supported) = match ptg {
        Ptg::Ref(r) => (r.row, true),
        Ptg::Area(a) => (a.first_row, true),
        Ptg::Ref3d(r) => (r.cell.row, false),
        Ptg::Area3d(a) => (a.area.first_row, false),
        Ptg::Paren
        | Ptg::Op(_)
        | Ptg::Func(_)
        | Ptg::FuncVar(_)
        | Ptg::Attr(_)
        | Ptg::Name(_)
        | Ptg::Int(_)
        | Ptg::Num(_)
        | Ptg::Str(_)
        | Ptg::Bool(_)
        | Ptg::Err(_)
        | Ptg::MissArg => return None,
    };
    Some(RowAnchor { row, supported })
}

/// Anchor row of a same-sheet reference; `None` for cross-sheet references and non-references.
pub fn first_supported_row(ptg: &Ptg) -> Option<u32> {
    classify(ptg)
        .filter(|anchor| anchor.supported)
        .map(|anchor| anchor.row)
}

/// Same-sheet anchor rows of `ptgs` that are on the watch list, in token order.
///
/// Lets callers find out whether a formula needs rewriting without rewriting it.
pub fn watched_rows<'a>(
    ptgs: &'a [Ptg],
    watch_list: &'a BTreeSet<u32>,
) -> impl Iterator<Item = u32> + 'a {
    ptgs.iter()
        .filter_map(first_supported_row)
        .filter(move |row| watch_list.contains(row))
}

//! Rewriting one reference token to point at materialized rows.

use formula_ptg::{Area3dPtg, AreaPtg, OperandClass, Operator, Ptg, Ref3dPtg, RefPtg, EXCEL_MAX_ROW};

use crate::error::RewriteError;
use crate::rows::Row;

/// How a reference expanding to several rows is laid out in the token stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpansionStrategy {
    /// `ref0 ref1 .. refN Add .. Add`: the rows are summed in place, for a reference that feeds
    /// a value operator (`A1+B1` where `A1` becomes several rows).
    OperatorChain,
    /// `ref0 Paren ref1 Paren .. refN`: one parenthesized operand per row, for a reference
    /// written as `(A1)` inside an aggregate (`SUM((A1))` becomes `SUM((A1),(A2),(A3))`).
    ParenthesizedList,
}

/// What follows a reference token in the stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lookahead {
    /// The token right after the reference is `PtgParen`.
    pub next_is_paren: bool,
    /// Scanning forward, the first operator, function or attribute token met is a value
    /// operator.
    pub followed_by_value_operator: bool,
}

impl Lookahead {
    /// Inspect the tokens after `ptgs[position]`.
    ///
    /// The operator scan is unbounded but stops at the first operator, function call or
    /// attribute token; operands and parenthesis markers in between are skipped.
    pub fn scan(ptgs: &[Ptg], position: usize) -> Self {
        let next_is_paren = matches!(ptgs.get(position + 1), Some(Ptg::Paren));

        let mut followed_by_value_operator = false;
        for ptg in ptgs.iter().skip(position + 1) {
            match ptg {
                Ptg::Op(op) => {
                    followed_by_value_operator = op.is_value_operator();
                    break;
                }
                Ptg::Func(_) | Ptg::FuncVar(_) | Ptg::Attr(_) => break,
                _ => {}
            }
        }

        Self {
            next_is_paren,
            followed_by_value_operator,
        }
    }

    /// Strategy for expanding `ptg`. The operator chain only applies to single-cell references
    /// that are not immediately parenthesized.
    pub fn strategy_for(&self, ptg: &Ptg) -> ExpansionStrategy {
        let single_cell = matches!(ptg, Ptg::Ref(_) | Ptg::Ref3d(_));
        if single_cell && self.followed_by_value_operator && !self.next_is_paren {
            ExpansionStrategy::OperatorChain
        } else {
            ExpansionStrategy::ParenthesizedList
        }
    }
}

fn shift_row(row: u32, delta: i64) -> Result<u32, RewriteError> {
    let shifted = i64::from(row) + delta;
    if (0..=i64::from(EXCEL_MAX_ROW)).contains(&shifted) {
        Ok(shifted as u32)
    } else {
        Err(RewriteError::RowOutOfBounds { row, delta })
    }
}

fn retarget_cell(cell: &RefPtg, target: Row) -> Result<RefPtg, RewriteError> {
    let delta = i64::from(target.row_num()) - i64::from(cell.row);
    Ok(RefPtg {
        row: shift_row(cell.row, delta)?,
        ..*cell
    })
}

/// Move the range so it starts at `target`, keeping its height and columns.
fn retarget_area(area: &AreaPtg, target: Row) -> Result<AreaPtg, RewriteError> {
    let delta = i64::from(target.row_num()) - i64::from(area.first_row);
    Ok(AreaPtg {
        first_row: shift_row(area.first_row, delta)?,
        last_row: shift_row(area.last_row, delta)?,
        ..*area
    })
}

/// Rewrite a reference so it points at `target`.
///
/// The result has the same variant, flags, columns, sheet and operand class as `ptg`. Ranges are
/// shifted as a whole. Anything other than a cell or range reference is rejected.
pub fn rewrite_one(ptg: &Ptg, target: Row) -> Result<Ptg, RewriteError> {
    match ptg {
        Ptg::Ref(cell) => Ok(Ptg::Ref(retarget_cell(cell, target)?)),
        Ptg::Ref3d(r) => Ok(Ptg::Ref3d(Ref3dPtg {
            sheet: r.sheet.clone(),
            cell: retarget_cell(&r.cell, target)?,
        })),
        Ptg::Area(area) => Ok(Ptg::Area(retarget_area(area, target)?)),
        Ptg::Area3d(a) => Ok(Ptg::Area3d(Area3dPtg {
            sheet: a.sheet.clone(),
            area: retarget_area(&a.area, target)?,
        })),
        other => Err(RewriteError::UnsupportedExpansion {
            ptg: other.kind_name(),
        }),
    }
}

/// Expand a reference into one operand per target row.
///
/// Produces `2 * targets.len() - 1` tokens laid out according to
/// [`Lookahead::strategy_for`]. Every reference token gets `original_class`, the class the
/// reference had before rewriting started.
pub fn rewrite_many(
    ptg: &Ptg,
    original_class: OperandClass,
    targets: &[Row],
    lookahead: Lookahead,
) -> Result<Vec<Ptg>, RewriteError> {
    if !ptg.is_reference() {
        return Err(RewriteError::UnsupportedExpansion {
            ptg: ptg.kind_name(),
        });
    }
    if targets.len() < 2 {
        return Err(RewriteError::TooFewTargets {
            count: targets.len(),
        });
    }

    let mut out = Vec::with_capacity(targets.len() * 2 - 1);
    match lookahead.strategy_for(ptg) {
        ExpansionStrategy::OperatorChain => {
            for &target in targets {
                out.push(rewrite_one(ptg, target)?.with_operand_class(original_class));
            }
            out.extend(std::iter::repeat(Ptg::Op(Operator::Add)).take(targets.len() - 1));
        }
        ExpansionStrategy::ParenthesizedList => {
            for (i, &target) in targets.iter().enumerate() {
                if i > 0 {
                    out.push(Ptg::Paren);
                }
                out.push(rewrite_one(ptg, target)?.with_operand_class(original_class));
            }
        }
    }
    Ok(out)
}

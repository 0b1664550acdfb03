//! Operand-count repair for aggregates that follow an expanded reference.

use formula_ptg::{function_spec_from_id, AttrPtg, FuncVarPtg, OperandClass, Ptg, FUNCTION_ID_SUM};

use crate::error::RewriteError;
use crate::walker::ExpansionCount;

/// `PtgAttrSum` or `PtgFuncVar`: the tokens whose operand count tracks the expansion.
pub fn is_aggregate_marker(ptg: &Ptg) -> bool {
    matches!(ptg, Ptg::Attr(AttrPtg::Sum) | Ptg::FuncVar(_))
}

/// Make an aggregate consume the operands produced by the preceding rewritten reference.
///
/// Only acts when `count` is [`ExpansionCount::Rewritten`]:
/// - `PtgAttrSum` becomes an explicit `SUM` call over `n` operands;
/// - a `PtgFuncVar` declaring a different count is re-created with `n` operands, keeping its
///   function and operand class.
///
/// Everything else is returned unchanged.
pub fn fix_aggregate_arity(ptg: &Ptg, count: ExpansionCount) -> Result<Ptg, RewriteError> {
    let Some(n) = count.operand_count() else {
        return Ok(ptg.clone());
    };

    match ptg {
        Ptg::Attr(AttrPtg::Sum) => Ok(Ptg::FuncVar(FuncVarPtg {
            id: FUNCTION_ID_SUM,
            arg_count: checked_arg_count(FUNCTION_ID_SUM, n)?,
            class: OperandClass::Value,
        })),
        Ptg::FuncVar(func) if u32::from(func.arg_count) != n => Ok(Ptg::FuncVar(FuncVarPtg {
            arg_count: checked_arg_count(func.id, n)?,
            ..*func
        })),
        _ => Ok(ptg.clone()),
    }
}

fn checked_arg_count(id: u16, count: u32) -> Result<u8, RewriteError> {
    let spec = function_spec_from_id(id);
    let max = spec.map_or(u8::MAX, |spec| spec.max_args);
    match u8::try_from(count) {
        Ok(arg_count) if arg_count <= max => Ok(arg_count),
        _ => Err(RewriteError::TooManyOperands {
            function: spec.map_or("function", |spec| spec.name),
            count,
            max,
        }),
    }
}

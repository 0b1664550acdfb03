//! Best-effort rendering of a token stream into A1 formula text.
//!
//! Rendering evaluates the reverse-Polish stream against a stack of text fragments, the same way
//! an `rgce` decoder does. It is meant for diagnostics: defined names and XTI sheet indexes are
//! rendered as stable placeholders (`Name1`, `Sheet1`) because no workbook metadata is available.

use crate::format::push_cell_ref;
use crate::function_ids::function_spec_from_id;
use crate::ptg::{AreaPtg, AttrPtg, Operator, Ptg, RefPtg, SheetScope};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("stack underflow rendering {ptg} at token {position}")]
    StackUnderflow { position: usize, ptg: &'static str },
    #[error("unknown function id {id} at token {position}")]
    UnknownFunction { position: usize, id: u16 },
    #[error("invalid error constant 0x{value:02X} at token {position}")]
    InvalidConstant { position: usize, value: u8 },
    #[error("formula rendered with stack_len={stack_len} (expected 1)")]
    StackNotSingular { stack_len: usize },
}

impl RenderError {
    pub fn position(&self) -> Option<usize> {
        match *self {
            RenderError::StackUnderflow { position, .. }
            | RenderError::UnknownFunction { position, .. }
            | RenderError::InvalidConstant { position, .. } => Some(position),
            RenderError::StackNotSingular { .. } => None,
        }
    }
}

/// Render `ptgs` as formula text without the leading `=`.
pub fn render_ptgs(ptgs: &[Ptg]) -> Result<String, RenderError> {
    if ptgs.is_empty() {
        return Ok(String::new());
    }

    let mut stack: Vec<String> = Vec::with_capacity(ptgs.len());

    for (position, ptg) in ptgs.iter().enumerate() {
        let underflow = || RenderError::StackUnderflow {
            position,
            ptg: ptg.kind_name(),
        };

        match ptg {
            Ptg::Ref(r) => stack.push(ref_text(r)),
            Ptg::Area(a) => stack.push(area_text(a)),
            Ptg::Ref3d(r) => {
                let mut text = sheet_prefix(&r.sheet);
                text.push_str(&ref_text(&r.cell));
                stack.push(text);
            }
            Ptg::Area3d(a) => {
                let mut text = sheet_prefix(&a.sheet);
                text.push_str(&area_text(&a.area));
                stack.push(text);
            }
            Ptg::Paren => {
                let inner = stack.pop().ok_or_else(underflow)?;
                stack.push(format!("({inner})"));
            }
            Ptg::Op(op) if op.is_unary() => {
                let operand = stack.pop().ok_or_else(underflow)?;
                stack.push(match op {
                    Operator::Percent => format!("{operand}%"),
                    _ => format!("{}{operand}", op.symbol()),
                });
            }
            Ptg::Op(op) => {
                let rhs = stack.pop().ok_or_else(underflow)?;
                let lhs = stack.pop().ok_or_else(underflow)?;
                stack.push(format!("{lhs}{}{rhs}", op.symbol()));
            }
            Ptg::Func(func) => {
                let spec = function_spec_from_id(func.id).ok_or(RenderError::UnknownFunction {
                    position,
                    id: func.id,
                })?;
                let call = render_call(&mut stack, spec.name, spec.min_args as usize)
                    .ok_or_else(underflow)?;
                stack.push(call);
            }
            Ptg::FuncVar(func) => {
                let name = func.name().ok_or(RenderError::UnknownFunction {
                    position,
                    id: func.id,
                })?;
                let call = render_call(&mut stack, name, func.arg_count as usize)
                    .ok_or_else(underflow)?;
                stack.push(call);
            }
            Ptg::Attr(AttrPtg::Sum) => {
                let inner = stack.pop().ok_or_else(underflow)?;
                stack.push(format!("SUM({inner})"));
            }
            // Jumps, spacing and volatility do not change the rendered text.
            Ptg::Attr(_) => {}
            Ptg::Name(name) => stack.push(format!("Name{}", name.index)),
            Ptg::Int(n) => stack.push(n.to_string()),
            Ptg::Num(n) => stack.push(n.to_string()),
            Ptg::Str(s) => stack.push(format!("\"{}\"", s.replace('"', "\"\""))),
            Ptg::Bool(b) => stack.push(if *b { "TRUE" } else { "FALSE" }.to_string()),
            Ptg::Err(code) => {
                let literal = error_literal(*code).ok_or(RenderError::InvalidConstant {
                    position,
                    value: *code,
                })?;
                stack.push(literal.to_string());
            }
            Ptg::MissArg => stack.push(String::new()),
        }
    }

    match stack.len() {
        1 => Ok(stack.pop().unwrap_or_default()),
        stack_len => Err(RenderError::StackNotSingular { stack_len }),
    }
}

fn render_call(stack: &mut Vec<String>, name: &str, argc: usize) -> Option<String> {
    if stack.len() < argc {
        return None;
    }
    let args = stack.split_off(stack.len() - argc);
    Some(format!("{name}({})", args.join(",")))
}

fn ref_text(r: &RefPtg) -> String {
    let mut out = String::new();
    push_cell_ref(r.row, r.col, r.row_relative, r.col_relative, &mut out);
    out
}

fn area_text(a: &AreaPtg) -> String {
    let mut out = String::new();
    push_cell_ref(
        a.first_row,
        a.first_col,
        a.first_row_relative,
        a.first_col_relative,
        &mut out,
    );
    out.push(':');
    push_cell_ref(
        a.last_row,
        a.last_col,
        a.last_row_relative,
        a.last_col_relative,
        &mut out,
    );
    out
}

fn sheet_prefix(sheet: &SheetScope) -> String {
    match sheet {
        SheetScope::Extern { ixti } => format!("Sheet{}!", u32::from(*ixti) + 1),
        SheetScope::Named {
            workbook,
            first,
            last,
        } => {
            let mut name = String::new();
            if let Some(book) = workbook {
                name.push_str(&format!("[{book}]"));
            }
            name.push_str(first);
            if let Some(last) = last {
                name.push(':');
                name.push_str(last);
            }
            let quote = needs_quotes(first) || last.as_deref().is_some_and(needs_quotes);
            if quote {
                format!("'{}'!", name.replace('\'', "''"))
            } else {
                format!("{name}!")
            }
        }
    }
}

fn needs_quotes(sheet: &str) -> bool {
    let starts_with_digit = sheet.chars().next().is_some_and(|c| c.is_ascii_digit());
    starts_with_digit
        || sheet.is_empty()
        || !sheet.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

fn error_literal(code: u8) -> Option<&'static str> {
    match code {
        0x00 => Some("#NULL!"),
        0x07 => Some("#DIV/0!"),
        0x0F => Some("#VALUE!"),
        0x17 => Some("#REF!"),
        0x1D => Some("#NAME?"),
        0x24 => Some("#NUM!"),
        0x2A => Some("#N/A"),
        0x2B => Some("#GETTING_DATA"),
        _ => None,
    }
}

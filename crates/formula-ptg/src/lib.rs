//! Parsed formula tokens (`Ptg`) in the flat, reverse-Polish layout used by BIFF8/BIFF12 `rgce`
//! streams.
//!
//! This crate only models the token stream; it does not parse formula text or encode bytes.
//! - [`Ptg`] and its payload structs describe one token each.
//! - [`function_ids`] maps BIFF `iftab` ids to function names for the functions that show up
//!   around expanded references (aggregates like `SUM`).
//! - [`render_ptgs`] renders a token stream into best-effort A1 formula text. It exists for
//!   diagnostics (log lines, test assertions), not for round-tripping.

pub mod display;
pub mod format;
pub mod function_ids;
mod ptg;

pub use display::{render_ptgs, RenderError};
pub use function_ids::{
    function_id_to_name, function_name_to_id, function_spec_from_id, FunctionSpec,
    FUNCTION_ID_SUM,
};
pub use ptg::{
    Area3dPtg, AreaPtg, AttrPtg, FuncPtg, FuncVarPtg, NamePtg, OperandClass, Operator, Ptg,
    Ref3dPtg, RefPtg, SheetScope,
};

/// Largest 0-based row index in an Excel 2007+ worksheet (`1_048_576` rows).
pub const EXCEL_MAX_ROW: u32 = 0x000F_FFFF;

/// Largest 0-based column index in an Excel 2007+ worksheet (`XFD`).
pub const EXCEL_MAX_COL: u32 = 0x3FFF;

//! BIFF built-in function ids (`iftab`) for the functions this workspace needs to name.
//!
//! The ids index Excel's fixed function table and are shared by BIFF8 and BIFF12. Only a small
//! subset is listed: the variadic aggregates that wrap expanded template references, plus a few
//! fixed-arity functions so diagnostic rendering can show common formulas.

/// `iftab` of `SUM`, the function behind `PtgAttrSum`.
pub const FUNCTION_ID_SUM: u16 = 0x0004;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSpec {
    pub id: u16,
    pub name: &'static str,
    pub min_args: u8,
    pub max_args: u8,
}

impl FunctionSpec {
    pub const fn is_variadic(&self) -> bool {
        self.min_args != self.max_args
    }
}

const fn spec(id: u16, name: &'static str, min_args: u8, max_args: u8) -> FunctionSpec {
    FunctionSpec {
        id,
        name,
        min_args,
        max_args,
    }
}

pub(crate) const FUNCTION_SPECS: &[FunctionSpec] = &[
    // Aggregates
    spec(0x0000, "COUNT", 0, 255),
    spec(FUNCTION_ID_SUM, "SUM", 0, 255),
    spec(0x0005, "AVERAGE", 1, 255),
    spec(0x0006, "MIN", 1, 255),
    spec(0x0007, "MAX", 1, 255),
    spec(0x000C, "STDEV", 1, 255),
    spec(0x002E, "VAR", 1, 255),
    spec(0x00A9, "COUNTA", 0, 255),
    spec(0x00B7, "PRODUCT", 0, 255),
    spec(0x00C1, "STDEVP", 1, 255),
    spec(0x00C2, "VARP", 1, 255),
    spec(0x00E3, "MEDIAN", 1, 255),
    spec(0x00E4, "SUMPRODUCT", 1, 255),
    spec(0x0169, "AVERAGEA", 1, 255),
    spec(0x016A, "MAXA", 1, 255),
    spec(0x016B, "MINA", 1, 255),
    // Logical / text
    spec(0x0001, "IF", 2, 3),
    spec(0x0024, "AND", 1, 255),
    spec(0x0025, "OR", 1, 255),
    spec(0x0150, "CONCATENATE", 1, 255),
    // Fixed arity
    spec(0x0013, "PI", 0, 0),
    spec(0x0018, "ABS", 1, 1),
    spec(0x0019, "INT", 1, 1),
    spec(0x001B, "ROUND", 2, 2),
    spec(0x004A, "NOW", 0, 0),
];

pub fn function_name_to_id(name: &str) -> Option<u16> {
    let name = name.trim();
    FUNCTION_SPECS
        .iter()
        .find(|spec| spec.name.eq_ignore_ascii_case(name))
        .map(|spec| spec.id)
}

pub fn function_id_to_name(id: u16) -> Option<&'static str> {
    function_spec_from_id(id).map(|spec| spec.name)
}

pub fn function_spec_from_id(id: u16) -> Option<FunctionSpec> {
    FUNCTION_SPECS.iter().find(|spec| spec.id == id).copied()
}

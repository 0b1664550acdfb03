use serde::{Deserialize, Serialize};

use crate::function_ids::{function_id_to_name, function_name_to_id};

/// Operand class of a classified token (`ptgClass`).
///
/// BIFF folds the class into the high bits of the ptg id (`PtgRef` is `0x24`, `0x44` or `0x64`
/// depending on class). Base tokens (operators, constants, attributes) carry no class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum OperandClass {
    #[default]
    Reference = 0x00,
    Value = 0x20,
    Array = 0x40,
}

impl OperandClass {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Reference),
            0x20 => Some(Self::Value),
            0x40 => Some(Self::Array),
            _ => None,
        }
    }
}

/// Sheet a 3D reference points at.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetScope {
    /// Index into the workbook's `ExternSheet` (XTI) table, as stored by `PtgRef3d`.
    Extern { ixti: u16 },
    /// Resolved sheet name(s), optionally in another workbook (`[1]Sheet1!A1`) or spanning
    /// several sheets (`Sheet1:Sheet3!A1`).
    Named {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workbook: Option<u32>,
        first: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last: Option<String>,
    },
}

impl SheetScope {
    pub fn named(name: impl Into<String>) -> Self {
        SheetScope::Named {
            workbook: None,
            first: name.into(),
            last: None,
        }
    }
}

/// Single-cell reference on the formula's own sheet (`PtgRef`).
///
/// Rows and columns are 0-based.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefPtg {
    pub row: u32,
    pub col: u32,
    pub row_relative: bool,
    pub col_relative: bool,
    pub class: OperandClass,
}

impl RefPtg {
    /// Fully relative reference (`A1` style) with the default reference class.
    pub const fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_relative: true,
            col_relative: true,
            class: OperandClass::Reference,
        }
    }
}

/// Range reference on the formula's own sheet (`PtgArea`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaPtg {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u32,
    pub last_col: u32,
    pub first_row_relative: bool,
    pub last_row_relative: bool,
    pub first_col_relative: bool,
    pub last_col_relative: bool,
    pub class: OperandClass,
}

impl AreaPtg {
    /// Fully relative range (`A1:B2` style) with the default reference class.
    pub const fn new(first_row: u32, first_col: u32, last_row: u32, last_col: u32) -> Self {
        Self {
            first_row,
            last_row,
            first_col,
            last_col,
            first_row_relative: true,
            last_row_relative: true,
            first_col_relative: true,
            last_col_relative: true,
            class: OperandClass::Reference,
        }
    }

    /// Number of rows spanned minus one.
    pub fn height(&self) -> u32 {
        self.last_row.saturating_sub(self.first_row)
    }
}

/// Single-cell reference on another sheet (`PtgRef3d`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ref3dPtg {
    pub sheet: SheetScope,
    pub cell: RefPtg,
}

/// Range reference on another sheet (`PtgArea3d`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area3dPtg {
    pub sheet: SheetScope,
    pub area: AreaPtg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    Concat,
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
    Intersect,
    Union,
    Range,
    UnaryPlus,
    UnaryMinus,
    Percent,
}

impl Operator {
    /// Operators that compute a value from their operands (`ValueOperatorPtg`). The reference
    /// operators (`:`, `,`, ` `) combine references instead.
    pub const fn is_value_operator(self) -> bool {
        !matches!(self, Operator::Intersect | Operator::Union | Operator::Range)
    }

    pub const fn is_unary(self) -> bool {
        matches!(
            self,
            Operator::UnaryPlus | Operator::UnaryMinus | Operator::Percent
        )
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Operator::Add | Operator::UnaryPlus => "+",
            Operator::Sub | Operator::UnaryMinus => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Power => "^",
            Operator::Concat => "&",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Eq => "=",
            Operator::Ge => ">=",
            Operator::Gt => ">",
            Operator::Ne => "<>",
            Operator::Intersect => " ",
            Operator::Union => ",",
            Operator::Range => ":",
            Operator::Percent => "%",
        }
    }
}

/// Fixed-arity built-in function call (`PtgFunc`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuncPtg {
    pub id: u16,
    pub class: OperandClass,
}

/// Variable-arity built-in function call (`PtgFuncVar`): the operand count is explicit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuncVarPtg {
    pub id: u16,
    pub arg_count: u8,
    pub class: OperandClass,
}

impl FuncVarPtg {
    /// Build a call to the named built-in with `arg_count` operands, in value class.
    ///
    /// Returns `None` when the name is not in the function table.
    pub fn create(name: &str, arg_count: u8) -> Option<Self> {
        let id = function_name_to_id(name)?;
        Some(Self {
            id,
            arg_count,
            class: OperandClass::Value,
        })
    }

    pub fn name(&self) -> Option<&'static str> {
        function_id_to_name(self.id)
    }
}

/// Attribute tokens (`PtgAttr*`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttrPtg {
    /// `PtgAttrSum`: `SUM` over the single preceding operand, with no declared count.
    Sum,
    /// `PtgAttrSemi`: marks the formula volatile.
    Volatile,
    /// `PtgAttrSpace`: whitespace preserved for display.
    Space { kind: u8, count: u8 },
    /// `PtgAttrIf`: jump offset for the false branch of `IF`.
    If { offset: u16 },
    /// `PtgAttrChoose`: jump table of `CHOOSE`.
    Choose { offsets: Vec<u16> },
    /// `PtgAttrGoto`: unconditional jump.
    Goto { offset: u16 },
}

/// Defined name reference (`PtgName`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamePtg {
    pub index: u32,
    pub class: OperandClass,
}

/// One parsed formula token.
///
/// A formula is a `Vec<Ptg>` in reverse-Polish order: operands come first, operators and
/// function calls follow the operands they consume. Adjacency is meaningful; there is no tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ptg {
    Ref(RefPtg),
    Ref3d(Ref3dPtg),
    Area(AreaPtg),
    Area3d(Area3dPtg),
    /// `PtgParen`: the preceding operand was written in parentheses.
    Paren,
    Op(Operator),
    Func(FuncPtg),
    FuncVar(FuncVarPtg),
    Attr(AttrPtg),
    Name(NamePtg),
    Int(u16),
    Num(f64),
    Str(String),
    Bool(bool),
    Err(u8),
    MissArg,
}

impl Ptg {
    /// Tokens without an operand class (operators, constants, attributes, parenthesis).
    pub fn is_base_token(&self) -> bool {
        self.operand_class().is_none()
    }

    /// Single-cell or range reference, on this sheet or another.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Ptg::Ref(_) | Ptg::Ref3d(_) | Ptg::Area(_) | Ptg::Area3d(_)
        )
    }

    pub fn operand_class(&self) -> Option<OperandClass> {
        match self {
            Ptg::Ref(r) => Some(r.class),
            Ptg::Ref3d(r) => Some(r.cell.class),
            Ptg::Area(a) => Some(a.class),
            Ptg::Area3d(a) => Some(a.area.class),
            Ptg::Func(f) => Some(f.class),
            Ptg::FuncVar(f) => Some(f.class),
            Ptg::Name(n) => Some(n.class),
            Ptg::Paren
            | Ptg::Op(_)
            | Ptg::Attr(_)
            | Ptg::Int(_)
            | Ptg::Num(_)
            | Ptg::Str(_)
            | Ptg::Bool(_)
            | Ptg::Err(_)
            | Ptg::MissArg => None,
        }
    }

    /// Set the operand class; no-op on base tokens.
    pub fn set_operand_class(&mut self, class: OperandClass) {
        match self {
            Ptg::Ref(r) => r.class = class,
            Ptg::Ref3d(r) => r.cell.class = class,
            Ptg::Area(a) => a.class = class,
            Ptg::Area3d(a) => a.area.class = class,
            Ptg::Func(f) => f.class = class,
            Ptg::FuncVar(f) => f.class = class,
            Ptg::Name(n) => n.class = class,
            _ => {}
        }
    }

    pub fn with_operand_class(mut self, class: OperandClass) -> Self {
        self.set_operand_class(class);
        self
    }

    /// MS-XLSB style token name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Ptg::Ref(_) => "PtgRef",
            Ptg::Ref3d(_) => "PtgRef3d",
            Ptg::Area(_) => "PtgArea",
            Ptg::Area3d(_) => "PtgArea3d",
            Ptg::Paren => "PtgParen",
            Ptg::Op(_) => "PtgOperator",
            Ptg::Func(_) => "PtgFunc",
            Ptg::FuncVar(_) => "PtgFuncVar",
            Ptg::Attr(AttrPtg::Sum) => "PtgAttrSum",
            Ptg::Attr(_) => "PtgAttr",
            Ptg::Name(_) => "PtgName",
            Ptg::Int(_) => "PtgInt",
            Ptg::Num(_) => "PtgNum",
            Ptg::Str(_) => "PtgStr",
            Ptg::Bool(_) => "PtgBool",
            Ptg::Err(_) => "PtgErr",
            Ptg::MissArg => "PtgMissArg",
        }
    }
}

impl From<RefPtg> for Ptg {
    fn from(value: RefPtg) -> Self {
        Ptg::Ref(value)
    }
}

impl From<AreaPtg> for Ptg {
    fn from(value: AreaPtg) -> Self {
        Ptg::Area(value)
    }
}

impl From<Ref3dPtg> for Ptg {
    fn from(value: Ref3dPtg) -> Self {
        Ptg::Ref3d(value)
    }
}

impl From<Area3dPtg> for Ptg {
    fn from(value: Area3dPtg) -> Self {
        Ptg::Area3d(value)
    }
}

impl From<FuncVarPtg> for Ptg {
    fn from(value: FuncVarPtg) -> Self {
        Ptg::FuncVar(value)
    }
}

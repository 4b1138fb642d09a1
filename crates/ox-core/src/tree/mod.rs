//! The target tree IR consumed by the code-generation backend.
//!
//! Unlike a CFG-based mid-level IR this stays tree shaped: expressions own
//! their operands, statements nest blocks, and control flow inside a match
//! is expressed with a single-value switch plus case labels and gotos.

pub mod fold;

use crate::hir::{BinOp, CmpOp, UnOp};
use crate::span::Span;

pub type VarId = u32;
pub type FnId = u32;
pub type LabelId = u32;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeTy {
    Void,
    Error,
    Bool,
    Char,
    Byte,
    Int { bits: u8, signed: bool },
    Float { bits: u8 },
    Pointer(Box<TreeTy>),
    /// A two-field {data pointer, length} reference to a dynamically-sized
    /// view. Already reference-like; taking its address is a no-op.
    FatPointer(Box<TreeTy>),
    Record { fields: Vec<TreeTy> },
    /// A tagged union; each variant is a record whose first field is the
    /// discriminant.
    Union { variants: Vec<TreeTy> },
    Array { elem: Box<TreeTy>, len: u64 },
    FnPtr { params: Vec<TreeTy>, ret: Box<TreeTy> },
}

impl TreeTy {
    pub fn is_error(&self) -> bool {
        matches!(self, TreeTy::Error)
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, TreeTy::FatPointer(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TreeTy::Pointer(_))
    }

    pub fn pointee(&self) -> Option<&TreeTy> {
        match self {
            TreeTy::Pointer(to) => Some(to),
            _ => None,
        }
    }

    pub fn field_ty(&self, index: usize) -> Option<&TreeTy> {
        match self {
            TreeTy::Record { fields } => fields.get(index),
            TreeTy::Union { variants } => variants.get(index),
            TreeTy::FatPointer(_) => None,
            _ => None,
        }
    }

    /// Element count of a fixed-size array's index domain.
    pub fn domain_len(&self) -> Option<u64> {
        match self {
            TreeTy::Array { len, .. } => Some(*len),
            _ => None,
        }
    }

    pub fn element_ty(&self) -> Option<&TreeTy> {
        match self {
            TreeTy::Array { elem, .. } => Some(elem),
            TreeTy::FatPointer(elem) => Some(elem),
            TreeTy::Pointer(to) => Some(to),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeExpr {
    pub kind: TreeExprKind,
    pub ty: TreeTy,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeExprKind {
    /// The designated error sentinel; downstream lowering keeps going
    /// without cascading.
    Error,
    Unit,
    BoolConst(bool),
    IntConst(i128),
    FloatConst(f64),
    CharConst(char),
    ByteConst(u8),
    StringConst(String),
    Var(VarId),
    FnAddr(FnId),
    AddressOf(Box<TreeExpr>),
    Indirect {
        value: Box<TreeExpr>,
        known_valid: bool,
    },
    ArithmeticOrLogical {
        op: BinOp,
        lhs: Box<TreeExpr>,
        rhs: Box<TreeExpr>,
    },
    Comparison {
        op: CmpOp,
        lhs: Box<TreeExpr>,
        rhs: Box<TreeExpr>,
    },
    Negation {
        op: UnOp,
        operand: Box<TreeExpr>,
    },
    FieldAccess {
        base: Box<TreeExpr>,
        index: usize,
    },
    ArrayIndex {
        base: Box<TreeExpr>,
        index: Box<TreeExpr>,
    },
    /// Record/union constructor. For tagged unions `union_discriminator`
    /// selects the variant and `fields` leads with the discriminant value.
    Constructor {
        is_union: bool,
        union_discriminator: Option<usize>,
        fields: Vec<TreeExpr>,
    },
    ArrayCtor {
        indexes: Vec<u64>,
        values: Vec<TreeExpr>,
    },
    Call {
        callee: Box<TreeExpr>,
        args: Vec<TreeExpr>,
    },
    /// A function-pointer value fetched from a trait object's vtable:
    /// `object.vtable[slot]`, kept symbolic for the backend.
    VtableRef {
        vtable: Box<TreeExpr>,
        object: Box<TreeExpr>,
        slot: usize,
    },
    /// Execute `block` for effect, then yield `value`.
    Compound {
        block: TreeBlock,
        value: Box<TreeExpr>,
    },
}

impl TreeExpr {
    pub fn new(kind: TreeExprKind, ty: TreeTy, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn error(span: Span) -> Self {
        Self::new(TreeExprKind::Error, TreeTy::Error, span)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TreeExprKind::Error)
    }

    pub fn unit(span: Span) -> Self {
        Self::new(TreeExprKind::Unit, TreeTy::Void, span)
    }

    pub fn bool_const(value: bool, span: Span) -> Self {
        Self::new(TreeExprKind::BoolConst(value), TreeTy::Bool, span)
    }

    pub fn int_const(value: i128, ty: TreeTy, span: Span) -> Self {
        Self::new(TreeExprKind::IntConst(value), ty, span)
    }

    pub fn float_const(value: f64, ty: TreeTy, span: Span) -> Self {
        Self::new(TreeExprKind::FloatConst(value), ty, span)
    }

    pub fn char_const(value: char, span: Span) -> Self {
        Self::new(TreeExprKind::CharConst(value), TreeTy::Char, span)
    }

    pub fn byte_const(value: u8, span: Span) -> Self {
        Self::new(TreeExprKind::ByteConst(value), TreeTy::Byte, span)
    }

    pub fn string_const(value: impl Into<String>, span: Span) -> Self {
        let value = value.into();
        let len = value.len() as u64;
        Self::new(
            TreeExprKind::StringConst(value),
            TreeTy::Array {
                elem: Box::new(TreeTy::Byte),
                len,
            },
            span,
        )
    }

    pub fn var(var: VarId, ty: TreeTy, span: Span) -> Self {
        Self::new(TreeExprKind::Var(var), ty, span)
    }

    pub fn fn_addr(id: FnId, ty: TreeTy, span: Span) -> Self {
        Self::new(TreeExprKind::FnAddr(id), ty, span)
    }

    /// Address-of with an explicit pointer type.
    pub fn address_of(operand: TreeExpr, ptr_ty: TreeTy, span: Span) -> Self {
        if operand.is_error() {
            return Self::error(span);
        }
        Self::new(TreeExprKind::AddressOf(Box::new(operand)), ptr_ty, span)
    }

    pub fn indirect(expected: TreeTy, value: TreeExpr, known_valid: bool, span: Span) -> Self {
        if value.is_error() {
            return Self::error(span);
        }
        Self::new(
            TreeExprKind::Indirect {
                value: Box::new(value),
                known_valid,
            },
            expected,
            span,
        )
    }

    pub fn arithmetic_or_logical(op: BinOp, lhs: TreeExpr, rhs: TreeExpr, span: Span) -> Self {
        if lhs.is_error() || rhs.is_error() {
            return Self::error(span);
        }
        let ty = lhs.ty.clone();
        Self::new(
            TreeExprKind::ArithmeticOrLogical {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            span,
        )
    }

    pub fn comparison(op: CmpOp, lhs: TreeExpr, rhs: TreeExpr, span: Span) -> Self {
        if lhs.is_error() || rhs.is_error() {
            return Self::error(span);
        }
        Self::new(
            TreeExprKind::Comparison {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            TreeTy::Bool,
            span,
        )
    }

    pub fn negation(op: UnOp, operand: TreeExpr, span: Span) -> Self {
        if operand.is_error() {
            return Self::error(span);
        }
        let ty = operand.ty.clone();
        Self::new(
            TreeExprKind::Negation {
                op,
                operand: Box::new(operand),
            },
            ty,
            span,
        )
    }

    pub fn field(base: TreeExpr, index: usize, span: Span) -> Self {
        if base.is_error() {
            return Self::error(span);
        }
        let ty = base.ty.field_ty(index).cloned().unwrap_or(TreeTy::Error);
        Self::new(
            TreeExprKind::FieldAccess {
                base: Box::new(base),
                index,
            },
            ty,
            span,
        )
    }

    pub fn array_index(base: TreeExpr, index: TreeExpr, span: Span) -> Self {
        if base.is_error() || index.is_error() {
            return Self::error(span);
        }
        let ty = base.ty.element_ty().cloned().unwrap_or(TreeTy::Error);
        Self::new(
            TreeExprKind::ArrayIndex {
                base: Box::new(base),
                index: Box::new(index),
            },
            ty,
            span,
        )
    }

    pub fn constructor(
        ty: TreeTy,
        is_union: bool,
        union_discriminator: Option<usize>,
        fields: Vec<TreeExpr>,
        span: Span,
    ) -> Self {
        if fields.iter().any(TreeExpr::is_error) {
            return Self::error(span);
        }
        Self::new(
            TreeExprKind::Constructor {
                is_union,
                union_discriminator,
                fields,
            },
            ty,
            span,
        )
    }

    pub fn array_ctor(ty: TreeTy, indexes: Vec<u64>, values: Vec<TreeExpr>, span: Span) -> Self {
        if values.iter().any(TreeExpr::is_error) {
            return Self::error(span);
        }
        Self::new(TreeExprKind::ArrayCtor { indexes, values }, ty, span)
    }

    pub fn call(callee: TreeExpr, args: Vec<TreeExpr>, span: Span) -> Self {
        if callee.is_error() || args.iter().any(TreeExpr::is_error) {
            return Self::error(span);
        }
        let ty = match &callee.ty {
            TreeTy::FnPtr { ret, .. } => (**ret).clone(),
            _ => TreeTy::Error,
        };
        Self::new(
            TreeExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            ty,
            span,
        )
    }

    pub fn vtable_ref(
        vtable: TreeExpr,
        object: TreeExpr,
        slot: usize,
        fn_ptr_ty: TreeTy,
        span: Span,
    ) -> Self {
        if vtable.is_error() || object.is_error() {
            return Self::error(span);
        }
        Self::new(
            TreeExprKind::VtableRef {
                vtable: Box::new(vtable),
                object: Box::new(object),
                slot,
            },
            fn_ptr_ty,
            span,
        )
    }

    pub fn compound(block: TreeBlock, value: TreeExpr, span: Span) -> Self {
        let ty = value.ty.clone();
        Self::new(
            TreeExprKind::Compound {
                block,
                value: Box::new(value),
            },
            ty,
            span,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeStmt {
    Expr(TreeExpr),
    Assign {
        lhs: TreeExpr,
        rhs: TreeExpr,
    },
    VarDecl {
        var: VarId,
        init: Option<TreeExpr>,
    },
    /// Single-value switch; the body holds case labels, arm statements and
    /// gotos to the shared end label.
    Switch {
        value: TreeExpr,
        body: TreeBlock,
    },
    /// `value: None` is the default label.
    CaseLabel {
        value: Option<TreeExpr>,
        label: LabelId,
    },
    Goto(LabelId),
    LabelDef(LabelId),
    /// Runtime element-by-element initialization loop for a copy-repeated
    /// array; a single backend primitive.
    ArrayInit {
        var: VarId,
        capacity: TreeExpr,
        value: TreeExpr,
    },
    Block(TreeBlock),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TreeBlock {
    pub stmts: Vec<TreeStmt>,
}

impl TreeBlock {
    pub fn new() -> Self {
        Self { stmts: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub id: VarId,
    pub name: String,
    pub ty: TreeTy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeFunction {
    pub id: FnId,
    pub name: String,
    pub params: Vec<Var>,
    pub ret: TreeTy,
    pub body: Option<TreeBlock>,
}

impl TreeFunction {
    pub fn fn_ptr_ty(&self) -> TreeTy {
        TreeTy::FnPtr {
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
            ret: Box::new(self.ret.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TreeProgram {
    pub functions: Vec<TreeFunction>,
}

//! Implicit coercion steps recorded by type inference.
//!
//! An adjustment sequence transforms a compiled value's representation
//! (indirection level, fat-pointer shape) without ever changing the value
//! itself. Sequences apply strictly left to right.

use crate::hir::HirId;
use crate::types::{FnTy, Ty};

#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub kind: AdjustmentKind,
    /// The type the value has after this step.
    pub expected: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdjustmentKind {
    /// Poisoned by an upstream error; the value collapses to the sentinel.
    Error,
    /// Take an immutable reference.
    ImmRef,
    /// Take a mutable reference.
    MutRef,
    /// Call the overloaded `Deref` impl.
    Deref(DerefOverload),
    /// Call the overloaded `DerefMut` impl.
    DerefMut(DerefOverload),
    /// Plain load through a pointer the upstream stages guarantee valid.
    Indirection,
    /// Build a fat pointer from a fixed-size array.
    Unsize,
}

/// The operator-overload target an overloaded deref step dispatches to.
#[derive(Debug, Clone, PartialEq)]
pub struct DerefOverload {
    pub fn_ty: FnTy,
    pub impl_item: HirId,
}

impl Adjustment {
    pub fn new(kind: AdjustmentKind, expected: Ty) -> Self {
        Self { kind, expected }
    }

    pub fn is_deref_adjustment(&self) -> bool {
        matches!(self.kind, AdjustmentKind::Deref(_))
    }

    pub fn is_deref_mut_adjustment(&self) -> bool {
        matches!(self.kind, AdjustmentKind::DerefMut(_))
    }

    pub fn deref_overload(&self) -> Option<&DerefOverload> {
        match &self.kind {
            AdjustmentKind::Deref(overload) | AdjustmentKind::DerefMut(overload) => Some(overload),
            _ => None,
        }
    }
}

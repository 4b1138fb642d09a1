//! Application of the implicit adjustment sequences recorded by type
//! inference, plus the coercion-on-assignment sites that calls and
//! constructors share.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::span::Span;
use ox_core::tree::{TreeExpr, TreeTy};
use ox_core::types::adjust::{Adjustment, AdjustmentKind};
use ox_core::types::{Ty, TyKind};

impl<'a> TreeGenerator<'a> {
    /// Apply an adjustment sequence strictly left to right. Each step only
    /// changes the value's representation, never the value itself.
    pub(super) fn apply_adjustments(
        &mut self,
        adjustments: &[Adjustment],
        expression: TreeExpr,
        locus: Span,
    ) -> Result<TreeExpr> {
        let mut e = expression;
        for adjustment in adjustments {
            e = match &adjustment.kind {
                AdjustmentKind::Error => return Ok(TreeExpr::error(locus)),
                AdjustmentKind::ImmRef | AdjustmentKind::MutRef => {
                    // fat pointers are already reference-like
                    if e.ty.is_slice() {
                        e
                    } else {
                        let ptr_ty = self.compile_ty(&adjustment.expected);
                        TreeExpr::address_of(e, ptr_ty, locus)
                    }
                }
                AdjustmentKind::Deref(_) | AdjustmentKind::DerefMut(_) => {
                    self.apply_deref_adjustment(adjustment, e, locus)?
                }
                AdjustmentKind::Indirection => {
                    let expected = self.compile_ty(&adjustment.expected);
                    // upstream guarantees the pointer is valid
                    TreeExpr::indirect(expected, e, true, locus)
                }
                AdjustmentKind::Unsize => self.apply_unsize_adjustment(adjustment, e, locus)?,
            };
        }
        Ok(e)
    }

    /// An overloaded deref step: resolve the `Deref`/`DerefMut` impl and
    /// call it, borrowing the argument first if it is not already indirect.
    fn apply_deref_adjustment(
        &mut self,
        adjustment: &Adjustment,
        expression: TreeExpr,
        locus: Span,
    ) -> Result<TreeExpr> {
        let Some(overload) = adjustment.deref_overload() else {
            lower_bail!(locus, "deref adjustment without an operator overload target");
        };

        let mappings = self.mappings;
        let Some(impl_item) = mappings.lookup_hir_implitem(overload.impl_item) else {
            lower_bail!(locus, "deref adjustment target is not a known impl item");
        };
        let function = impl_item.function().clone();
        let fn_id = self.lower_function_item(&function, &overload.fn_ty)?;
        let fn_address = TreeExpr::fn_addr(fn_id, self.fn_ptr_tree_ty(&overload.fn_ty), locus);

        // does it need a reference to call
        let needs_borrow = !expression.ty.is_pointer() && !expression.ty.is_slice();
        let adjusted_argument = if needs_borrow {
            let ptr_ty = TreeTy::Pointer(Box::new(expression.ty.clone()));
            TreeExpr::address_of(expression, ptr_ty, locus)
        } else {
            expression
        };

        Ok(TreeExpr::call(fn_address, vec![adjusted_argument], locus))
    }

    /// Unsizing coercion: only valid from a fixed-size array to a slice;
    /// builds the {data pointer, element count} fat pointer, with the count
    /// derived from the array's index domain.
    fn apply_unsize_adjustment(
        &mut self,
        adjustment: &Adjustment,
        expression: TreeExpr,
        locus: Span,
    ) -> Result<TreeExpr> {
        let Some(array_size) = expression.ty.domain_len() else {
            lower_bail!(locus, "unsize adjustment applied to a non-array value");
        };
        if !matches!(adjustment.expected.root().kind, TyKind::Slice(_)) {
            lower_bail!(locus, "unsize adjustment does not target a slice type");
        }

        let fat_pointer = self.compile_ty(&adjustment.expected);

        let data_ptr_ty = TreeTy::Pointer(Box::new(expression.ty.clone()));
        let data = TreeExpr::address_of(expression, data_ptr_ty, locus);

        let Some(usize_ty) = self.tcx.lookup_builtin("usize") else {
            lower_bail!(locus, "usize is not a registered builtin");
        };
        let size = TreeExpr::int_const(array_size as i128, self.compile_ty(&usize_ty), locus);

        Ok(TreeExpr::constructor(
            fat_pointer,
            false,
            None,
            vec![data, size],
            locus,
        ))
    }

    /// Assignments are coercion sites: convert the rvalue to the expected
    /// type where an implicit conversion applies.
    pub(super) fn coercion_site(
        &mut self,
        rvalue: TreeExpr,
        actual: &Ty,
        expected: &Ty,
        _lvalue_locus: Span,
        rvalue_locus: Span,
    ) -> TreeExpr {
        if rvalue.is_error() || actual == expected {
            return rvalue;
        }

        match (&actual.kind, &expected.kind) {
            // &[T; n] -> &[T]: build the fat pointer from the array domain
            (TyKind::Ref { base: actual_base, .. }, TyKind::Ref { base: expected_base, .. })
                if matches!(actual_base.kind, TyKind::Array { .. })
                    && matches!(expected_base.kind, TyKind::Slice(_)) =>
            {
                let TyKind::Array { capacity, .. } = &actual_base.kind else {
                    return rvalue;
                };
                let fat_pointer = self.compile_ty(expected);
                let Some(usize_ty) = self.tcx.lookup_builtin("usize") else {
                    return rvalue;
                };
                let size =
                    TreeExpr::int_const(*capacity as i128, self.compile_ty(&usize_ty), rvalue_locus);
                TreeExpr::constructor(fat_pointer, false, None, vec![rvalue, size], rvalue_locus)
            }
            // implicit borrow on assignment
            (_, TyKind::Ref { base, .. }) if !matches!(actual.kind, TyKind::Ref { .. }) => {
                if rvalue.ty.is_slice() {
                    return rvalue;
                }
                let ptr_ty = TreeTy::Pointer(Box::new(self.compile_ty(base)));
                TreeExpr::address_of(rvalue, ptr_ty, rvalue_locus)
            }
            _ => rvalue,
        }
    }
}

//! Method address resolution and dynamic dispatch.
//!
//! A resolved declaration reference becomes a callable address: a cached
//! definition, a lazily-lowered inherent/trait-impl item, a monomorphized
//! generic instantiation, a trait default body, or, for trait objects, an
//! indirect call through a fixed vtable slot.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir::{self, HirId, PathSegment, Symbol};
use ox_core::span::Span;
use ox_core::tree::{TreeExpr, TreeTy};
use ox_core::types::{DynamicObject, FnTy, Ty, TyKind};

impl<'a> TreeGenerator<'a> {
    pub(super) fn lower_method_call(
        &mut self,
        expr: &hir::Expr,
        receiver: &hir::Expr,
        segment: &PathSegment,
        args: &[hir::Expr],
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let resolver = self.resolver;
        let mappings = self.mappings;
        let span = expr.span;

        // method receiver
        let mut self_arg = self.lower_expr(receiver)?;

        // lookup the resolved name
        let Some(resolved_node_id) = resolver.lookup_resolved_name(expr.mappings.node_id) else {
            self.diagnostics
                .error(span, "failed to lookup resolved method call");
            return Ok(TreeExpr::error(span));
        };
        // reverse lookup
        let Some(ref_hir) =
            mappings.lookup_node_to_hir(expr.mappings.crate_num, resolved_node_id)
        else {
            lower_bail!(span, "reverse lookup failure");
        };

        // the expected function type lives on the method-name segment
        let Some(lookup_fntype) = tcx.lookup_type(segment.mappings.hir_id) else {
            lower_bail!(span, "failed to lookup type for method call segment");
        };
        let TyKind::FnDef(fntype) = &lookup_fntype.kind else {
            lower_bail!(span, "method call segment is not a function definition");
        };

        let Some(receiver_tyty) = tcx.lookup_receiver(expr.hir_id()) else {
            lower_bail!(span, "no receiver recorded for method call");
        };

        let is_dyn_dispatch = matches!(receiver_tyty.root().kind, TyKind::Dynamic(_));
        let receiver_tyty = match &receiver_tyty.kind {
            TyKind::Param(param) => param.resolve().unwrap_or(receiver_tyty),
            _ => receiver_tyty,
        };

        let fn_expr = if is_dyn_dispatch {
            let TyKind::Dynamic(dyn_obj) = &receiver_tyty.root().kind else {
                lower_bail!(span, "dynamic dispatch receiver lost its object type");
            };
            let fn_expr =
                self.fn_addr_from_dyn(dyn_obj, receiver_tyty, fntype, self_arg.clone(), span)?;
            self_arg = self.receiver_from_dyn(receiver_tyty, self_arg, span);
            fn_expr
        } else {
            self.resolve_method_address(fntype, ref_hir, receiver_tyty, &segment.ident, span)?
        };

        // lookup the autoderef mappings and apply them to the receiver
        let Some(adjustments) = tcx.lookup_autoderef_mappings(expr.hir_id()) else {
            lower_bail!(span, "no autoderef mappings recorded for method call");
        };
        self_arg = self.apply_adjustments(adjustments, self_arg, receiver.span)?;

        let mut call_args = vec![self_arg]; // adjusted self

        // normal args, offset from the already adjusted implicit self
        for (i, argument) in args.iter().enumerate() {
            let rvalue = self.lower_expr(argument)?;

            let Some((_, expected)) = fntype.param_at(i + 1) else {
                lower_bail!(argument.span, "method call argument count mismatch");
            };
            let Some(actual) = tcx.lookup_type(argument.hir_id()) else {
                lower_bail!(argument.span, "did not resolve type for method call argument");
            };

            let lvalue_locus = mappings.lookup_location(expected.ty_ref);
            let rvalue =
                self.coercion_site(rvalue, actual, expected, lvalue_locus, argument.span);
            call_args.push(rvalue);
        }

        Ok(TreeExpr::call(fn_expr, call_args, span))
    }

    /// Produce a callable address for a statically-dispatched reference.
    pub(super) fn resolve_method_address(
        &mut self,
        fntype: &FnTy,
        ref_hir: HirId,
        receiver: &Ty,
        segment: &Symbol,
        span: Span,
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let mappings = self.mappings;

        // lookup compiled functions since it may have already been compiled
        if let Some(fn_id) = self.compiled_fns.get(&fntype.ty_ref).copied() {
            return Ok(TreeExpr::fn_addr(fn_id, self.fn_ptr_tree_ty(fntype), span));
        }

        // a forward-declared inherent or trait-impl item: lower it now,
        // substituting generics if the function type carries them
        if let Some(resolved_item) = mappings.lookup_hir_implitem(ref_hir) {
            let function = resolved_item.function().clone();
            let fn_id = self.lower_function_item(&function, fntype)?;
            return Ok(TreeExpr::fn_addr(fn_id, self.fn_ptr_tree_ty(fntype), span));
        }

        // it must be a trait-item reference then
        let Some(trait_item) = mappings.lookup_hir_trait_item(ref_hir) else {
            lower_bail!(span, "method reference resolves to no impl or trait item");
        };
        let Some(trait_did) = mappings.lookup_trait_item_mapping(ref_hir) else {
            lower_bail!(span, "trait item without an owning trait");
        };
        let Some(trait_ref) = tcx.lookup_trait_reference(trait_did) else {
            lower_bail!(span, "trait reference was never registered");
        };

        // the type resolver only resolves bounds to their trait item, so it
        // is up to us whether this lands on an impl block or defaults back
        // to the trait item's own definition
        let root = receiver.root();
        let candidates = tcx.probe(root, segment, true, false, true);

        if candidates.is_empty() {
            // defaulting back to the trait item
            let Some(trait_item_ref) = trait_ref.lookup_trait_item(&trait_item.function.ident)
            else {
                lower_bail!(span, "trait item vanished from its trait reference");
            };
            if !trait_item_ref.optional {
                lower_bail!(
                    span,
                    "no implementation and no default body for trait method {}",
                    segment
                );
            }
            let function = trait_item.function.clone();
            let fn_id = self.lower_function_item(&function, fntype)?;
            return Ok(TreeExpr::fn_addr(fn_id, self.fn_ptr_tree_ty(fntype), span));
        }

        // ambiguity must have been rejected by type checking already
        if candidates.len() > 1 {
            lower_bail!(span, "ambiguous candidates for trait method {}", segment);
        }

        let candidate = &candidates[0];
        let Some(impl_item_id) = candidate.impl_item else {
            lower_bail!(span, "probe candidate is not an impl item");
        };
        let Some(impl_item) = mappings.lookup_hir_implitem(impl_item_id) else {
            lower_bail!(span, "probe candidate impl item is unmapped");
        };
        let function = impl_item.function().clone();

        let monomorphized = if candidate.ty.needs_substitution() {
            candidate.ty.infer_substitutions().unify(fntype)
        } else {
            candidate.ty.clone()
        };

        let fn_id = self.lower_function_item(&function, &monomorphized)?;
        Ok(TreeExpr::fn_addr(
            fn_id,
            self.fn_ptr_tree_ty(&monomorphized),
            span,
        ))
    }

    /// Dynamic dispatch: no static address exists. Compute the fixed slot
    /// offset of the requested function within the trait object's ordered
    /// item list, then build the indirect callable through the object's
    /// vtable pointer field.
    pub(super) fn fn_addr_from_dyn(
        &mut self,
        dyn_obj: &DynamicObject,
        receiver: &Ty,
        fntype: &FnTy,
        mut receiver_ref: TreeExpr,
        span: Span,
    ) -> Result<TreeExpr> {
        let Some(offset) = dyn_obj.slot_of(fntype.def_id) else {
            return Ok(TreeExpr::error(span));
        };

        // get any indirection sorted out
        if let TyKind::Ref { base, .. } = &receiver.kind {
            let indirect_ty = self.compile_ty(base);
            receiver_ref = TreeExpr::indirect(indirect_ty, receiver_ref, true, span);
        }

        let expected_fn_ptr = self.fn_ptr_tree_ty(fntype);
        let index = TreeExpr::int_const(
            offset as i128,
            TreeTy::Int {
                bits: 64,
                signed: false,
            },
            span,
        );

        // the vtable pointer is the object's second field
        let vtable_ptr = TreeExpr::field(receiver_ref.clone(), 1, span);
        let vtable_access = TreeExpr::array_index(vtable_ptr, index, span);

        Ok(TreeExpr::vtable_ref(
            vtable_access,
            receiver_ref,
            offset,
            expected_fn_ptr,
            span,
        ))
    }

    /// The adjusted receiver for a dynamic call is the object's data
    /// pointer, its first field.
    pub(super) fn receiver_from_dyn(
        &mut self,
        receiver: &Ty,
        mut receiver_ref: TreeExpr,
        span: Span,
    ) -> TreeExpr {
        if let TyKind::Ref { base, .. } = &receiver.kind {
            let indirect_ty = self.compile_ty(base);
            receiver_ref = TreeExpr::indirect(indirect_ty, receiver_ref, true, span);
        }
        TreeExpr::field(receiver_ref, 0, span)
    }
}

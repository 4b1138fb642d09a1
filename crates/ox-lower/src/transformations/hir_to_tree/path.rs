//! Identifier and path expression lowering.
//!
//! Resolution flows through the name resolver to a definition, back through
//! the node-to-HIR table, then into the generator's declaration caches,
//! falling back to lazy item compilation for forward references.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir::{self, UNKNOWN_NODEID};
use ox_core::tree::TreeExpr;
use ox_core::types::TyKind;

impl<'a> TreeGenerator<'a> {
    pub(super) fn lower_path(&mut self, expr: &hir::Expr) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;

        // an enum variant path such as `Foo::A` constructs the variant's
        // unit aggregate with just its discriminant
        if let Some(tyty) = tcx.lookup_type(expr.hir_id()) {
            if let TyKind::Adt(adt) = &tyty.kind {
                if adt.is_enum() {
                    if let Some(variant_id) = tcx.lookup_variant_definition(expr.hir_id()) {
                        let Some((discriminator, variant)) = adt.lookup_variant_by_id(variant_id)
                        else {
                            lower_bail!(span, "variant definition not found on its enum");
                        };
                        let variant = variant.clone();
                        let compiled_adt = self.compile_ty(tyty);
                        let discriminant = self.variant_discriminant(&variant, span)?;
                        return Ok(TreeExpr::constructor(
                            compiled_adt,
                            true,
                            Some(discriminator),
                            vec![discriminant],
                            span,
                        ));
                    }
                }
            }
        }

        self.lower_identifier(expr)
    }

    pub(super) fn lower_identifier(&mut self, expr: &hir::Expr) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let resolver = self.resolver;
        let mappings = self.mappings;
        let span = expr.span;
        let ast_node_id = expr.mappings.node_id;

        let mut is_value = false;
        let ref_node_id = if let Some(resolved) = resolver.lookup_resolved_name(ast_node_id) {
            // resolved to a pattern declaration; the definition's parent is
            // the declaration we are interested in
            let Some(definition) = resolver.lookup_definition(resolved) else {
                self.diagnostics
                    .error(span, "unknown reference for resolved name");
                return Ok(TreeExpr::error(span));
            };
            is_value = true;
            definition.parent
        } else if let Some(resolved) = resolver.lookup_resolved_type(ast_node_id) {
            resolved
        } else {
            self.diagnostics
                .error(span, "failed to lookup type reference for node");
            return Ok(TreeExpr::error(span));
        };

        if ref_node_id == UNKNOWN_NODEID {
            lower_bail!(span, "unresolved identifier expression");
        }

        // node back to HIR
        let Some(ref_hir) = mappings.lookup_node_to_hir(expr.mappings.crate_num, ref_node_id)
        else {
            self.diagnostics.error(span, "reverse lookup failure");
            return Ok(TreeExpr::error(span));
        };

        let Some(lookup) = tcx.lookup_type(ref_hir) else {
            lower_bail!(span, "failed to find type relevant to this context");
        };

        if !is_value {
            // a unit struct used as a value is just the struct name
            if lookup.is_unit() {
                return Ok(TreeExpr::unit(span));
            }
            lower_bail!(span, "type reference used in expression position");
        }

        if let Some(constant) = self.const_decls.get(&ref_hir) {
            return Ok(constant.clone());
        }
        if let Some(var) = self.var_decls.get(&ref_hir) {
            return Ok(TreeExpr::var(var.id, var.ty.clone(), span));
        }
        if let Some(binding) = self.pattern_bindings.get(&ref_hir) {
            return Ok(binding.clone());
        }

        // try and query compile it to an item
        let Some(resolved_item) = mappings.lookup_hir_item(ref_hir) else {
            return Ok(TreeExpr::error(span));
        };
        let hir::ItemKind::Function(function) = &resolved_item.kind;
        let TyKind::FnDef(fntype) = &lookup.kind else {
            return Ok(TreeExpr::error(span));
        };

        let function = function.clone();
        let fn_id = self.lower_function_item(&function, fntype)?;
        Ok(TreeExpr::fn_addr(fn_id, self.fn_ptr_tree_ty(fntype), span))
    }
}

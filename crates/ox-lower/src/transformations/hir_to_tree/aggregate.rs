//! Aggregate construction: ADT constructor calls, tuples, array literals
//! and range expressions.

use super::types::discriminant_tree_ty;
use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir::{self, ArrayElems};
use ox_core::span::Span;
use ox_core::tree::{fold, TreeExpr, TreeStmt, TreeTy};
use ox_core::types::{Ty, TyKind, VariantDef, VariantDiscr};

impl<'a> TreeGenerator<'a> {
    /// A call whose callee is not a function type constructs an ADT value:
    /// a struct/tuple-struct, or an enum variant with its folded
    /// discriminant prepended as the leading common field.
    pub(super) fn lower_adt_ctor_call(
        &mut self,
        expr: &hir::Expr,
        callee: &hir::Expr,
        args: &[hir::Expr],
        tyty: &Ty,
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let mappings = self.mappings;
        let span = expr.span;

        let TyKind::Adt(adt) = &tyty.kind else {
            lower_bail!(span, "call expression target is not a constructor");
        };
        let compiled_adt_type = self.compile_ty(tyty);

        // what variant is it?
        let (union_discriminator, variant) = if !adt.is_enum() {
            if adt.number_of_variants() != 1 {
                lower_bail!(span, "struct constructor with multiple variants");
            }
            (None, &adt.variants[0])
        } else {
            let Some(variant_id) = tcx.lookup_variant_definition(callee.hir_id()) else {
                lower_bail!(span, "no variant definition recorded for enum constructor");
            };
            let Some((discriminator, variant)) = adt.lookup_variant_by_id(variant_id) else {
                lower_bail!(span, "variant definition not found on its enum");
            };
            (Some(discriminator), variant)
        };

        // fields are positionally coerced in declaration order
        let mut arguments = Vec::new();
        for (i, argument) in args.iter().enumerate() {
            let rvalue = self.lower_expr(argument)?;

            // assignments are coercion sites so convert the rvalue if
            // necessary
            let Some(respective_field) = variant.field_at_index(i) else {
                lower_bail!(argument.span, "constructor argument without a field");
            };
            let expected = &respective_field.ty;

            let Some(actual) = tcx.lookup_type(argument.hir_id()) else {
                lower_bail!(argument.span, "did not resolve type for constructor argument");
            };

            let lvalue_locus = mappings.lookup_location(expected.ty_ref);
            let rvalue =
                self.coercion_site(rvalue, actual, expected, lvalue_locus, argument.span);
            arguments.push(rvalue);
        }

        // enums prepend the folded discriminant of the selected variant
        let mut ctor_arguments = Vec::new();
        if adt.is_enum() {
            let variant = variant.clone();
            let discriminant = self.variant_discriminant(&variant, span)?;
            ctor_arguments.push(discriminant);
        }
        ctor_arguments.extend(arguments);

        Ok(TreeExpr::constructor(
            compiled_adt_type,
            adt.is_enum(),
            union_discriminator,
            ctor_arguments,
            span,
        ))
    }

    /// Lower and constant-fold a variant's discriminant value.
    pub(super) fn variant_discriminant(
        &mut self,
        variant: &VariantDef,
        span: Span,
    ) -> Result<TreeExpr> {
        match &variant.discr {
            VariantDiscr::Explicit(discr_expr) => {
                self.enter_const_context();
                let compiled = self.lower_expr(discr_expr);
                self.exit_const_context();
                Ok(fold::fold_expr(&compiled?))
            }
            VariantDiscr::Relative(offset) => Ok(TreeExpr::int_const(
                *offset as i128,
                discriminant_tree_ty(),
                span,
            )),
        }
    }

    pub(super) fn lower_tuple(&mut self, expr: &hir::Expr, elems: &[hir::Expr]) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;

        if elems.is_empty() {
            return Ok(TreeExpr::unit(span));
        }
        let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
            lower_bail!(span, "did not resolve type for this tuple expression");
        };
        let compiled = self.compile_ty(tyty);

        let mut fields = Vec::new();
        for elem in elems {
            fields.push(self.lower_expr(elem)?);
        }
        Ok(TreeExpr::constructor(compiled, false, None, fields, span))
    }

    pub(super) fn lower_array(&mut self, expr: &hir::Expr, elems: &ArrayElems) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;

        let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
            lower_bail!(span, "did not resolve type for this array expression");
        };
        let array_type = self.compile_ty(tyty);
        if !matches!(array_type, TreeTy::Array { .. }) {
            return Ok(TreeExpr::error(span));
        }

        match elems {
            ArrayElems::Values(values) => self.array_value_expr(span, array_type, values),
            ArrayElems::Copied { elem, count } => {
                self.array_copied_expr(span, array_type, elem, count)
            }
        }
    }

    fn array_value_expr(
        &mut self,
        span: Span,
        array_type: TreeTy,
        values: &[hir::Expr],
    ) -> Result<TreeExpr> {
        let mut indexes = Vec::new();
        let mut constructor = Vec::new();
        for (i, value) in values.iter().enumerate() {
            constructor.push(self.lower_expr(value)?);
            indexes.push(i as u64);
        }
        Ok(TreeExpr::array_ctor(array_type, indexes, constructor, span))
    }

    /// `[elem; count]`: in a constant-evaluation context the array is
    /// unrolled into `count` references to the one lowered element; at
    /// runtime a fresh block initializes a temporary with an element loop
    /// and yields it by value.
    fn array_copied_expr(
        &mut self,
        span: Span,
        array_type: TreeTy,
        elem: &hir::Expr,
        count: &hir::Expr,
    ) -> Result<TreeExpr> {
        let Some(len) = array_type.domain_len() else {
            lower_bail!(span, "array type without a constant capacity domain");
        };

        let capacity_expr = fold::fold_expr(&self.lower_expr(count)?);
        if !fold::is_constant(&capacity_expr) {
            self.diagnostics.error(span, "non const num copies");
            return Ok(TreeExpr::error(span));
        }

        // get the compiled value
        let translated_expr = self.lower_expr(elem)?;
        if translated_expr.is_error() {
            return Ok(TreeExpr::error(span));
        }

        if self.const_context_p() {
            // in a const context we must initialize the entire array
            let indexes = (0..len).collect();
            let constructor = (0..len).map(|_| translated_expr.clone()).collect();
            return Ok(TreeExpr::array_ctor(array_type, indexes, constructor, span));
        }

        // create a new block scope in which to initialize the array
        self.push_block();
        let (tmp, decl) = self.temporary_variable(array_type.clone());
        self.add_statement(decl);
        self.add_statement(TreeStmt::ArrayInit {
            var: tmp.id,
            capacity: capacity_expr,
            value: translated_expr,
        });
        let block = self.pop_block();

        // a compound expression initializing a temporary array and
        // yielding it by value
        Ok(TreeExpr::compound(
            block,
            TreeExpr::var(tmp.id, array_type, span),
            span,
        ))
    }

    /// Each range form is a constructor call on its ADT representation with
    /// the bound fields in a fixed order: from, then to.
    pub(super) fn lower_range(
        &mut self,
        expr: &hir::Expr,
        from: Option<&hir::Expr>,
        to: Option<&hir::Expr>,
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;

        let mut fields = Vec::new();
        if let Some(from) = from {
            let from = self.lower_expr(from)?;
            if from.is_error() {
                return Ok(TreeExpr::error(span));
            }
            fields.push(from);
        }
        if let Some(to) = to {
            let to = self.lower_expr(to)?;
            if to.is_error() {
                return Ok(TreeExpr::error(span));
            }
            fields.push(to);
        }

        let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
            lower_bail!(span, "did not resolve type for this range expression");
        };
        let adt = self.compile_ty(tyty);

        // make the constructor
        Ok(TreeExpr::constructor(adt, false, None, fields, span))
    }
}

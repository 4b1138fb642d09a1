//! Pattern compilation for match emission: case-label tests against the
//! scrutinee, and pattern-variable bindings as a side effect.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir::{Lit, Pat, PatKind, TuplePatItems};
use ox_core::tree::{LabelId, TreeExpr, TreeStmt};
use ox_core::types::TyKind;

impl<'a> TreeGenerator<'a> {
    /// Compile a single-column pattern into a case-label statement for the
    /// enclosing switch. Wildcards and bindings become the default label.
    pub(super) fn compile_case_label(
        &mut self,
        pattern: &Pat,
        label: LabelId,
    ) -> Result<TreeStmt> {
        let value = match &pattern.kind {
            PatKind::Wild | PatKind::Binding(_) => None,
            PatKind::Literal(lit) => Some(self.compile_pattern_literal(pattern, lit)?),
            PatKind::Path(_) => Some(self.compile_variant_case_value(pattern)?),
            PatKind::Tuple(_) => {
                lower_bail!(
                    pattern.span,
                    "tuple pattern reached single-column match emission"
                );
            }
        };
        Ok(TreeStmt::CaseLabel { value, label })
    }

    fn compile_pattern_literal(&mut self, pattern: &Pat, lit: &Lit) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = pattern.span;
        let Some(tyty) = tcx.lookup_type(pattern.hir_id()) else {
            lower_bail!(span, "did not resolve type for this pattern literal");
        };

        match lit {
            Lit::Bool(value) => Ok(TreeExpr::bool_const(*value, span)),
            Lit::Integer(text) => self.compile_integer_literal(text, tyty, span),
            Lit::Char(value) => Ok(TreeExpr::char_const(*value, span)),
            Lit::Byte(value) => Ok(TreeExpr::byte_const(*value, span)),
            Lit::Float(_) => {
                // unreachable in practice: float scrutinees are rejected
                // before emission starts
                self.diagnostics
                    .deferred(span, "floating-point patterns are not yet supported");
                Ok(TreeExpr::error(span))
            }
            Lit::Str(_) | Lit::ByteStr(_) => {
                self.diagnostics
                    .deferred(span, "string patterns are not yet supported");
                Ok(TreeExpr::error(span))
            }
        }
    }

    /// An enum-variant path pattern tests the scrutinee's discriminant; the
    /// case value is the variant's folded discriminant.
    fn compile_variant_case_value(&mut self, pattern: &Pat) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = pattern.span;

        let Some(tyty) = tcx.lookup_type(pattern.hir_id()) else {
            lower_bail!(span, "did not resolve type for this path pattern");
        };
        let TyKind::Adt(adt) = &tyty.kind else {
            lower_bail!(span, "path pattern over a non-ADT scrutinee");
        };
        if !adt.is_enum() {
            lower_bail!(span, "path pattern over a non-enum ADT");
        }
        let Some(variant_id) = tcx.lookup_variant_definition(pattern.hir_id()) else {
            lower_bail!(span, "no variant definition recorded for path pattern");
        };
        let Some((_, variant)) = adt.lookup_variant_by_id(variant_id) else {
            lower_bail!(span, "variant definition not found on its enum");
        };
        let variant = variant.clone();
        self.variant_discriminant(&variant, span)
    }

    /// Bind pattern variables to pieces of the scrutinee. Bindings are
    /// recorded in the generator's table; tuple sub-patterns bind through
    /// positional field accesses.
    pub(super) fn compile_pattern_bindings(
        &mut self,
        pattern: &Pat,
        scrutinee: &TreeExpr,
    ) -> Result<()> {
        match &pattern.kind {
            PatKind::Binding(_) => {
                self.insert_pattern_binding(pattern.hir_id(), scrutinee.clone());
            }
            PatKind::Tuple(TuplePatItems::Multiple(items)) => {
                for (index, sub_pattern) in items.iter().enumerate() {
                    let field = TreeExpr::field(scrutinee.clone(), index, sub_pattern.span);
                    self.compile_pattern_bindings(sub_pattern, &field)?;
                }
            }
            PatKind::Tuple(TuplePatItems::Ranged { .. }) => {
                self.diagnostics
                    .deferred(pattern.span, "ranged tuple patterns are not yet supported");
            }
            PatKind::Wild | PatKind::Literal(_) | PatKind::Path(_) => {}
        }
        Ok(())
    }
}

//! Literal compilation: token payloads into typed constants.
//!
//! Numeric literals arrive as decimal text and are validated against the
//! bounds of their resolved type; out-of-range values report through the
//! diagnostics sink and yield the error sentinel so the surrounding
//! expression keeps lowering.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::diagnostics::OVERFLOW_ERROR;
use ox_core::error::Result;
use ox_core::hir::{self, Lit};
use ox_core::span::Span;
use ox_core::tree::{TreeExpr, TreeTy};
use ox_core::types::{FloatTy, Ty, TyKind};

impl<'a> TreeGenerator<'a> {
    pub(super) fn lower_literal(&mut self, expr: &hir::Expr, lit: &Lit) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;
        let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
            lower_bail!(span, "did not resolve type for this literal");
        };

        match lit {
            Lit::Bool(value) => Ok(TreeExpr::bool_const(*value, span)),
            Lit::Integer(text) => self.compile_integer_literal(text, tyty, span),
            Lit::Float(text) => self.compile_float_literal(text, tyty, span),
            Lit::Char(value) => Ok(TreeExpr::char_const(*value, span)),
            Lit::Byte(value) => Ok(TreeExpr::byte_const(*value, span)),
            Lit::Str(value) => self.compile_string_literal(value, tyty, span),
            Lit::ByteStr(bytes) => self.compile_byte_string_literal(bytes, tyty, span),
        }
    }

    /// Parse the decimal text and range-check it against the resolved
    /// integer type.
    pub(super) fn compile_integer_literal(
        &mut self,
        text: &str,
        tyty: &Ty,
        span: Span,
    ) -> Result<TreeExpr> {
        let Some((negative, magnitude)) = parse_decimal(text) else {
            self.diagnostics.error(span, "bad number in literal");
            return Ok(TreeExpr::error(span));
        };

        let in_range = match &tyty.kind {
            TyKind::Int(int_ty) => {
                if negative {
                    magnitude <= int_ty.min_value().unsigned_abs()
                } else {
                    magnitude <= int_ty.max_value() as u128
                }
            }
            TyKind::Uint(uint_ty) => !negative && magnitude <= uint_ty.max_value(),
            _ => lower_bail!(span, "integer literal resolved to non-integral type {}", tyty),
        };

        if !in_range {
            self.diagnostics.error_with_code(
                span,
                format!("integer overflows the respective type {}", tyty),
                OVERFLOW_ERROR,
            );
            return Ok(TreeExpr::error(span));
        }

        // two's-complement bit image; wrapping is exact for the checked range
        let value = if negative {
            (magnitude as i128).wrapping_neg()
        } else {
            magnitude as i128
        };
        Ok(TreeExpr::int_const(value, self.compile_ty(tyty), span))
    }

    /// Parse with rounding to nearest at target precision; reject values
    /// whose binade exponent exceeds the type's precision or whose rounded
    /// form overflows.
    pub(super) fn compile_float_literal(
        &mut self,
        text: &str,
        tyty: &Ty,
        span: Span,
    ) -> Result<TreeExpr> {
        let TyKind::Float(float_ty) = &tyty.kind else {
            lower_bail!(span, "float literal resolved to non-float type {}", tyty);
        };

        let Ok(parsed) = text.parse::<f64>() else {
            self.diagnostics.error(span, "bad number in literal");
            return Ok(TreeExpr::error(span));
        };

        let rounded = match float_ty {
            FloatTy::F32 => parsed as f32 as f64,
            FloatTy::F64 => parsed,
        };

        let bits = float_ty.bits() as i32;
        let exponent = if parsed == 0.0 {
            0
        } else {
            parsed.abs().log2().floor() as i32 + 1
        };

        if !rounded.is_finite() || exponent > bits {
            self.diagnostics.error_with_code(
                span,
                format!("decimal overflows the respective type {}", tyty),
                OVERFLOW_ERROR,
            );
            return Ok(TreeExpr::error(span));
        }

        Ok(TreeExpr::float_const(
            rounded,
            TreeTy::Float {
                bits: float_ty.bits(),
            },
            span,
        ))
    }

    /// String literals become a {data pointer, length} fat pointer to
    /// static storage.
    fn compile_string_literal(&mut self, value: &str, tyty: &Ty, span: Span) -> Result<TreeExpr> {
        let fat_pointer = self.compile_ty(tyty);

        let base = TreeExpr::string_const(value, span);
        let data_ptr_ty = TreeTy::Pointer(Box::new(base.ty.clone()));
        let data = TreeExpr::address_of(base, data_ptr_ty, span);

        let Some(usize_ty) = self.tcx.lookup_builtin("usize") else {
            lower_bail!(span, "usize is not a registered builtin");
        };
        let size = TreeExpr::int_const(value.len() as i128, self.compile_ty(&usize_ty), span);

        Ok(TreeExpr::constructor(
            fat_pointer,
            false,
            None,
            vec![data, size],
            span,
        ))
    }

    /// Byte-string literals become a fixed-size byte array referenced by a
    /// thin pointer to static storage, not a fat pointer.
    fn compile_byte_string_literal(
        &mut self,
        bytes: &[u8],
        tyty: &Ty,
        span: Span,
    ) -> Result<TreeExpr> {
        // the type here is &[u8; capacity]
        let TyKind::Ref { base, .. } = &tyty.kind else {
            lower_bail!(span, "byte string literal resolved to non-reference type {}", tyty);
        };
        let TyKind::Array { .. } = &base.kind else {
            lower_bail!(span, "byte string literal reference target is not an array");
        };

        let array_ty = self.compile_ty(base);
        let indexes = (0..bytes.len() as u64).collect();
        let values = bytes
            .iter()
            .map(|byte| TreeExpr::byte_const(*byte, span))
            .collect();
        let constructed = TreeExpr::array_ctor(array_ty.clone(), indexes, values, span);

        Ok(TreeExpr::address_of(
            constructed,
            TreeTy::Pointer(Box::new(array_ty)),
            span,
        ))
    }
}

/// Split decimal text into sign and magnitude. `None` for malformed input.
fn parse_decimal(text: &str) -> Option<(bool, u128)> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u128>().ok().map(|magnitude| (negative, magnitude))
}

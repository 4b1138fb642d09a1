//! Operator-overload detection and rewriting.
//!
//! When type inference recorded an operator-overload resolution for an
//! expression, the syntactic operator maps to its canonical lang item and
//! the expression is rewritten as a method call with the left operand as
//! receiver. Otherwise the primitive tree operation is used directly.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir::{self, BinOp, CmpOp, Symbol, UnOp};
use ox_core::tree::{TreeExpr, TreeStmt};
use ox_core::types::TyKind;

/// Canonical identifiers mapping syntactic operators to the trait methods
/// implementing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangItem {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    RemAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    ShlAssign,
    ShrAssign,
    Neg,
    Not,
    Deref,
    DerefMut,
    Index,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl LangItem {
    pub fn from_arithmetic_or_logical(op: BinOp) -> Self {
        match op {
            BinOp::Add => LangItem::Add,
            BinOp::Sub => LangItem::Sub,
            BinOp::Mul => LangItem::Mul,
            BinOp::Div => LangItem::Div,
            BinOp::Rem => LangItem::Rem,
            BinOp::BitAnd => LangItem::BitAnd,
            BinOp::BitOr => LangItem::BitOr,
            BinOp::BitXor => LangItem::BitXor,
            BinOp::Shl => LangItem::Shl,
            BinOp::Shr => LangItem::Shr,
        }
    }

    pub fn from_compound_assignment(op: BinOp) -> Self {
        match op {
            BinOp::Add => LangItem::AddAssign,
            BinOp::Sub => LangItem::SubAssign,
            BinOp::Mul => LangItem::MulAssign,
            BinOp::Div => LangItem::DivAssign,
            BinOp::Rem => LangItem::RemAssign,
            BinOp::BitAnd => LangItem::BitAndAssign,
            BinOp::BitOr => LangItem::BitOrAssign,
            BinOp::BitXor => LangItem::BitXorAssign,
            BinOp::Shl => LangItem::ShlAssign,
            BinOp::Shr => LangItem::ShrAssign,
        }
    }

    pub fn from_negation(op: UnOp) -> Self {
        match op {
            UnOp::Neg => LangItem::Neg,
            UnOp::Not => LangItem::Not,
        }
    }

    pub fn from_comparison(op: CmpOp) -> Self {
        match op {
            CmpOp::Eq => LangItem::Eq,
            CmpOp::Ne => LangItem::Ne,
            CmpOp::Lt => LangItem::Lt,
            CmpOp::Le => LangItem::Le,
            CmpOp::Gt => LangItem::Gt,
            CmpOp::Ge => LangItem::Ge,
        }
    }

    /// The method-name segment the implementing trait declares.
    pub fn as_segment(self) -> &'static str {
        match self {
            LangItem::Add => "add",
            LangItem::Sub => "sub",
            LangItem::Mul => "mul",
            LangItem::Div => "div",
            LangItem::Rem => "rem",
            LangItem::BitAnd => "bitand",
            LangItem::BitOr => "bitor",
            LangItem::BitXor => "bitxor",
            LangItem::Shl => "shl",
            LangItem::Shr => "shr",
            LangItem::AddAssign => "add_assign",
            LangItem::SubAssign => "sub_assign",
            LangItem::MulAssign => "mul_assign",
            LangItem::DivAssign => "div_assign",
            LangItem::RemAssign => "rem_assign",
            LangItem::BitAndAssign => "bitand_assign",
            LangItem::BitOrAssign => "bitor_assign",
            LangItem::BitXorAssign => "bitxor_assign",
            LangItem::ShlAssign => "shl_assign",
            LangItem::ShrAssign => "shr_assign",
            LangItem::Neg => "neg",
            LangItem::Not => "not",
            LangItem::Deref => "deref",
            LangItem::DerefMut => "deref_mut",
            LangItem::Index => "index",
            LangItem::Eq => "eq",
            LangItem::Ne => "ne",
            LangItem::Lt => "lt",
            LangItem::Le => "le",
            LangItem::Gt => "gt",
            LangItem::Ge => "ge",
        }
    }
}

impl<'a> TreeGenerator<'a> {
    pub(super) fn lower_arithmetic_or_logical(
        &mut self,
        expr: &hir::Expr,
        op: BinOp,
        lhs_expr: &hir::Expr,
        rhs_expr: &hir::Expr,
    ) -> Result<TreeExpr> {
        let lhs = self.lower_expr(lhs_expr)?;
        let rhs = self.lower_expr(rhs_expr)?;

        // this might be an operator overload situation lets check
        if self.tcx.lookup_operator_overload(expr.hir_id()).is_some() {
            let lang_item = LangItem::from_arithmetic_or_logical(op);
            return self.resolve_operator_overload(lang_item, expr, lhs, Some(rhs), lhs_expr);
        }

        Ok(TreeExpr::arithmetic_or_logical(op, lhs, rhs, expr.span))
    }

    pub(super) fn lower_comparison(
        &mut self,
        expr: &hir::Expr,
        op: CmpOp,
        lhs_expr: &hir::Expr,
        rhs_expr: &hir::Expr,
    ) -> Result<TreeExpr> {
        let lhs = self.lower_expr(lhs_expr)?;
        let rhs = self.lower_expr(rhs_expr)?;

        if self.tcx.lookup_operator_overload(expr.hir_id()).is_some() {
            let lang_item = LangItem::from_comparison(op);
            return self.resolve_operator_overload(lang_item, expr, lhs, Some(rhs), lhs_expr);
        }

        Ok(TreeExpr::comparison(op, lhs, rhs, expr.span))
    }

    /// Compound assignments are statements: the overload call (or the
    /// primitive read-modify-write) is threaded into the open block and the
    /// expression yields unit.
    pub(super) fn lower_compound_assignment(
        &mut self,
        expr: &hir::Expr,
        op: BinOp,
        lhs_expr: &hir::Expr,
        rhs_expr: &hir::Expr,
    ) -> Result<TreeExpr> {
        let lhs = self.lower_expr(lhs_expr)?;
        let rhs = self.lower_expr(rhs_expr)?;

        if self.tcx.lookup_operator_overload(expr.hir_id()).is_some() {
            let lang_item = LangItem::from_compound_assignment(op);
            let compound_assignment =
                self.resolve_operator_overload(lang_item, expr, lhs, Some(rhs), lhs_expr)?;
            self.add_statement(TreeStmt::Expr(compound_assignment));
            return Ok(TreeExpr::unit(expr.span));
        }

        let operator_expr = TreeExpr::arithmetic_or_logical(op, lhs.clone(), rhs, expr.span);
        self.add_statement(TreeStmt::Assign {
            lhs,
            rhs: operator_expr,
        });
        Ok(TreeExpr::unit(expr.span))
    }

    pub(super) fn lower_negation(
        &mut self,
        expr: &hir::Expr,
        op: UnOp,
        operand_expr: &hir::Expr,
    ) -> Result<TreeExpr> {
        let negated_expr = self.lower_expr(operand_expr)?;

        if self.tcx.lookup_operator_overload(expr.hir_id()).is_some() {
            let lang_item = LangItem::from_negation(op);
            // negation never has a right operand
            return self.resolve_operator_overload(lang_item, expr, negated_expr, None, operand_expr);
        }

        Ok(TreeExpr::negation(op, negated_expr, expr.span))
    }

    pub(super) fn lower_array_index(
        &mut self,
        expr: &hir::Expr,
        array_expr: &hir::Expr,
        index_expr: &hir::Expr,
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let mut array_reference = self.lower_expr(array_expr)?;
        let index = self.lower_expr(index_expr)?;

        // this might be an Index lang item situation
        if tcx.lookup_operator_overload(expr.hir_id()).is_some() {
            let operator_overload_call = self.resolve_operator_overload(
                LangItem::Index,
                expr,
                array_reference,
                Some(index),
                array_expr,
            )?;

            // the index overload returns a reference; follow it to the
            // expression's own type when it can be dereferenced
            let can_indirect = operator_overload_call.ty.is_pointer();
            if !can_indirect {
                // nothing to do
                return Ok(operator_overload_call);
            }

            let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
                lower_bail!(expr.span, "did not resolve type for this index expression");
            };
            let expected = self.compile_ty(tyty);
            return Ok(TreeExpr::indirect(
                expected,
                operator_overload_call,
                true,
                expr.span,
            ));
        }

        // if the array is behind a reference add the indirection first
        let Some(array_expr_ty) = tcx.lookup_type(array_expr.hir_id()) else {
            lower_bail!(expr.span, "did not resolve type for the indexed array");
        };
        if let TyKind::Ref { base, .. } = &array_expr_ty.kind {
            let array_tyty = self.compile_ty(base);
            array_reference = TreeExpr::indirect(array_tyty, array_reference, true, expr.span);
        }

        Ok(TreeExpr::array_index(array_reference, index, expr.span))
    }

    /// Rewrite an overloaded operator expression as a method call: the left
    /// operand (with its autoderef adjustments applied) becomes the
    /// receiver, the right operand the sole argument.
    pub(super) fn resolve_operator_overload(
        &mut self,
        lang_item: LangItem,
        expr: &hir::Expr,
        lhs: TreeExpr,
        rhs: Option<TreeExpr>,
        lhs_expr: &hir::Expr,
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let resolver = self.resolver;
        let mappings = self.mappings;
        let span = expr.span;

        let Some(fntype) = tcx.lookup_operator_overload(expr.hir_id()) else {
            lower_bail!(span, "operator overload vanished between lookup and resolution");
        };

        // lookup the resolved name
        let Some(resolved_node_id) = resolver.lookup_resolved_name(expr.mappings.node_id) else {
            lower_bail!(span, "failed to lookup resolved operator overload");
        };
        // reverse lookup
        let Some(ref_hir) =
            mappings.lookup_node_to_hir(expr.mappings.crate_num, resolved_node_id)
        else {
            lower_bail!(span, "reverse lookup failure");
        };

        let Some(receiver) = tcx.lookup_receiver(expr.hir_id()) else {
            lower_bail!(span, "no receiver recorded for operator overload");
        };
        let receiver = match &receiver.kind {
            TyKind::Param(param) => param.resolve().unwrap_or(receiver),
            _ => receiver,
        };

        let segment = Symbol::from(lang_item.as_segment());
        let fn_expr = self.resolve_method_address(fntype, ref_hir, receiver, &segment, span)?;

        // lookup the autoderef mappings and adjust the receiver
        let Some(adjustments) = tcx.lookup_autoderef_mappings(expr.hir_id()) else {
            lower_bail!(span, "no autoderef mappings recorded for operator overload");
        };
        let self_arg = self.apply_adjustments(adjustments, lhs, lhs_expr.span)?;

        let mut args = vec![self_arg];
        if let Some(rhs) = rhs {
            // can be absent for the unary operators
            args.push(rhs);
        }

        Ok(TreeExpr::call(fn_expr, args, span))
    }
}

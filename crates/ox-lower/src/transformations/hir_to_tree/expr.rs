//! The expression dispatcher: routes each HIR expression variant to its
//! sub-lowerer and yields exactly one translated tree expression per call.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir::{self, ExprKind, PatKind, StmtKind};
use ox_core::tree::{TreeExpr, TreeStmt, TreeTy};
use ox_core::types::{Ty, TyKind};

impl<'a> TreeGenerator<'a> {
    pub fn lower_expr(&mut self, expr: &hir::Expr) -> Result<TreeExpr> {
        tracing::trace!(hir_id = expr.hir_id(), "lowering expression");

        match &expr.kind {
            ExprKind::Literal(lit) => self.lower_literal(expr, lit),
            ExprKind::Identifier(_) => self.lower_identifier(expr),
            ExprKind::Path(_) => self.lower_path(expr),
            ExprKind::ArithmeticOrLogical { op, lhs, rhs } => {
                self.lower_arithmetic_or_logical(expr, *op, lhs, rhs)
            }
            ExprKind::Comparison { op, lhs, rhs } => self.lower_comparison(expr, *op, lhs, rhs),
            ExprKind::CompoundAssignment { op, lhs, rhs } => {
                self.lower_compound_assignment(expr, *op, lhs, rhs)
            }
            ExprKind::Assignment { lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                if !lhs.is_error() && !rhs.is_error() {
                    self.add_statement(TreeStmt::Assign { lhs, rhs });
                }
                Ok(TreeExpr::unit(expr.span))
            }
            ExprKind::Negation { op, operand } => self.lower_negation(expr, *op, operand),
            ExprKind::Borrow { operand, .. } => self.lower_borrow(expr, operand),
            ExprKind::Deref(operand) => self.lower_deref(expr, operand),
            ExprKind::Call { callee, args } => self.lower_call(expr, callee, args),
            ExprKind::MethodCall {
                receiver,
                segment,
                args,
            } => self.lower_method_call(expr, receiver, segment, args),
            ExprKind::Match(match_expr) => self.lower_match(expr, match_expr),
            ExprKind::Array(elems) => self.lower_array(expr, elems),
            ExprKind::ArrayIndex { array, index } => self.lower_array_index(expr, array, index),
            ExprKind::Tuple(elems) => self.lower_tuple(expr, elems),
            ExprKind::Block(block) => self.lower_block_expr(block),
            ExprKind::RangeFrom { from } => self.lower_range(expr, Some(from), None),
            ExprKind::RangeTo { to } => self.lower_range(expr, None, Some(to)),
            ExprKind::RangeFromTo { from, to } => self.lower_range(expr, Some(from), Some(to)),
            ExprKind::RangeFromToIncl { from, to } => self.lower_range(expr, Some(from), Some(to)),
            ExprKind::RangeFull => self.lower_range(expr, None, None),
        }
    }

    fn lower_borrow(&mut self, expr: &hir::Expr, operand: &hir::Expr) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let main_expr = self.lower_expr(operand)?;

        // fat pointers are already reference-like
        if main_expr.ty.is_slice() {
            return Ok(main_expr);
        }

        let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
            return Ok(TreeExpr::error(expr.span));
        };
        let ptr_type = self.compile_ty(tyty);
        Ok(TreeExpr::address_of(main_expr, ptr_type, expr.span))
    }

    fn lower_deref(&mut self, expr: &hir::Expr, operand: &hir::Expr) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;

        let Some(tyty) = tcx.lookup_type(expr.hir_id()) else {
            lower_bail!(span, "did not resolve type for this dereference expression");
        };

        let mut main_expr = self.lower_expr(operand)?;

        // this might be an operator overload situation lets check
        if tcx.lookup_operator_overload(expr.hir_id()).is_some() {
            // the deref overload returns a reference; the indirection below
            // completes the load
            main_expr = self.resolve_operator_overload(
                super::LangItem::Deref,
                expr,
                main_expr,
                None,
                operand,
            )?;
        }

        let expected_type = self.compile_ty(tyty);
        if main_expr.ty.is_slice() && expected_type.is_slice() {
            return Ok(main_expr);
        }

        Ok(TreeExpr::indirect(expected_type, main_expr, true, span))
    }

    fn lower_call(
        &mut self,
        expr: &hir::Expr,
        callee: &hir::Expr,
        args: &[hir::Expr],
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let mappings = self.mappings;
        let span = expr.span;

        let Some(tyty) = tcx.lookup_type(callee.hir_id()) else {
            self.diagnostics.error(span, "unknown type");
            return Ok(TreeExpr::error(span));
        };

        // not a function? it must be an ADT tuple constructor
        let (required_num_args, is_varargs) = match &tyty.kind {
            TyKind::FnDef(fn_ty) => (fn_ty.num_params(), fn_ty.is_varargs),
            TyKind::FnPtr { params, .. } => (params.len(), false),
            _ => return self.lower_adt_ctor_call(expr, callee, args, tyty),
        };

        let mut call_args = Vec::new();
        for (i, argument) in args.iter().enumerate() {
            let rvalue = self.lower_expr(argument)?;

            if is_varargs && i >= required_num_args {
                call_args.push(rvalue);
                continue;
            }

            // assignments are coercion sites so convert the rvalue if
            // necessary
            let Some(expected) = call_param_ty_at(tyty, i) else {
                lower_bail!(argument.span, "call argument without a parameter");
            };
            let Some(actual) = tcx.lookup_type(argument.hir_id()) else {
                lower_bail!(argument.span, "did not resolve type for call argument");
            };

            let lvalue_locus = mappings.lookup_location(expected.ty_ref);
            let rvalue =
                self.coercion_site(rvalue, actual, expected, lvalue_locus, argument.span);
            call_args.push(rvalue);
        }

        // must be a call to a function
        let fn_address = self.lower_expr(callee)?;
        Ok(TreeExpr::call(fn_address, call_args, span))
    }

    fn lower_block_expr(&mut self, block: &hir::Block) -> Result<TreeExpr> {
        self.push_block();

        for stmt in &block.stmts {
            match &stmt.kind {
                StmtKind::Let { pat, init } => self.lower_let_stmt(pat, init.as_ref())?,
                StmtKind::Expr(e) | StmtKind::Semi(e) => {
                    let value = self.lower_expr(e)?;
                    if !value.is_error() && !matches!(value.ty, TreeTy::Void) {
                        self.add_statement(TreeStmt::Expr(value));
                    }
                }
            }
        }

        let tail = match &block.tail {
            Some(tail) => self.lower_expr(tail)?,
            None => TreeExpr::unit(block.span),
        };

        let inner = self.pop_block();
        Ok(TreeExpr::compound(inner, tail, block.span))
    }

    fn lower_let_stmt(&mut self, pat: &hir::Pat, init: Option<&hir::Expr>) -> Result<()> {
        let tcx = self.tcx;

        let init_value = match init {
            Some(init) => Some(self.lower_expr(init)?),
            None => None,
        };

        match &pat.kind {
            PatKind::Binding(name) => {
                let ty = match tcx.lookup_type(pat.hir_id()) {
                    Some(tyty) => self.compile_ty(tyty),
                    None => init_value
                        .as_ref()
                        .map(|value| value.ty.clone())
                        .unwrap_or(TreeTy::Error),
                };
                let var = self.declare_variable(name.as_str(), ty);
                self.insert_var_decl(pat.hir_id(), var.clone());
                self.add_statement(TreeStmt::VarDecl {
                    var: var.id,
                    init: init_value,
                });
            }
            PatKind::Wild => {
                if let Some(value) = init_value {
                    if !value.is_error() && !matches!(value.ty, TreeTy::Void) {
                        self.add_statement(TreeStmt::Expr(value));
                    }
                }
            }
            _ => {
                self.diagnostics
                    .deferred(pat.span, "destructuring let statements are not yet supported");
            }
        }
        Ok(())
    }
}

fn call_param_ty_at(tyty: &Ty, index: usize) -> Option<&Ty> {
    match &tyty.kind {
        TyKind::FnDef(fn_ty) => fn_ty.param_at(index).map(|(_, ty)| ty),
        TyKind::FnPtr { params, .. } => params.get(index),
        _ => None,
    }
}

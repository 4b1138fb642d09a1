//! Constant folding over tree expressions.
//!
//! Enum discriminants and array capacities must reach the backend as plain
//! constants, so the lowering engine folds them eagerly. Anything it cannot
//! reduce is returned unchanged.

use crate::hir::{BinOp, UnOp};
use crate::tree::{TreeExpr, TreeExprKind};

pub fn fold_expr(expr: &TreeExpr) -> TreeExpr {
    match &expr.kind {
        TreeExprKind::ArithmeticOrLogical { op, lhs, rhs } => {
            let lhs = fold_expr(lhs);
            let rhs = fold_expr(rhs);
            match (&lhs.kind, &rhs.kind) {
                (TreeExprKind::IntConst(a), TreeExprKind::IntConst(b)) => {
                    match eval_int_binop(*op, *a, *b) {
                        Some(value) => {
                            TreeExpr::int_const(value, expr.ty.clone(), expr.span)
                        }
                        None => expr.clone(),
                    }
                }
                _ => TreeExpr::arithmetic_or_logical(*op, lhs, rhs, expr.span),
            }
        }
        TreeExprKind::Negation { op: UnOp::Neg, operand } => {
            let operand = fold_expr(operand);
            match operand.kind {
                TreeExprKind::IntConst(value) => {
                    TreeExpr::int_const(value.wrapping_neg(), expr.ty.clone(), expr.span)
                }
                _ => TreeExpr::negation(UnOp::Neg, operand, expr.span),
            }
        }
        _ => expr.clone(),
    }
}

pub fn is_constant(expr: &TreeExpr) -> bool {
    matches!(
        expr.kind,
        TreeExprKind::BoolConst(_)
            | TreeExprKind::IntConst(_)
            | TreeExprKind::FloatConst(_)
            | TreeExprKind::CharConst(_)
            | TreeExprKind::ByteConst(_)
            | TreeExprKind::StringConst(_)
    )
}

fn eval_int_binop(op: BinOp, lhs: i128, rhs: i128) -> Option<i128> {
    match op {
        BinOp::Add => lhs.checked_add(rhs),
        BinOp::Sub => lhs.checked_sub(rhs),
        BinOp::Mul => lhs.checked_mul(rhs),
        BinOp::Div => lhs.checked_div(rhs),
        BinOp::Rem => lhs.checked_rem(rhs),
        BinOp::BitXor => Some(lhs ^ rhs),
        BinOp::BitAnd => Some(lhs & rhs),
        BinOp::BitOr => Some(lhs | rhs),
        BinOp::Shl => u32::try_from(rhs).ok().and_then(|s| lhs.checked_shl(s)),
        BinOp::Shr => u32::try_from(rhs).ok().and_then(|s| lhs.checked_shr(s)),
    }
}

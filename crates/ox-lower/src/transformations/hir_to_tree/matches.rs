//! Match lowering.
//!
//! The backend only offers a single-value switch, so n-ary tuple matches
//! are first decomposed into nested single-column matches by a pure
//! tree-to-tree transform; emission only ever sees single-column matches
//! and never starts while the transform is still running.

use super::TreeGenerator;
use crate::{lower_bail, lower_ensure};
use itertools::Itertools;
use ox_core::error::Result;
use ox_core::hir::{
    self, Expr, ExprKind, MatchArm, MatchCase, MatchExpr, NodeMappings, Pat, PatKind,
    TuplePatItems,
};
use ox_core::span::Span;
use ox_core::tree::{TreeExpr, TreeStmt};
use ox_core::types::TyKind;

/// How a case's first tuple column constrains the outer switch.
enum HeadPattern {
    /// A concrete test; forms (or joins) its own partition.
    Literal(Pat),
    /// Matches any head value; merged into every partition and into the
    /// trailing default partition.
    Any(Pat),
}

/// One arm of the rewritten outer match: a distinct head pattern plus the
/// tail cases of every original arm that can reach it, in source order.
struct TailPartition {
    head: Pat,
    cases: Vec<MatchCase>,
}

impl<'a> TreeGenerator<'a> {
    pub(super) fn lower_match(
        &mut self,
        expr: &hir::Expr,
        match_expr: &MatchExpr,
    ) -> Result<TreeExpr> {
        let tcx = self.tcx;
        let span = expr.span;

        let Some(scrutinee_ty) = tcx.lookup_type(match_expr.scrutinee.hir_id()) else {
            return Ok(TreeExpr::error(span));
        };

        match &scrutinee_ty.kind {
            // the switch primitive cannot express floating-point case labels
            TyKind::Float(_) => {
                self.diagnostics
                    .deferred(span, "match on floating-point types is not yet supported");
                return Ok(TreeExpr::error(span));
            }
            TyKind::Adt(adt) => {
                lower_ensure!(
                    adt.is_enum() && adt.number_of_variants() > 0,
                    span,
                    "match on an ADT scrutinee that is not a populated enum"
                );
            }
            TyKind::Tuple(_) => {
                // a tuple match becomes a series of nested switches, one
                // level per element from left to right
                return match &match_expr.scrutinee.kind {
                    ExprKind::Tuple(_) => {
                        let simplified =
                            self.simplify_tuple_match(match_expr, &expr.mappings, span)?;
                        // the rewrite shares the original node's identity,
                        // so type lookups keep resolving
                        self.lower_match(expr, &simplified)
                    }
                    _ => {
                        self.diagnostics.deferred(
                            span,
                            "match on tuple place expressions is not yet supported",
                        );
                        Ok(TreeExpr::error(span))
                    }
                };
            }
            TyKind::Bool | TyKind::Char | TyKind::Str | TyKind::Int(_) | TyKind::Uint(_) => {}
            _ => lower_bail!(span, "unsupported match scrutinee type"),
        }

        let Some(expr_tyty) = tcx.lookup_type(expr.hir_id()) else {
            return Ok(TreeExpr::error(span));
        };

        // the unit-typed match needs no result temporary
        let needs_temp = !expr_tyty.is_unit();
        let tmp = if needs_temp {
            let block_type = self.compile_ty(expr_tyty);
            let (var, decl) = self.temporary_variable(block_type);
            self.add_statement(decl);
            Some(var)
        } else {
            None
        };

        // lets compile the scrutinee expression
        let match_scrutinee_expr = self.lower_expr(&match_expr.scrutinee)?;
        if match_scrutinee_expr.is_error() {
            return Ok(TreeExpr::error(span));
        }

        let scrutinee_span = match_expr.scrutinee.span;
        let qualifier = match &scrutinee_ty.kind {
            // an enum switches on its discriminant, the leading common
            // field of every variant record
            TyKind::Adt(_) => {
                let first_record =
                    TreeExpr::field(match_scrutinee_expr.clone(), 0, scrutinee_span);
                TreeExpr::field(first_record, 0, scrutinee_span)
            }
            _ => match_scrutinee_expr.clone(),
        };

        // setup the end label so the cases can exit properly
        let end_label = self.new_label();

        // setup the switch-body-block
        self.push_block();
        for case in &match_expr.cases {
            let arm = &case.arm;
            lower_ensure!(!arm.patterns.is_empty(), arm.span, "match arm without patterns");

            if arm.guard.is_some() {
                self.diagnostics
                    .deferred(arm.span, "match arm guards are not yet supported");
            }

            // generate an artificial label for this arm
            let case_label = self.new_label();

            // each alternative pattern becomes a case-label test; bindings
            // happen as a side effect
            for case_pattern in &arm.patterns {
                let switch_case_stmt = self.compile_case_label(case_pattern, case_label)?;
                self.add_statement(switch_case_stmt);
                self.compile_pattern_bindings(case_pattern, &match_scrutinee_expr)?;
            }

            // compile the arm body, assigning it to the result temporary
            // when one exists
            let case_expr_tree = self.lower_expr(&case.body)?;
            if let Some(tmp) = &tmp {
                let result_reference = TreeExpr::var(tmp.id, tmp.ty.clone(), arm.span);
                self.add_statement(TreeStmt::Assign {
                    lhs: result_reference,
                    rhs: case_expr_tree,
                });
            }

            // unconditionally jump to the shared end label
            self.add_statement(TreeStmt::Goto(end_label));
        }

        let match_body = self.pop_block();
        self.add_statement(TreeStmt::Switch {
            value: qualifier,
            body: match_body,
        });
        self.add_statement(TreeStmt::LabelDef(end_label));

        Ok(match tmp {
            Some(tmp) => TreeExpr::var(tmp.id, tmp.ty, span),
            None => TreeExpr::unit(span),
        })
    }

    /// Pure tuple-match decomposition: split the scrutinee into head and
    /// tail, partition the cases by their first sub-pattern, and rebuild
    /// the match as a single-column outer match whose arm bodies are inner
    /// matches over the tail. Nothing is emitted here and the input tree is
    /// never mutated.
    fn simplify_tuple_match(
        &mut self,
        match_expr: &MatchExpr,
        mappings: &NodeMappings,
        span: Span,
    ) -> Result<MatchExpr> {
        let ExprKind::Tuple(elems) = &match_expr.scrutinee.kind else {
            return Ok(match_expr.clone());
        };
        lower_ensure!(!elems.is_empty(), span, "tuple scrutinee without elements");

        let head = elems[0].clone();
        // re-wrap the remaining columns, unwrapping a single remaining one
        let remaining = match elems.len() {
            1 => None,
            2 => Some(elems[1].clone()),
            _ => Some(Expr::new(
                match_expr.scrutinee.mappings,
                ExprKind::Tuple(elems[1..].to_vec()),
                match_expr.scrutinee.span,
            )),
        };

        // two cases share a partition iff their first sub-patterns are
        // structurally identical; wildcard-headed cases reach every
        // partition and additionally form the trailing default partition
        let mut partitions: Vec<TailPartition> = Vec::new();
        let mut default_cases: Vec<MatchCase> = Vec::new();
        let mut default_head: Option<Pat> = None;

        for case in &match_expr.cases {
            let Some((head_pattern, tail_case)) = self.split_tuple_case(case)? else {
                continue;
            };
            match head_pattern {
                HeadPattern::Literal(head_pat) => {
                    match partitions
                        .iter_mut()
                        .find(|partition| patterns_structurally_equal(&partition.head, &head_pat))
                    {
                        Some(partition) => partition.cases.push(tail_case),
                        None => partitions.push(TailPartition {
                            head: head_pat,
                            // earlier wildcard arms outrank this one for
                            // the same head value
                            cases: default_cases
                                .iter()
                                .cloned()
                                .chain(std::iter::once(tail_case))
                                .collect_vec(),
                        }),
                    }
                }
                HeadPattern::Any(head_pat) => {
                    for partition in partitions.iter_mut() {
                        partition.cases.push(tail_case.clone());
                    }
                    if default_head.is_none() {
                        default_head = Some(head_pat);
                    }
                    default_cases.push(tail_case);
                }
            }
        }

        if let Some(head) = default_head {
            partitions.push(TailPartition {
                head,
                cases: default_cases,
            });
        }

        // rebuild: one outer arm per distinct head, whose body is the
        // recursively simplified inner match over the tail
        let mut outer_cases = Vec::new();
        for partition in partitions {
            let body = match &remaining {
                Some(remaining_expr) => {
                    let inner = MatchExpr {
                        scrutinee: Box::new(remaining_expr.clone()),
                        cases: partition.cases,
                    };
                    let inner = self.simplify_tuple_match(&inner, mappings, span)?;
                    Expr::new(*mappings, ExprKind::Match(inner), span)
                }
                // single-column tuple: the partition's highest-priority
                // body is the arm body directly
                None => match partition.cases.first() {
                    Some(case) => (*case.body).clone(),
                    None => continue,
                },
            };

            let outer_arm = MatchArm {
                patterns: vec![partition.head],
                guard: None,
                span,
            };
            outer_cases.push(MatchCase {
                mappings: *mappings,
                arm: outer_arm,
                body: Box::new(body),
            });
        }

        Ok(MatchExpr {
            scrutinee: Box::new(head),
            cases: outer_cases,
        })
    }

    /// Pull the first tuple column out of a case, yielding the head
    /// pattern and a new case over the remaining columns. `None` drops the
    /// case (after a diagnostic) for forms we cannot decompose.
    fn split_tuple_case(&mut self, case: &MatchCase) -> Result<Option<(HeadPattern, MatchCase)>> {
        let arm = &case.arm;
        lower_ensure!(!arm.patterns.is_empty(), arm.span, "match arm without patterns");

        if arm.patterns.len() > 1 {
            self.diagnostics.deferred(
                arm.span,
                "alternative patterns in tuple matches are not yet supported",
            );
        }
        let pattern = &arm.patterns[0];

        let (head, tail_pattern) = match &pattern.kind {
            // a whole-arm wildcard matches every column
            PatKind::Wild => (
                HeadPattern::Any(pattern.clone()),
                wild_pattern(pattern, arm.span),
            ),
            PatKind::Binding(_) => {
                self.diagnostics.deferred(
                    pattern.span,
                    "binding a whole tuple scrutinee is not yet supported",
                );
                (
                    HeadPattern::Any(wild_pattern(pattern, pattern.span)),
                    wild_pattern(pattern, arm.span),
                )
            }
            PatKind::Tuple(TuplePatItems::Multiple(items)) => {
                lower_ensure!(!items.is_empty(), pattern.span, "tuple pattern without items");
                let first = items[0].clone();
                let rest = &items[1..];
                let tail = match rest.len() {
                    0 => wild_pattern(pattern, arm.span),
                    1 => rest[0].clone(),
                    _ => Pat {
                        mappings: pattern.mappings,
                        kind: PatKind::Tuple(TuplePatItems::Multiple(rest.to_vec())),
                        span: pattern.span,
                    },
                };
                let head = if matches!(first.kind, PatKind::Wild) {
                    HeadPattern::Any(first)
                } else if matches!(first.kind, PatKind::Binding(_)) {
                    // merged copies cannot re-bind the head value
                    self.diagnostics.deferred(
                        first.span,
                        "bindings in tuple pattern head position are not yet supported",
                    );
                    HeadPattern::Any(wild_pattern(&first, first.span))
                } else {
                    HeadPattern::Literal(first)
                };
                (head, tail)
            }
            PatKind::Tuple(TuplePatItems::Ranged { .. }) => {
                self.diagnostics
                    .deferred(pattern.span, "ranged tuple patterns are not yet supported");
                return Ok(None);
            }
            _ => lower_bail!(pattern.span, "unexpected pattern type in tuple match"),
        };

        let new_arm = MatchArm {
            patterns: vec![tail_pattern],
            guard: arm.guard.clone(),
            span: arm.span,
        };
        Ok(Some((
            head,
            MatchCase {
                mappings: case.mappings,
                arm: new_arm,
                body: case.body.clone(),
            },
        )))
    }
}

fn wild_pattern(template: &Pat, span: Span) -> Pat {
    Pat {
        mappings: template.mappings,
        kind: PatKind::Wild,
        span,
    }
}

/// Structural identity of patterns, ignoring node ids and spans.
fn patterns_structurally_equal(a: &Pat, b: &Pat) -> bool {
    match (&a.kind, &b.kind) {
        (PatKind::Wild, PatKind::Wild) => true,
        (PatKind::Binding(x), PatKind::Binding(y)) => x == y,
        (PatKind::Literal(x), PatKind::Literal(y)) => x == y,
        (PatKind::Path(x), PatKind::Path(y)) => x.segments == y.segments,
        (
            PatKind::Tuple(TuplePatItems::Multiple(xs)),
            PatKind::Tuple(TuplePatItems::Multiple(ys)),
        ) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|(x, y)| patterns_structurally_equal(x, y))
        }
        _ => false,
    }
}

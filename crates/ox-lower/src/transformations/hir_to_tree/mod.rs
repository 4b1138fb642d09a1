//! Lowering from typed HIR expressions to the backend tree IR.
//!
//! This is the convergence point of the front-end: type information,
//! operator-overload resolution, virtual dispatch and control-flow lowering
//! all meet here. The generator walks expressions recursively, produces one
//! translated tree expression per call, and threads side-effecting
//! statements into the innermost open block.

use ox_core::context::{DefMap, ResolutionCtx, TypeCtx};
use ox_core::diagnostics::DiagnosticManager;
use ox_core::error::Result;
use ox_core::hir::{self, HirId};
use ox_core::tree::{
    FnId, LabelId, TreeBlock, TreeExpr, TreeFunction, TreeProgram, TreeStmt, TreeTy, Var, VarId,
};
use ox_core::types::TyRef;
use std::collections::HashMap;

use super::IrTransform;

mod adjust;
mod aggregate;
mod callee;
mod expr;
mod item;
mod literal;
mod matches;
mod operators;
mod path;
mod patterns;
mod types;

#[cfg(test)]
mod tests;

pub use operators::LangItem;

/// An enclosing-function record on the generator's function stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FnContext {
    pub fn_id: FnId,
}

/// Generator for transforming typed HIR expressions to tree IR.
///
/// The oracle contexts are shared, read-only collaborators owned by the
/// compilation session; every mutable table here (the compiled-function
/// cache, declaration tables, block stack) is owned by the generator and
/// only ever grows through insert-if-absent operations.
pub struct TreeGenerator<'a> {
    tcx: &'a TypeCtx,
    resolver: &'a ResolutionCtx,
    mappings: &'a DefMap,
    diagnostics: DiagnosticManager,

    /// Lowered function declarations, in lowering order.
    functions: Vec<TreeFunction>,
    /// Already-lowered functions by the identity of their (possibly
    /// monomorphized) function type. Guarantees single-definition
    /// semantics: a second resolution returns the cached address.
    compiled_fns: HashMap<TyRef, FnId>,
    /// Same cache keyed by mangled symbol name, so distinct call-site
    /// type identities of one instantiation still share a definition.
    compiled_fn_names: HashMap<String, FnId>,

    const_decls: HashMap<HirId, TreeExpr>,
    var_decls: HashMap<HirId, Var>,
    pattern_bindings: HashMap<HirId, TreeExpr>,

    fn_stack: Vec<FnContext>,
    /// Open lexical blocks, innermost last. Index 0 is the session root
    /// block, so the stack is never empty.
    scope_stack: Vec<TreeBlock>,
    const_context: usize,

    next_fn_id: FnId,
    next_var_id: VarId,
    next_label_id: LabelId,
}

impl<'a> TreeGenerator<'a> {
    pub fn new(
        tcx: &'a TypeCtx,
        resolver: &'a ResolutionCtx,
        mappings: &'a DefMap,
        diagnostics: DiagnosticManager,
    ) -> Self {
        Self {
            tcx,
            resolver,
            mappings,
            diagnostics,
            functions: Vec::new(),
            compiled_fns: HashMap::new(),
            compiled_fn_names: HashMap::new(),
            const_decls: HashMap::new(),
            var_decls: HashMap::new(),
            pattern_bindings: HashMap::new(),
            fn_stack: Vec::new(),
            scope_stack: vec![TreeBlock::new()],
            const_context: 0,
            next_fn_id: 0,
            next_var_id: 0,
            next_label_id: 0,
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticManager {
        &self.diagnostics
    }

    /// Consume the generator and yield the lowered program.
    pub fn finish(self) -> TreeProgram {
        TreeProgram {
            functions: self.functions,
        }
    }

    pub fn insert_const_decl(&mut self, hir_id: HirId, value: TreeExpr) {
        self.const_decls.entry(hir_id).or_insert(value);
    }

    pub fn insert_var_decl(&mut self, hir_id: HirId, var: Var) {
        self.var_decls.entry(hir_id).or_insert(var);
    }

    pub(super) fn insert_pattern_binding(&mut self, hir_id: HirId, value: TreeExpr) {
        self.pattern_bindings.entry(hir_id).or_insert(value);
    }

    // -- block and function scope discipline (strictly nested) --

    pub(super) fn push_block(&mut self) {
        self.scope_stack.push(TreeBlock::new());
    }

    pub(super) fn pop_block(&mut self) -> TreeBlock {
        debug_assert!(self.scope_stack.len() > 1, "popping the session root block");
        self.scope_stack.pop().expect("block stack underflow")
    }

    pub(super) fn add_statement(&mut self, stmt: TreeStmt) {
        self.scope_stack
            .last_mut()
            .expect("no open block")
            .stmts
            .push(stmt);
    }

    pub(super) fn push_fn(&mut self, fn_id: FnId) {
        self.fn_stack.push(FnContext { fn_id });
    }

    pub(super) fn pop_fn(&mut self) {
        self.fn_stack.pop();
    }

    pub(super) fn peek_fn(&self) -> Option<&FnContext> {
        self.fn_stack.last()
    }

    // -- constant evaluation context --

    pub(super) fn const_context_p(&self) -> bool {
        self.const_context > 0
    }

    pub(super) fn enter_const_context(&mut self) {
        self.const_context += 1;
    }

    pub(super) fn exit_const_context(&mut self) {
        debug_assert!(self.const_context > 0);
        self.const_context -= 1;
    }

    // -- id allocation --

    pub(super) fn declare_variable(&mut self, name: impl Into<String>, ty: TreeTy) -> Var {
        let id = self.next_var_id;
        self.next_var_id += 1;
        Var {
            id,
            name: name.into(),
            ty,
        }
    }

    /// Allocate an artificial temporary together with its declaration
    /// statement; the caller threads the statement into its block.
    pub(super) fn temporary_variable(&mut self, ty: TreeTy) -> (Var, TreeStmt) {
        let var = self.declare_variable(format!("tmp.{}", self.next_var_id), ty);
        let stmt = TreeStmt::VarDecl {
            var: var.id,
            init: None,
        };
        (var, stmt)
    }

    /// Allocate an artificial label.
    pub(super) fn new_label(&mut self) -> LabelId {
        let id = self.next_label_id;
        self.next_label_id += 1;
        id
    }
}

impl<'a> IrTransform<hir::Expr, TreeExpr> for TreeGenerator<'a> {
    fn transform(&mut self, source: hir::Expr) -> Result<TreeExpr> {
        self.lower_expr(&source)
    }
}

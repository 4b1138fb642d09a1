//! Lazy function-item lowering.
//!
//! Items are lowered on first use and cached by the identity of their
//! (possibly monomorphized) function type and by mangled name, so one
//! instantiation is only ever emitted once.

use super::TreeGenerator;
use crate::lower_bail;
use ox_core::error::Result;
use ox_core::hir;
use ox_core::tree::{FnId, TreeFunction, TreeStmt, TreeTy};
use ox_core::types::FnTy;

impl<'a> TreeGenerator<'a> {
    /// Lower a function declaration for the given (concrete) function type
    /// and return its address handle. Insert-if-absent: a previously
    /// lowered signature returns the cached id untouched.
    pub(super) fn lower_function_item(
        &mut self,
        function: &hir::Function,
        fntype: &FnTy,
    ) -> Result<FnId> {
        if let Some(fn_id) = self.compiled_fns.get(&fntype.ty_ref).copied() {
            return Ok(fn_id);
        }

        let name = fntype.mangled_name();
        if let Some(fn_id) = self.compiled_fn_names.get(&name).copied() {
            // same instantiation reached through a different call-site type
            self.compiled_fns.insert(fntype.ty_ref, fn_id);
            return Ok(fn_id);
        }

        if fntype.needs_substitution() {
            lower_bail!(
                function.span,
                "cannot lower {} without concrete substitutions",
                fntype.ident
            );
        }

        tracing::debug!(name = %name, "lowering function item");

        let fn_id = self.next_fn_id;
        self.next_fn_id += 1;

        let mut params = Vec::new();
        for ((_, param_ty), hir_param) in fntype.params.iter().zip(function.params.iter()) {
            let compiled = self.compile_ty(param_ty);
            let var = self.declare_variable(hir_param.ident.as_str(), compiled);
            self.insert_var_decl(hir_param.mappings.hir_id, var.clone());
            params.push(var);
        }
        let ret = self.compile_ty(&fntype.output);

        // register before lowering the body so recursive references find
        // the declaration
        self.compiled_fns.insert(fntype.ty_ref, fn_id);
        self.compiled_fn_names.insert(name.clone(), fn_id);
        self.functions.push(TreeFunction {
            id: fn_id,
            name,
            params,
            ret,
            body: None,
        });

        if let Some(body) = &function.body {
            let body = (**body).clone();
            self.push_fn(fn_id);
            self.push_block();
            let value = self.lower_expr(&body)?;
            if !value.is_error() && !matches!(value.ty, TreeTy::Void) {
                self.add_statement(TreeStmt::Expr(value));
            }
            let block = self.pop_block();
            self.pop_fn();
            if let Some(decl) = self.functions.iter_mut().find(|f| f.id == fn_id) {
                decl.body = Some(block);
            }
        }

        Ok(fn_id)
    }
}

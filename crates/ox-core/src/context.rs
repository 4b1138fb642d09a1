//! Read-mostly oracle contexts owned by the compilation session.
//!
//! The upstream stages (type inference, name resolution, HIR building)
//! populate these through insert-if-absent registration; lowering only ever
//! reads them. Single-threaded by construction, so plain maps suffice.

use crate::hir::{self, CrateNum, DefId, HirId, NodeId, Symbol};
use crate::span::Span;
use crate::types::adjust::Adjustment;
use crate::types::{FloatTy, FnTy, IntTy, Ty, TyKind, TyRef, UintTy};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Reserved `TyRef` range for the built-in primitive types.
const BUILTIN_TY_REF_BASE: TyRef = 0xFFFF_0000;

static BUILTIN_TYPES: Lazy<Vec<(&'static str, TyKind)>> = Lazy::new(|| {
    vec![
        ("bool", TyKind::Bool),
        ("char", TyKind::Char),
        ("str", TyKind::Str),
        ("i8", TyKind::Int(IntTy::I8)),
        ("i16", TyKind::Int(IntTy::I16)),
        ("i32", TyKind::Int(IntTy::I32)),
        ("i64", TyKind::Int(IntTy::I64)),
        ("i128", TyKind::Int(IntTy::I128)),
        ("isize", TyKind::Int(IntTy::Isize)),
        ("u8", TyKind::Uint(UintTy::U8)),
        ("u16", TyKind::Uint(UintTy::U16)),
        ("u32", TyKind::Uint(UintTy::U32)),
        ("u64", TyKind::Uint(UintTy::U64)),
        ("u128", TyKind::Uint(UintTy::U128)),
        ("usize", TyKind::Uint(UintTy::Usize)),
        ("f32", TyKind::Float(FloatTy::F32)),
        ("f64", TyKind::Float(FloatTy::F64)),
    ]
});

/// A name-resolution definition record; `parent` is the declaration the
/// resolved pattern belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    pub parent: NodeId,
}

/// One item of a trait, as seen by trait resolution. `optional` means the
/// trait ships a default body the call can fall back to.
#[derive(Debug, Clone, PartialEq)]
pub struct TraitItemRef {
    pub hir_id: HirId,
    pub name: Symbol,
    pub optional: bool,
    pub fn_ty: FnTy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraitReference {
    pub did: DefId,
    pub ident: Symbol,
    pub items: Vec<TraitItemRef>,
}

impl TraitReference {
    pub fn lookup_trait_item(&self, name: &Symbol) -> Option<&TraitItemRef> {
        self.items.iter().find(|item| &item.name == name)
    }
}

/// An implementation candidate produced by `TypeCtx::probe`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathProbeCandidate {
    pub ty: FnTy,
    pub impl_item: Option<HirId>,
    pub trait_item: Option<HirId>,
}

impl PathProbeCandidate {
    pub fn is_impl_candidate(&self) -> bool {
        self.impl_item.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ImplItemRecord {
    name: Symbol,
    impl_item: HirId,
    fn_ty: FnTy,
}

/// The query surface of the type-inference engine.
#[derive(Debug, Default)]
pub struct TypeCtx {
    types: HashMap<HirId, Ty>,
    operator_overloads: HashMap<HirId, FnTy>,
    receivers: HashMap<HirId, Ty>,
    autoderef_mappings: HashMap<HirId, Vec<Adjustment>>,
    variant_definitions: HashMap<HirId, HirId>,
    trait_references: HashMap<DefId, TraitReference>,
    impl_items: HashMap<TyRef, Vec<ImplItemRecord>>,
}

impl TypeCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_type(&mut self, id: HirId, ty: Ty) {
        self.types.entry(id).or_insert(ty);
    }

    pub fn lookup_type(&self, id: HirId) -> Option<&Ty> {
        self.types.get(&id)
    }

    pub fn insert_operator_overload(&mut self, id: HirId, fn_ty: FnTy) {
        self.operator_overloads.entry(id).or_insert(fn_ty);
    }

    /// Absence means "use the primitive operation".
    pub fn lookup_operator_overload(&self, id: HirId) -> Option<&FnTy> {
        self.operator_overloads.get(&id)
    }

    pub fn insert_receiver(&mut self, id: HirId, ty: Ty) {
        self.receivers.entry(id).or_insert(ty);
    }

    pub fn lookup_receiver(&self, id: HirId) -> Option<&Ty> {
        self.receivers.get(&id)
    }

    pub fn insert_autoderef_mappings(&mut self, id: HirId, adjustments: Vec<Adjustment>) {
        self.autoderef_mappings.entry(id).or_insert(adjustments);
    }

    pub fn lookup_autoderef_mappings(&self, id: HirId) -> Option<&[Adjustment]> {
        self.autoderef_mappings.get(&id).map(Vec::as_slice)
    }

    pub fn insert_variant_definition(&mut self, id: HirId, variant: HirId) {
        self.variant_definitions.entry(id).or_insert(variant);
    }

    pub fn lookup_variant_definition(&self, id: HirId) -> Option<HirId> {
        self.variant_definitions.get(&id).copied()
    }

    pub fn insert_trait_reference(&mut self, reference: TraitReference) {
        self.trait_references.entry(reference.did).or_insert(reference);
    }

    pub fn lookup_trait_reference(&self, did: DefId) -> Option<&TraitReference> {
        self.trait_references.get(&did)
    }

    /// Register an impl-block method for the given receiver root type.
    pub fn insert_impl_item(&mut self, receiver: TyRef, name: Symbol, impl_item: HirId, fn_ty: FnTy) {
        self.impl_items.entry(receiver).or_default().push(ImplItemRecord {
            name,
            impl_item,
            fn_ty,
        });
    }

    /// Probe candidate implementations of `segment` for the receiver's root
    /// type. Ambiguity is not resolved here; callers assert on the count.
    pub fn probe(
        &self,
        root: &Ty,
        segment: &Symbol,
        probe_impls: bool,
        probe_bounds: bool,
        ignore_mandatory_trait_items: bool,
    ) -> Vec<PathProbeCandidate> {
        let mut candidates = Vec::new();
        if probe_impls {
            if let Some(records) = self.impl_items.get(&root.ty_ref) {
                for record in records.iter().filter(|record| &record.name == segment) {
                    candidates.push(PathProbeCandidate {
                        ty: record.fn_ty.clone(),
                        impl_item: Some(record.impl_item),
                        trait_item: None,
                    });
                }
            }
        }
        if probe_bounds {
            for trait_ref in self.trait_references.values() {
                for item in trait_ref.items.iter().filter(|item| &item.name == segment) {
                    if ignore_mandatory_trait_items && !item.optional {
                        continue;
                    }
                    candidates.push(PathProbeCandidate {
                        ty: item.fn_ty.clone(),
                        impl_item: None,
                        trait_item: Some(item.hir_id),
                    });
                }
            }
        }
        candidates
    }

    pub fn lookup_builtin(&self, name: &str) -> Option<Ty> {
        BUILTIN_TYPES
            .iter()
            .position(|(builtin, _)| *builtin == name)
            .map(|idx| Ty::new(BUILTIN_TY_REF_BASE + idx as TyRef, BUILTIN_TYPES[idx].1.clone()))
    }
}

/// The query surface of the name resolver.
#[derive(Debug, Default)]
pub struct ResolutionCtx {
    resolved_names: HashMap<NodeId, NodeId>,
    resolved_types: HashMap<NodeId, NodeId>,
    definitions: HashMap<NodeId, Definition>,
}

impl ResolutionCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_resolved_name(&mut self, node: NodeId, resolved: NodeId) {
        self.resolved_names.entry(node).or_insert(resolved);
    }

    pub fn lookup_resolved_name(&self, node: NodeId) -> Option<NodeId> {
        self.resolved_names.get(&node).copied()
    }

    pub fn insert_resolved_type(&mut self, node: NodeId, resolved: NodeId) {
        self.resolved_types.entry(node).or_insert(resolved);
    }

    pub fn lookup_resolved_type(&self, node: NodeId) -> Option<NodeId> {
        self.resolved_types.get(&node).copied()
    }

    pub fn insert_definition(&mut self, node: NodeId, definition: Definition) {
        self.definitions.entry(node).or_insert(definition);
    }

    pub fn lookup_definition(&self, node: NodeId) -> Option<&Definition> {
        self.definitions.get(&node)
    }
}

/// The declaration mapping tables: AST node to HIR id reverse lookups and
/// id-to-declaration queries for lazy lowering.
#[derive(Debug, Default)]
pub struct DefMap {
    node_to_hir: HashMap<(CrateNum, NodeId), HirId>,
    hir_items: HashMap<HirId, hir::Item>,
    hir_impl_items: HashMap<HirId, hir::ImplItem>,
    hir_trait_items: HashMap<HirId, hir::TraitItem>,
    trait_item_to_trait: HashMap<HirId, DefId>,
    locations: HashMap<TyRef, Span>,
}

impl DefMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node_to_hir(&mut self, crate_num: CrateNum, node: NodeId, hir_id: HirId) {
        self.node_to_hir.entry((crate_num, node)).or_insert(hir_id);
    }

    pub fn lookup_node_to_hir(&self, crate_num: CrateNum, node: NodeId) -> Option<HirId> {
        self.node_to_hir.get(&(crate_num, node)).copied()
    }

    pub fn insert_hir_item(&mut self, item: hir::Item) {
        self.hir_items.entry(item.mappings.hir_id).or_insert(item);
    }

    pub fn lookup_hir_item(&self, hir_id: HirId) -> Option<&hir::Item> {
        self.hir_items.get(&hir_id)
    }

    pub fn insert_hir_implitem(&mut self, item: hir::ImplItem) {
        self.hir_impl_items.entry(item.mappings.hir_id).or_insert(item);
    }

    pub fn lookup_hir_implitem(&self, hir_id: HirId) -> Option<&hir::ImplItem> {
        self.hir_impl_items.get(&hir_id)
    }

    pub fn insert_hir_trait_item(&mut self, trait_did: DefId, item: hir::TraitItem) {
        let hir_id = item.mappings.hir_id;
        self.hir_trait_items.entry(hir_id).or_insert(item);
        self.trait_item_to_trait.entry(hir_id).or_insert(trait_did);
    }

    pub fn lookup_hir_trait_item(&self, hir_id: HirId) -> Option<&hir::TraitItem> {
        self.hir_trait_items.get(&hir_id)
    }

    /// The trait a trait item belongs to.
    pub fn lookup_trait_item_mapping(&self, hir_id: HirId) -> Option<DefId> {
        self.trait_item_to_trait.get(&hir_id).copied()
    }

    pub fn insert_location(&mut self, ty_ref: TyRef, span: Span) {
        self.locations.entry(ty_ref).or_insert(span);
    }

    pub fn lookup_location(&self, ty_ref: TyRef) -> Span {
        self.locations.get(&ty_ref).copied().unwrap_or_else(Span::dummy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_stable() {
        let tcx = TypeCtx::new();
        let usize_ty = tcx.lookup_builtin("usize").expect("usize registered");
        assert!(matches!(usize_ty.kind, TyKind::Uint(UintTy::Usize)));
        assert_eq!(usize_ty.ty_ref, tcx.lookup_builtin("usize").unwrap().ty_ref);
        assert!(tcx.lookup_builtin("quux").is_none());
    }

    #[test]
    fn registration_is_insert_if_absent() {
        let mut tcx = TypeCtx::new();
        let first = Ty::new(1, TyKind::Bool);
        let second = Ty::new(1, TyKind::Char);
        tcx.insert_type(7, first);
        tcx.insert_type(7, second);
        assert!(matches!(tcx.lookup_type(7).unwrap().kind, TyKind::Bool));
    }
}

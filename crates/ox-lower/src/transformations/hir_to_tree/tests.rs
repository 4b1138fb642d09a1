use super::*;
use ox_core::context::{Definition, TraitItemRef, TraitReference};
use ox_core::diagnostics::{DiagnosticManager, NOT_YET_SUPPORTED, OVERFLOW_ERROR};
use ox_core::error::Error;
use ox_core::hir::{
    self, ArrayElems, BinOp, Expr, ExprKind, Lit, MatchArm, MatchCase, MatchExpr, NodeMappings,
    Pat, PatKind, PathSegment, Symbol, TuplePatItems,
};
use ox_core::span::Span;
use ox_core::tree::{TreeExprKind, TreeStmt, TreeTy};
use ox_core::types::adjust::{Adjustment, AdjustmentKind};
use ox_core::types::{
    AdtDef, AdtFlags, DynItem, DynamicObject, FieldDef, FnTy, IntTy, Mutability as TyMut, ParamTy,
    SubstParam, Ty, TyKind, UintTy, VariantDef, VariantDiscr,
};
use pretty_assertions::assert_eq;

/// Test stand-in for the upstream stages: owns the oracle contexts and
/// allocates node identities.
struct Session {
    tcx: ox_core::context::TypeCtx,
    resolver: ox_core::context::ResolutionCtx,
    mappings: ox_core::context::DefMap,
    diagnostics: DiagnosticManager,
    next_id: u32,
}

impl Session {
    fn new() -> Self {
        Self {
            tcx: ox_core::context::TypeCtx::new(),
            resolver: ox_core::context::ResolutionCtx::new(),
            mappings: ox_core::context::DefMap::new(),
            diagnostics: DiagnosticManager::new(),
            next_id: 1,
        }
    }

    /// Fresh identity triple; node and HIR ids share the counter.
    fn alloc(&mut self) -> NodeMappings {
        let id = self.next_id;
        self.next_id += 1;
        NodeMappings::new(0, id, id)
    }

    fn alloc_ty_ref(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        1_000_000 + id
    }

    fn i32_ty(&mut self) -> Ty {
        Ty::new(self.alloc_ty_ref(), TyKind::Int(IntTy::I32))
    }

    fn uint_ty(&mut self, uint: UintTy) -> Ty {
        Ty::new(self.alloc_ty_ref(), TyKind::Uint(uint))
    }

    fn unit_ty(&mut self) -> Ty {
        Ty::new(self.alloc_ty_ref(), TyKind::Tuple(Vec::new()))
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let mappings = self.alloc();
        Expr::new(mappings, kind, Span::dummy())
    }

    fn typed_expr(&mut self, kind: ExprKind, ty: Ty) -> Expr {
        let e = self.expr(kind);
        self.tcx.insert_type(e.hir_id(), ty);
        e
    }

    fn int_lit(&mut self, text: &str, ty: Ty) -> Expr {
        self.typed_expr(ExprKind::Literal(Lit::Integer(text.into())), ty)
    }

    fn pat(&mut self, kind: PatKind) -> Pat {
        Pat {
            mappings: self.alloc(),
            kind,
            span: Span::dummy(),
        }
    }

    fn typed_pat(&mut self, kind: PatKind, ty: Ty) -> Pat {
        let p = self.pat(kind);
        self.tcx.insert_type(p.hir_id(), ty);
        p
    }

    fn case(&mut self, patterns: Vec<Pat>, body: Expr) -> MatchCase {
        MatchCase {
            mappings: self.alloc(),
            arm: MatchArm {
                patterns,
                guard: None,
                span: Span::dummy(),
            },
            body: Box::new(body),
        }
    }
}

fn collect_switches(stmts: &[TreeStmt]) -> Vec<&TreeStmt> {
    let mut found = Vec::new();
    for stmt in stmts {
        if let TreeStmt::Switch { .. } = stmt {
            found.push(stmt);
        }
    }
    found
}

fn case_label_values(stmts: &[TreeStmt]) -> Vec<Option<i128>> {
    stmts
        .iter()
        .filter_map(|stmt| match stmt {
            TreeStmt::CaseLabel { value, .. } => Some(value.as_ref().map(|v| match &v.kind {
                TreeExprKind::IntConst(i) => *i,
                other => panic!("non-integer case label: {:?}", other),
            })),
            _ => None,
        })
        .collect()
}

#[test]
fn integer_literal_respects_type_bounds() {
    let mut s = Session::new();
    let u8_ty = s.uint_ty(UintTy::U8);
    let u16_ty = s.uint_ty(UintTy::U16);
    let narrow = s.int_lit("300", u8_ty);
    let wide = s.int_lit("300", u16_ty);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());

    let narrow_result = generator.lower_expr(&narrow).unwrap();
    assert!(narrow_result.is_error());
    let diags = s.diagnostics.get_diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code.as_deref(), Some(OVERFLOW_ERROR));

    let wide_result = generator.lower_expr(&wide).unwrap();
    assert_eq!(wide_result.kind, TreeExprKind::IntConst(300));
    assert_eq!(
        wide_result.ty,
        TreeTy::Int {
            bits: 16,
            signed: false
        }
    );
    // no new diagnostics for the in-range literal
    assert_eq!(s.diagnostics.get_diagnostics().len(), 1);
}

#[test]
fn float_literal_overflow_is_reported() {
    let mut s = Session::new();
    let f32_ty = Ty::new(s.alloc_ty_ref(), TyKind::Float(ox_core::types::FloatTy::F32));
    let fits = s.typed_expr(ExprKind::Literal(Lit::Float("2.5".into())), f32_ty.clone());
    let overflows = s.typed_expr(ExprKind::Literal(Lit::Float("1e300".into())), f32_ty);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());

    let ok = generator.lower_expr(&fits).unwrap();
    assert_eq!(ok.kind, TreeExprKind::FloatConst(2.5));

    let bad = generator.lower_expr(&overflows).unwrap();
    assert!(bad.is_error());
    let diags = s.diagnostics.get_diagnostics();
    assert_eq!(diags.last().unwrap().code.as_deref(), Some(OVERFLOW_ERROR));
}

#[test]
fn byte_string_literal_is_a_thin_pointer() {
    let mut s = Session::new();
    let u8_ty = s.uint_ty(UintTy::U8);
    let array_ty = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Array {
            elem: Box::new(u8_ty),
            capacity: 2,
        },
    );
    let ref_ty = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Ref {
            base: Box::new(array_ty),
            mutbl: TyMut::Not,
        },
    );
    let literal = s.typed_expr(ExprKind::Literal(Lit::ByteStr(b"ab".to_vec())), ref_ty);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&literal).unwrap();

    // a thin pointer to a two-element byte array, not a fat pointer
    assert!(matches!(result.ty, TreeTy::Pointer(_)));
    let TreeExprKind::AddressOf(array) = &result.kind else {
        panic!("expected address-of, got {:?}", result.kind);
    };
    let TreeExprKind::ArrayCtor { indexes, values } = &array.kind else {
        panic!("expected array constructor, got {:?}", array.kind);
    };
    assert_eq!(indexes, &[0, 1]);
    assert_eq!(values[0].kind, TreeExprKind::ByteConst(97));
    assert_eq!(values[1].kind, TreeExprKind::ByteConst(98));
}

#[test]
fn string_literal_builds_a_fat_pointer() {
    let mut s = Session::new();
    let str_ty = Ty::new(s.alloc_ty_ref(), TyKind::Str);
    let ref_str = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Ref {
            base: Box::new(str_ty),
            mutbl: TyMut::Not,
        },
    );
    let literal = s.typed_expr(ExprKind::Literal(Lit::Str("ab".into())), ref_str);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&literal).unwrap();

    assert!(result.ty.is_slice());
    let TreeExprKind::Constructor { fields, .. } = &result.kind else {
        panic!("expected fat-pointer constructor, got {:?}", result.kind);
    };
    assert_eq!(fields.len(), 2);
    assert!(matches!(fields[0].kind, TreeExprKind::AddressOf(_)));
    assert_eq!(fields[1].kind, TreeExprKind::IntConst(2));
}

#[test]
fn adjustment_application_is_deterministic() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();
    let array_ty = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Array {
            elem: Box::new(i32_ty.clone()),
            capacity: 4,
        },
    );
    let slice_ty = Ty::new(s.alloc_ty_ref(), TyKind::Slice(Box::new(i32_ty)));
    let adjustments = vec![Adjustment::new(AdjustmentKind::Unsize, slice_ty)];

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());

    let tree_array_ty = TreeTy::Array {
        elem: Box::new(TreeTy::Int {
            bits: 32,
            signed: true,
        }),
        len: 4,
    };
    let value = ox_core::tree::TreeExpr::var(9, tree_array_ty.clone(), Span::dummy());
    let again = ox_core::tree::TreeExpr::var(9, tree_array_ty, Span::dummy());

    let first = generator
        .apply_adjustments(&adjustments, value, Span::dummy())
        .unwrap();
    let second = generator
        .apply_adjustments(&adjustments, again, Span::dummy())
        .unwrap();

    assert_eq!(first, second);

    // the fat pointer carries {data pointer, domain element count}
    assert!(first.ty.is_slice());
    let TreeExprKind::Constructor { fields, .. } = &first.kind else {
        panic!("expected fat-pointer constructor, got {:?}", first.kind);
    };
    assert!(matches!(fields[0].kind, TreeExprKind::AddressOf(_)));
    assert_eq!(fields[1].kind, TreeExprKind::IntConst(4));
}

fn enum_foo(s: &mut Session, discr_b: Expr) -> Ty {
    let i32_ty = s.i32_ty();
    let adt = AdtDef {
        did: 40,
        ident: Symbol::from("Foo"),
        flags: AdtFlags::IS_ENUM,
        variants: vec![
            VariantDef {
                id: 30,
                ident: Symbol::from("A"),
                fields: Vec::new(),
                discr: VariantDiscr::Relative(0),
            },
            VariantDef {
                id: 31,
                ident: Symbol::from("B"),
                fields: vec![FieldDef {
                    ident: Symbol::from("0"),
                    ty: i32_ty,
                }],
                discr: VariantDiscr::Explicit(Box::new(discr_b)),
            },
        ],
        substs: Vec::new(),
    };
    Ty::new(s.alloc_ty_ref(), TyKind::Adt(adt))
}

#[test]
fn enum_constructor_leads_with_folded_discriminant() {
    let mut s = Session::new();

    // discriminant expression 1 + 2, folded to 3 at the construction site
    let i32_ty = s.i32_ty();
    let one = s.int_lit("1", i32_ty.clone());
    let two = s.int_lit("2", i32_ty.clone());
    let discr = s.typed_expr(
        ExprKind::ArithmeticOrLogical {
            op: BinOp::Add,
            lhs: Box::new(one),
            rhs: Box::new(two),
        },
        i32_ty.clone(),
    );

    let foo_ty = enum_foo(&mut s, discr);
    let callee = s.typed_expr(
        ExprKind::Path(hir::Path::new(vec![
            Symbol::from("Foo"),
            Symbol::from("B"),
        ])),
        foo_ty.clone(),
    );
    s.tcx.insert_variant_definition(callee.hir_id(), 31);

    let payload = s.int_lit("7", i32_ty);
    let call = s.typed_expr(
        ExprKind::Call {
            callee: Box::new(callee),
            args: vec![payload],
        },
        foo_ty,
    );

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&call).unwrap();

    let TreeExprKind::Constructor {
        is_union,
        union_discriminator,
        fields,
    } = &result.kind
    else {
        panic!("expected constructor, got {:?}", result.kind);
    };
    assert!(is_union);
    assert_eq!(*union_discriminator, Some(1));
    // folded discriminant first, then the payload fields in order
    assert_eq!(fields[0].kind, TreeExprKind::IntConst(3));
    assert_eq!(fields[1].kind, TreeExprKind::IntConst(7));
}

#[test]
fn tuple_match_decomposes_into_nested_switches() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();

    // match (1, 2) { (1, 2) => 10, (1, 3) => 20, _ => 30 }
    let one = s.int_lit("1", i32_ty.clone());
    let two = s.int_lit("2", i32_ty.clone());
    let tuple_ty = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Tuple(vec![i32_ty.clone(), i32_ty.clone()]),
    );
    let scrutinee = s.typed_expr(ExprKind::Tuple(vec![one, two]), tuple_ty);

    let p_one_a = s.typed_pat(PatKind::Literal(Lit::Integer("1".into())), i32_ty.clone());
    let p_two = s.typed_pat(PatKind::Literal(Lit::Integer("2".into())), i32_ty.clone());
    let p_one_b = s.typed_pat(PatKind::Literal(Lit::Integer("1".into())), i32_ty.clone());
    let p_three = s.typed_pat(PatKind::Literal(Lit::Integer("3".into())), i32_ty.clone());
    let p_wild = s.pat(PatKind::Wild);

    let case_a_pat = s.pat(PatKind::Tuple(TuplePatItems::Multiple(vec![
        p_one_a, p_two,
    ])));
    let case_b_pat = s.pat(PatKind::Tuple(TuplePatItems::Multiple(vec![
        p_one_b, p_three,
    ])));

    let body_a = s.int_lit("10", i32_ty.clone());
    let body_b = s.int_lit("20", i32_ty.clone());
    let body_c = s.int_lit("30", i32_ty.clone());

    let case_a = s.case(vec![case_a_pat], body_a);
    let case_b = s.case(vec![case_b_pat], body_b);
    let case_c = s.case(vec![p_wild], body_c);

    let match_expr = s.typed_expr(
        ExprKind::Match(MatchExpr {
            scrutinee: Box::new(scrutinee),
            cases: vec![case_a, case_b, case_c],
        }),
        i32_ty,
    );

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&match_expr).unwrap();
    assert!(matches!(result.kind, TreeExprKind::Var(_)));

    // outer switch over the first tuple element
    let root = &generator.scope_stack[0];
    let outer_switches = collect_switches(&root.stmts);
    assert_eq!(outer_switches.len(), 1);
    let TreeStmt::Switch { value, body } = outer_switches[0] else {
        unreachable!();
    };
    assert_eq!(value.kind, TreeExprKind::IntConst(1));

    // one arm for head value 1, one default arm from the wildcard case
    assert_eq!(case_label_values(&body.stmts), vec![Some(1), None]);

    // the head-1 arm nests a switch over the second element with the
    // original second-column values, the merged wildcard as its default
    let inner_switches = collect_switches(&body.stmts);
    assert_eq!(inner_switches.len(), 2);
    let TreeStmt::Switch { value, body } = inner_switches[0] else {
        unreachable!();
    };
    assert_eq!(value.kind, TreeExprKind::IntConst(2));
    assert_eq!(case_label_values(&body.stmts), vec![Some(2), Some(3), None]);

    // the trailing default partition only carries the wildcard arm
    let TreeStmt::Switch { body, .. } = inner_switches[1] else {
        unreachable!();
    };
    assert_eq!(case_label_values(&body.stmts), vec![None]);
}

fn dyn_object(s: &mut Session) -> DynamicObject {
    let unit = s.unit_ty();
    let fn_a = FnTy {
        def_id: 10,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("greet"),
        params: Vec::new(),
        output: Box::new(unit.clone()),
        substs: Vec::new(),
        is_varargs: false,
    };
    let fn_b = FnTy {
        def_id: 11,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("speak"),
        params: Vec::new(),
        output: Box::new(unit),
        substs: Vec::new(),
        is_varargs: false,
    };
    DynamicObject {
        ident: Symbol::from("Speak"),
        items: vec![
            DynItem {
                trait_item: 100,
                fn_ty: fn_a,
            },
            DynItem {
                trait_item: 101,
                fn_ty: fn_b,
            },
        ],
    }
}

#[test]
fn dynamic_dispatch_calls_through_the_positional_vtable_slot() {
    let mut s = Session::new();
    let object = dyn_object(&mut s);
    assert_eq!(object.slot_of(10), Some(0));
    assert_eq!(object.slot_of(11), Some(1));
    let method_fn_ty = object.items[1].fn_ty.clone();

    let dyn_ty = Ty::new(s.alloc_ty_ref(), TyKind::Dynamic(object));
    let ref_dyn = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Ref {
            base: Box::new(dyn_ty),
            mutbl: TyMut::Not,
        },
    );

    // the receiver resolves to a local declaration of type &dyn Speak
    let receiver = s.expr(ExprKind::Identifier(Symbol::from("obj")));
    let decl = s.alloc();
    s.resolver
        .insert_resolved_name(receiver.mappings.node_id, decl.node_id);
    s.resolver
        .insert_definition(decl.node_id, Definition { parent: decl.node_id });
    s.mappings.insert_node_to_hir(0, decl.node_id, decl.hir_id);
    s.tcx.insert_type(decl.hir_id, ref_dyn.clone());

    let segment = PathSegment {
        mappings: s.alloc(),
        ident: Symbol::from("speak"),
    };
    let fn_def_ty = Ty::new(s.alloc_ty_ref(), TyKind::FnDef(method_fn_ty));
    s.tcx.insert_type(segment.mappings.hir_id, fn_def_ty);

    let unit = s.unit_ty();
    let call = s.typed_expr(
        ExprKind::MethodCall {
            receiver: Box::new(receiver),
            segment,
            args: Vec::new(),
        },
        unit,
    );
    // method calls resolve through the name tables even when dispatched
    // dynamically
    let resolved = s.alloc();
    s.resolver
        .insert_resolved_name(call.mappings.node_id, resolved.node_id);
    s.mappings
        .insert_node_to_hir(0, resolved.node_id, resolved.hir_id);
    s.tcx.insert_receiver(call.hir_id(), ref_dyn.clone());
    s.tcx.insert_autoderef_mappings(call.hir_id(), Vec::new());

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let receiver_var = generator.declare_variable("obj", generator.compile_ty(&ref_dyn));
    generator.insert_var_decl(decl.hir_id, receiver_var);

    let result = generator.lower_expr(&call).unwrap();

    let TreeExprKind::Call { callee, args } = &result.kind else {
        panic!("expected a call, got {:?}", result.kind);
    };
    // the callable is the vtable slot matching the trait-item position
    let TreeExprKind::VtableRef { slot, vtable, .. } = &callee.kind else {
        panic!("expected vtable dispatch, got {:?}", callee.kind);
    };
    assert_eq!(*slot, 1);
    assert!(matches!(vtable.kind, TreeExprKind::ArrayIndex { .. }));
    // the adjusted receiver is the object's data pointer, field 0
    let TreeExprKind::FieldAccess { index, .. } = &args[0].kind else {
        panic!("expected data-pointer access, got {:?}", args[0].kind);
    };
    assert_eq!(*index, 0);
}

struct TraitFixture {
    foo_ty: Ty,
    trait_item_hir: u32,
    expected_fn: FnTy,
}

fn trait_fixture(s: &mut Session, default_body: bool) -> TraitFixture {
    let foo_adt = AdtDef {
        did: 60,
        ident: Symbol::from("Foo"),
        flags: AdtFlags::IS_STRUCT,
        variants: vec![VariantDef {
            id: 61,
            ident: Symbol::from("Foo"),
            fields: Vec::new(),
            discr: VariantDiscr::Relative(0),
        }],
        substs: Vec::new(),
    };
    let foo_ty = Ty::new(s.alloc_ty_ref(), TyKind::Adt(foo_adt));

    let trait_item_mappings = s.alloc();
    let trait_fn = hir::Function {
        mappings: s.alloc(),
        ident: Symbol::from("speak"),
        params: Vec::new(),
        body: None,
        span: Span::dummy(),
    };
    let trait_fn_ty = FnTy {
        def_id: 62,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("speak"),
        params: vec![(Symbol::from("self"), foo_ty.clone())],
        output: Box::new(foo_ty.clone()),
        substs: Vec::new(),
        is_varargs: false,
    };
    s.mappings.insert_hir_trait_item(
        55,
        hir::TraitItem {
            mappings: trait_item_mappings,
            function: trait_fn,
        },
    );
    s.tcx.insert_trait_reference(TraitReference {
        did: 55,
        ident: Symbol::from("Speak"),
        items: vec![TraitItemRef {
            hir_id: trait_item_mappings.hir_id,
            name: Symbol::from("speak"),
            optional: default_body,
            fn_ty: trait_fn_ty,
        }],
    });

    let expected_fn = FnTy {
        def_id: 63,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("speak"),
        params: vec![(Symbol::from("self"), foo_ty.clone())],
        output: Box::new(foo_ty.clone()),
        substs: Vec::new(),
        is_varargs: false,
    };

    TraitFixture {
        foo_ty,
        trait_item_hir: trait_item_mappings.hir_id,
        expected_fn,
    }
}

fn register_generic_impl(s: &mut Session, fixture: &TraitFixture) {
    let impl_mappings = s.alloc();
    s.mappings.insert_hir_implitem(hir::ImplItem {
        mappings: impl_mappings,
        kind: hir::ImplItemKind::Function(hir::Function {
            mappings: impl_mappings,
            ident: Symbol::from("speak"),
            params: Vec::new(),
            body: None,
            span: Span::dummy(),
        }),
    });

    let param = ParamTy {
        name: Symbol::from("T"),
        resolved: None,
    };
    let param_ty = Ty::new(s.alloc_ty_ref(), TyKind::Param(param.clone()));
    let generic_fn = FnTy {
        def_id: 64,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("speak"),
        params: vec![(Symbol::from("self"), param_ty.clone())],
        output: Box::new(param_ty),
        substs: vec![SubstParam { param, arg: None }],
        is_varargs: false,
    };
    s.tcx.insert_impl_item(
        fixture.foo_ty.ty_ref,
        Symbol::from("speak"),
        impl_mappings.hir_id,
        generic_fn,
    );
}

#[test]
fn single_trait_candidate_monomorphizes_and_lowers_once() {
    let mut s = Session::new();
    let fixture = trait_fixture(&mut s, false);
    register_generic_impl(&mut s, &fixture);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());

    let first = generator
        .resolve_method_address(
            &fixture.expected_fn,
            fixture.trait_item_hir,
            &fixture.foo_ty,
            &Symbol::from("speak"),
            Span::dummy(),
        )
        .unwrap();
    assert!(matches!(first.kind, TreeExprKind::FnAddr(_)));
    assert_eq!(generator.functions.len(), 1);
    assert_eq!(generator.functions[0].name, "speak::<Foo>");

    // single-definition semantics: a second resolution of the same
    // monomorphized signature reuses the cached address
    let second = generator
        .resolve_method_address(
            &fixture.expected_fn,
            fixture.trait_item_hir,
            &fixture.foo_ty,
            &Symbol::from("speak"),
            Span::dummy(),
        )
        .unwrap();
    assert_eq!(first.kind, second.kind);
    assert_eq!(generator.functions.len(), 1);
}

#[test]
fn zero_candidates_fall_back_to_the_trait_default_body() {
    let mut s = Session::new();
    let fixture = trait_fixture(&mut s, true);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let address = generator
        .resolve_method_address(
            &fixture.expected_fn,
            fixture.trait_item_hir,
            &fixture.foo_ty,
            &Symbol::from("speak"),
            Span::dummy(),
        )
        .unwrap();

    assert!(matches!(address.kind, TreeExprKind::FnAddr(_)));
    assert_eq!(generator.functions.len(), 1);
    assert_eq!(generator.functions[0].name, "speak");
}

#[test]
fn zero_candidates_without_default_body_is_fatal() {
    let mut s = Session::new();
    let fixture = trait_fixture(&mut s, false);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let err = generator
        .resolve_method_address(
            &fixture.expected_fn,
            fixture.trait_item_hir,
            &fixture.foo_ty,
            &Symbol::from("speak"),
            Span::dummy(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Internal(..)));
}

#[test]
fn multiple_trait_candidates_are_fatal() {
    let mut s = Session::new();
    let fixture = trait_fixture(&mut s, false);
    register_generic_impl(&mut s, &fixture);
    register_generic_impl(&mut s, &fixture);

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let err = generator
        .resolve_method_address(
            &fixture.expected_fn,
            fixture.trait_item_hir,
            &fixture.foo_ty,
            &Symbol::from("speak"),
            Span::dummy(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Internal(..)));
}

#[test]
fn overloaded_addition_becomes_a_method_call() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();
    let lhs = s.int_lit("1", i32_ty.clone());
    let rhs = s.int_lit("2", i32_ty.clone());
    let add = s.typed_expr(
        ExprKind::ArithmeticOrLogical {
            op: BinOp::Add,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        i32_ty.clone(),
    );

    let impl_mappings = s.alloc();
    s.mappings.insert_hir_implitem(hir::ImplItem {
        mappings: impl_mappings,
        kind: hir::ImplItemKind::Function(hir::Function {
            mappings: impl_mappings,
            ident: Symbol::from("add"),
            params: Vec::new(),
            body: None,
            span: Span::dummy(),
        }),
    });
    let add_fn = FnTy {
        def_id: 20,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("add"),
        params: vec![
            (Symbol::from("self"), i32_ty.clone()),
            (Symbol::from("rhs"), i32_ty.clone()),
        ],
        output: Box::new(i32_ty.clone()),
        substs: Vec::new(),
        is_varargs: false,
    };
    s.tcx.insert_operator_overload(add.hir_id(), add_fn);
    let resolved = s.alloc();
    s.resolver
        .insert_resolved_name(add.mappings.node_id, resolved.node_id);
    s.mappings
        .insert_node_to_hir(0, resolved.node_id, impl_mappings.hir_id);
    s.tcx.insert_receiver(add.hir_id(), i32_ty);
    s.tcx.insert_autoderef_mappings(add.hir_id(), Vec::new());

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&add).unwrap();

    let TreeExprKind::Call { callee, args } = &result.kind else {
        panic!("expected rewritten method call, got {:?}", result.kind);
    };
    assert!(matches!(callee.kind, TreeExprKind::FnAddr(_)));
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].kind, TreeExprKind::IntConst(1));
    assert_eq!(args[1].kind, TreeExprKind::IntConst(2));
    assert_eq!(generator.functions[0].name, "add");
}

#[test]
fn copied_array_unrolls_in_const_context_and_loops_at_runtime() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();
    let usize_ty = s.uint_ty(UintTy::Usize);
    let array_ty = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Array {
            elem: Box::new(i32_ty.clone()),
            capacity: 3,
        },
    );

    let elem = s.int_lit("7", i32_ty.clone());
    let count = s.int_lit("3", usize_ty.clone());
    let const_array = s.typed_expr(
        ExprKind::Array(ArrayElems::Copied {
            elem: Box::new(elem),
            count: Box::new(count),
        }),
        array_ty.clone(),
    );

    let elem = s.int_lit("7", i32_ty);
    let count = s.int_lit("3", usize_ty);
    let runtime_array = s.typed_expr(
        ExprKind::Array(ArrayElems::Copied {
            elem: Box::new(elem),
            count: Box::new(count),
        }),
        array_ty,
    );

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());

    generator.enter_const_context();
    let unrolled = generator.lower_expr(&const_array).unwrap();
    generator.exit_const_context();
    let TreeExprKind::ArrayCtor { indexes, values } = &unrolled.kind else {
        panic!("expected unrolled array, got {:?}", unrolled.kind);
    };
    assert_eq!(indexes, &[0, 1, 2]);
    assert!(values
        .iter()
        .all(|value| value.kind == TreeExprKind::IntConst(7)));

    let looped = generator.lower_expr(&runtime_array).unwrap();
    let TreeExprKind::Compound { block, value } = &looped.kind else {
        panic!("expected compound initializer, got {:?}", looped.kind);
    };
    assert!(matches!(value.kind, TreeExprKind::Var(_)));
    assert!(block
        .stmts
        .iter()
        .any(|stmt| matches!(stmt, TreeStmt::ArrayInit { .. })));
}

#[test]
fn range_expressions_construct_their_adt() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();
    let range_adt = AdtDef {
        did: 70,
        ident: Symbol::from("Range"),
        flags: AdtFlags::IS_STRUCT,
        variants: vec![VariantDef {
            id: 71,
            ident: Symbol::from("Range"),
            fields: vec![
                FieldDef {
                    ident: Symbol::from("from"),
                    ty: i32_ty.clone(),
                },
                FieldDef {
                    ident: Symbol::from("to"),
                    ty: i32_ty.clone(),
                },
            ],
            discr: VariantDiscr::Relative(0),
        }],
        substs: Vec::new(),
    };
    let range_ty = Ty::new(s.alloc_ty_ref(), TyKind::Adt(range_adt));

    let from = s.int_lit("1", i32_ty.clone());
    let to = s.int_lit("5", i32_ty);
    let range = s.typed_expr(
        ExprKind::RangeFromTo {
            from: Box::new(from),
            to: Box::new(to),
        },
        range_ty,
    );

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&range).unwrap();

    let TreeExprKind::Constructor {
        is_union, fields, ..
    } = &result.kind
    else {
        panic!("expected range constructor, got {:?}", result.kind);
    };
    assert!(!is_union);
    // fixed field order: from, then to
    assert_eq!(fields[0].kind, TreeExprKind::IntConst(1));
    assert_eq!(fields[1].kind, TreeExprKind::IntConst(5));
}

#[test]
fn let_bound_blocks_lower_to_compound_expressions() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();

    let init = s.int_lit("1", i32_ty.clone());
    let binding = s.typed_pat(PatKind::Binding(Symbol::from("x")), i32_ty.clone());

    let use_x = s.expr(ExprKind::Identifier(Symbol::from("x")));
    s.resolver
        .insert_resolved_name(use_x.mappings.node_id, binding.mappings.node_id);
    s.resolver.insert_definition(
        binding.mappings.node_id,
        Definition {
            parent: binding.mappings.node_id,
        },
    );
    s.mappings
        .insert_node_to_hir(0, binding.mappings.node_id, binding.mappings.hir_id);

    let let_stmt = hir::Stmt {
        mappings: s.alloc(),
        kind: hir::StmtKind::Let {
            pat: binding,
            init: Some(init),
        },
    };
    let block_mappings = s.alloc();
    let block = s.expr(ExprKind::Block(hir::Block {
        mappings: block_mappings,
        stmts: vec![let_stmt],
        tail: Some(Box::new(use_x)),
        span: Span::dummy(),
    }));

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let result = generator.lower_expr(&block).unwrap();

    let TreeExprKind::Compound { block, value } = &result.kind else {
        panic!("expected compound block, got {:?}", result.kind);
    };
    assert!(matches!(value.kind, TreeExprKind::Var(_)));
    let TreeStmt::VarDecl { init, .. } = &block.stmts[0] else {
        panic!("expected variable declaration, got {:?}", block.stmts[0]);
    };
    assert_eq!(init.as_ref().unwrap().kind, TreeExprKind::IntConst(1));
}

#[test]
fn function_items_lower_once_inside_their_own_scope() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();
    let body = s.int_lit("1", i32_ty.clone());
    let function = hir::Function {
        mappings: s.alloc(),
        ident: Symbol::from("f"),
        params: Vec::new(),
        body: Some(Box::new(body)),
        span: Span::dummy(),
    };
    let fn_ty = FnTy {
        def_id: 80,
        ty_ref: s.alloc_ty_ref(),
        ident: Symbol::from("f"),
        params: Vec::new(),
        output: Box::new(i32_ty),
        substs: Vec::new(),
        is_varargs: false,
    };

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    let fn_id = generator.lower_function_item(&function, &fn_ty).unwrap();

    // the function scope is popped once the body is lowered
    assert!(generator.peek_fn().is_none());

    let declaration = &generator.functions[0];
    assert_eq!(declaration.name, "f");
    let body = declaration.body.as_ref().expect("body lowered");
    assert!(matches!(
        body.stmts.last(),
        Some(TreeStmt::Expr(value)) if value.kind == TreeExprKind::IntConst(1)
    ));

    // lowering the same signature again reuses the declaration
    let again = generator.lower_function_item(&function, &fn_ty).unwrap();
    assert_eq!(fn_id, again);
    assert_eq!(generator.functions.len(), 1);
}

#[test]
fn unsupported_match_forms_defer_instead_of_aborting() {
    let mut s = Session::new();
    let i32_ty = s.i32_ty();

    // a guard on a plain integer match
    let scrutinee = s.int_lit("1", i32_ty.clone());
    let pattern = s.typed_pat(PatKind::Literal(Lit::Integer("1".into())), i32_ty.clone());
    let bool_ty = Ty::new(s.alloc_ty_ref(), TyKind::Bool);
    let guard = s.typed_expr(ExprKind::Literal(Lit::Bool(true)), bool_ty);
    let body = s.int_lit("10", i32_ty.clone());
    let mut case = s.case(vec![pattern], body);
    case.arm.guard = Some(Box::new(guard));

    let guarded = s.typed_expr(
        ExprKind::Match(MatchExpr {
            scrutinee: Box::new(scrutinee),
            cases: vec![case],
        }),
        i32_ty.clone(),
    );

    // a ranged tuple pattern inside a tuple match
    let one = s.int_lit("1", i32_ty.clone());
    let two = s.int_lit("2", i32_ty.clone());
    let tuple_ty = Ty::new(
        s.alloc_ty_ref(),
        TyKind::Tuple(vec![i32_ty.clone(), i32_ty.clone()]),
    );
    let tuple_scrutinee = s.typed_expr(ExprKind::Tuple(vec![one, two]), tuple_ty);
    let ranged = s.pat(PatKind::Tuple(TuplePatItems::Ranged {
        front: Vec::new(),
        back: Vec::new(),
    }));
    let wild = s.pat(PatKind::Wild);
    let ranged_body = s.int_lit("10", i32_ty.clone());
    let wild_body = s.int_lit("20", i32_ty.clone());
    let ranged_case = s.case(vec![ranged], ranged_body);
    let wild_case = s.case(vec![wild], wild_body);
    let tuple_match = s.typed_expr(
        ExprKind::Match(MatchExpr {
            scrutinee: Box::new(tuple_scrutinee),
            cases: vec![ranged_case, wild_case],
        }),
        i32_ty,
    );

    let mut generator =
        TreeGenerator::new(&s.tcx, &s.resolver, &s.mappings, s.diagnostics.clone());
    generator.lower_expr(&guarded).unwrap();
    generator.lower_expr(&tuple_match).unwrap();

    let deferred: Vec<_> = s
        .diagnostics
        .get_diagnostics()
        .into_iter()
        .filter(|diag| diag.code.as_deref() == Some(NOT_YET_SUPPORTED))
        .collect();
    assert_eq!(deferred.len(), 2);
    assert!(deferred[0].message.contains("guards"));
    assert!(deferred[1].message.contains("ranged tuple patterns"));
}

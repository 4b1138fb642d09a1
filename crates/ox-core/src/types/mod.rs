//! The type entities attached to HIR nodes by type inference.
//!
//! The lowering engine only reads these; they are produced and registered by
//! the (out of scope) type-checking stage. "Resolved" means every generic
//! substitution is concrete.

pub mod adjust;

use crate::hir::{self, DefId, HirId, Symbol};
use std::collections::HashMap;
use std::fmt;

/// Stable identity of a type entity. Shares the HIR id space; the declaration
/// mapping table can be queried with it (`lookup_location`).
pub type TyRef = HirId;

#[derive(Debug, Clone, PartialEq)]
pub struct Ty {
    pub ty_ref: TyRef,
    pub kind: TyKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TyKind {
    /// The primitive boolean type. Written as `bool`.
    Bool,

    /// The primitive character type; holds a Unicode scalar value.
    Char,

    /// The unsized string slice type `str`.
    Str,

    /// A primitive signed integer type. For example, `i32`.
    Int(IntTy),

    /// A primitive unsigned integer type. For example, `u32`.
    Uint(UintTy),

    /// A primitive floating-point type. For example, `f64`.
    Float(FloatTy),

    /// Algebraic data types: structures, enumerations and unions.
    Adt(AdtDef),

    /// A tuple type. The unit type is the empty tuple.
    Tuple(Vec<Ty>),

    /// An array with a constant capacity. `[T; n]`.
    Array { elem: Box<Ty>, capacity: u64 },

    /// The pointee of an array slice. Written as `[T]`.
    Slice(Box<Ty>),

    /// A reference to another type.
    Ref { base: Box<Ty>, mutbl: Mutability },

    /// The anonymous type of a function declaration/definition.
    FnDef(FnTy),

    /// A pointer to a function.
    FnPtr { params: Vec<Ty>, output: Box<Ty> },

    /// A trait object; dispatched through a positional vtable.
    Dynamic(DynamicObject),

    /// A generic type parameter, possibly resolved to a concrete type.
    Param(ParamTy),

    /// The never type `!`.
    Never,

    /// A placeholder for a type which could not be computed; propagated to
    /// avoid useless error messages.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Not,
    Mut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntTy {
    Isize,
    I8,
    I16,
    I32,
    I64,
    I128,
}

impl IntTy {
    pub fn name(self) -> &'static str {
        match self {
            IntTy::Isize => "isize",
            IntTy::I8 => "i8",
            IntTy::I16 => "i16",
            IntTy::I32 => "i32",
            IntTy::I64 => "i64",
            IntTy::I128 => "i128",
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            IntTy::I8 => 8,
            IntTy::I16 => 16,
            IntTy::I32 => 32,
            IntTy::Isize | IntTy::I64 => 64,
            IntTy::I128 => 128,
        }
    }

    pub fn min_value(self) -> i128 {
        match self {
            IntTy::I8 => i8::MIN as i128,
            IntTy::I16 => i16::MIN as i128,
            IntTy::I32 => i32::MIN as i128,
            IntTy::Isize | IntTy::I64 => i64::MIN as i128,
            IntTy::I128 => i128::MIN,
        }
    }

    pub fn max_value(self) -> i128 {
        match self {
            IntTy::I8 => i8::MAX as i128,
            IntTy::I16 => i16::MAX as i128,
            IntTy::I32 => i32::MAX as i128,
            IntTy::Isize | IntTy::I64 => i64::MAX as i128,
            IntTy::I128 => i128::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintTy {
    Usize,
    U8,
    U16,
    U32,
    U64,
    U128,
}

impl UintTy {
    pub fn name(self) -> &'static str {
        match self {
            UintTy::Usize => "usize",
            UintTy::U8 => "u8",
            UintTy::U16 => "u16",
            UintTy::U32 => "u32",
            UintTy::U64 => "u64",
            UintTy::U128 => "u128",
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            UintTy::U8 => 8,
            UintTy::U16 => 16,
            UintTy::U32 => 32,
            UintTy::Usize | UintTy::U64 => 64,
            UintTy::U128 => 128,
        }
    }

    pub fn max_value(self) -> u128 {
        match self {
            UintTy::U8 => u8::MAX as u128,
            UintTy::U16 => u16::MAX as u128,
            UintTy::U32 => u32::MAX as u128,
            UintTy::Usize | UintTy::U64 => u64::MAX as u128,
            UintTy::U128 => u128::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatTy {
    F32,
    F64,
}

impl FloatTy {
    pub fn name(self) -> &'static str {
        match self {
            FloatTy::F32 => "f32",
            FloatTy::F64 => "f64",
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            FloatTy::F32 => 32,
            FloatTy::F64 => 64,
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AdtFlags: u32 {
        const NO_ADT_FLAGS = 0;
        const IS_ENUM      = 1 << 0;
        const IS_UNION     = 1 << 1;
        const IS_STRUCT    = 1 << 2;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdtDef {
    pub did: DefId,
    pub ident: Symbol,
    pub flags: AdtFlags,
    pub variants: Vec<VariantDef>,
    /// Concrete generic arguments; empty for non-generic ADTs.
    pub substs: Vec<Ty>,
}

impl AdtDef {
    pub fn is_enum(&self) -> bool {
        self.flags.contains(AdtFlags::IS_ENUM)
    }

    pub fn is_union(&self) -> bool {
        self.flags.contains(AdtFlags::IS_UNION)
    }

    pub fn is_struct(&self) -> bool {
        self.flags.contains(AdtFlags::IS_STRUCT)
    }

    pub fn number_of_variants(&self) -> usize {
        self.variants.len()
    }

    /// Find a variant by the HIR id of its definition, together with its
    /// positional index (the union discriminator in the target IR).
    pub fn lookup_variant_by_id(&self, id: HirId) -> Option<(usize, &VariantDef)> {
        self.variants
            .iter()
            .enumerate()
            .find(|(_, variant)| variant.id == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub id: HirId,
    pub ident: Symbol,
    pub fields: Vec<FieldDef>,
    pub discr: VariantDiscr,
}

impl VariantDef {
    pub fn field_at_index(&self, index: usize) -> Option<&FieldDef> {
        self.fields.get(index)
    }
}

/// How an enum variant's tag value is specified.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantDiscr {
    /// An explicit discriminant expression, to be lowered and constant
    /// folded at the construction site.
    Explicit(Box<hir::Expr>),
    /// The variant's position relative to the last explicit discriminant.
    Relative(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub ident: Symbol,
    pub ty: Ty,
}

/// A trait object type. The item order is fixed when the type is formed;
/// an item's index is its vtable slot offset and must stay consistent with
/// whatever builds the actual table.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicObject {
    pub ident: Symbol,
    pub items: Vec<DynItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynItem {
    /// HIR id of the trait item this slot dispatches to.
    pub trait_item: HirId,
    pub fn_ty: FnTy,
}

impl DynamicObject {
    /// Fixed vtable slot of the given function: 0-indexed position of the
    /// first matching trait item.
    pub fn slot_of(&self, def_id: DefId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.fn_ty.def_id == def_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamTy {
    pub name: Symbol,
    pub resolved: Option<Box<Ty>>,
}

impl ParamTy {
    pub fn resolve(&self) -> Option<&Ty> {
        self.resolved.as_deref()
    }
}

/// A generic substitution slot on a function type.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstParam {
    pub param: ParamTy,
    pub arg: Option<Ty>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnTy {
    pub def_id: DefId,
    pub ty_ref: TyRef,
    pub ident: Symbol,
    pub params: Vec<(Symbol, Ty)>,
    pub output: Box<Ty>,
    pub substs: Vec<SubstParam>,
    pub is_varargs: bool,
}

impl FnTy {
    pub fn num_params(&self) -> usize {
        self.params.len()
    }

    pub fn param_at(&self, index: usize) -> Option<&(Symbol, Ty)> {
        self.params.get(index)
    }

    pub fn has_substitutions_defined(&self) -> bool {
        !self.substs.is_empty()
    }

    pub fn needs_substitution(&self) -> bool {
        self.substs.iter().any(|subst| subst.arg.is_none())
    }

    /// Fill substitution slots that the parameter itself already resolves.
    /// Slots left open are concretised by `unify` against the expected
    /// call-site function type.
    pub fn infer_substitutions(&self) -> FnTy {
        let mut inferred = self.clone();
        for subst in &mut inferred.substs {
            if subst.arg.is_none() {
                subst.arg = subst.param.resolve().cloned();
            }
        }
        inferred
    }

    /// Monomorphize against the expected (concrete) call-site signature,
    /// producing a substitution-free function type that carries the
    /// expected type's identity.
    pub fn unify(&self, expected: &FnTy) -> FnTy {
        let mut bindings: HashMap<Symbol, Ty> = HashMap::new();
        for subst in &self.substs {
            if let Some(arg) = &subst.arg {
                bindings.insert(subst.param.name.clone(), arg.clone());
            }
        }

        let params = self
            .params
            .iter()
            .zip(expected.params.iter())
            .map(|((name, candidate), (_, concrete))| {
                (name.clone(), unify_ty(candidate, concrete, &mut bindings))
            })
            .collect();
        let output = Box::new(unify_ty(&self.output, &expected.output, &mut bindings));

        let substs = self
            .substs
            .iter()
            .map(|subst| SubstParam {
                param: subst.param.clone(),
                arg: subst
                    .arg
                    .clone()
                    .or_else(|| bindings.get(&subst.param.name).cloned()),
            })
            .collect();

        FnTy {
            def_id: self.def_id,
            ty_ref: expected.ty_ref,
            ident: self.ident.clone(),
            params,
            output,
            substs,
            is_varargs: self.is_varargs,
        }
    }

    /// Symbol name of the (possibly monomorphized) instantiation. Distinct
    /// concrete substitutions produce distinct names; the compiled-function
    /// cache relies on this for single-definition semantics.
    pub fn mangled_name(&self) -> String {
        if self.substs.is_empty() {
            return self.ident.to_string();
        }
        let args = self
            .substs
            .iter()
            .map(|subst| match &subst.arg {
                Some(ty) => ty.to_string(),
                None => subst.param.name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}::<{}>", self.ident, args)
    }
}

fn unify_ty(candidate: &Ty, expected: &Ty, bindings: &mut HashMap<Symbol, Ty>) -> Ty {
    match (&candidate.kind, &expected.kind) {
        (TyKind::Param(param), _) => {
            if let Some(resolved) = param.resolve() {
                return resolved.clone();
            }
            if let Some(bound) = bindings.get(&param.name) {
                return bound.clone();
            }
            bindings.insert(param.name.clone(), expected.clone());
            expected.clone()
        }
        (TyKind::Ref { base, mutbl }, TyKind::Ref { base: expected_base, .. }) => Ty {
            ty_ref: expected.ty_ref,
            kind: TyKind::Ref {
                base: Box::new(unify_ty(base, expected_base, bindings)),
                mutbl: *mutbl,
            },
        },
        (TyKind::Slice(elem), TyKind::Slice(expected_elem)) => Ty {
            ty_ref: expected.ty_ref,
            kind: TyKind::Slice(Box::new(unify_ty(elem, expected_elem, bindings))),
        },
        (TyKind::Array { elem, capacity }, TyKind::Array { elem: expected_elem, .. }) => Ty {
            ty_ref: expected.ty_ref,
            kind: TyKind::Array {
                elem: Box::new(unify_ty(elem, expected_elem, bindings)),
                capacity: *capacity,
            },
        },
        (TyKind::Tuple(elems), TyKind::Tuple(expected_elems))
            if elems.len() == expected_elems.len() =>
        {
            Ty {
                ty_ref: expected.ty_ref,
                kind: TyKind::Tuple(
                    elems
                        .iter()
                        .zip(expected_elems.iter())
                        .map(|(c, e)| unify_ty(c, e, bindings))
                        .collect(),
                ),
            }
        }
        _ => candidate.clone(),
    }
}

impl Ty {
    pub fn new(ty_ref: TyRef, kind: TyKind) -> Self {
        Self { ty_ref, kind }
    }

    pub fn error(ty_ref: TyRef) -> Self {
        Self {
            ty_ref,
            kind: TyKind::Error,
        }
    }

    /// Peel references down to the underlying type.
    pub fn root(&self) -> &Ty {
        match &self.kind {
            TyKind::Ref { base, .. } => base.root(),
            _ => self,
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(&self.kind, TyKind::Tuple(elems) if elems.is_empty())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TyKind::Bool
                | TyKind::Char
                | TyKind::Str
                | TyKind::Int(_)
                | TyKind::Uint(_)
                | TyKind::Float(_)
                | TyKind::Never
        )
    }

    pub fn is_integral(&self) -> bool {
        matches!(self.kind, TyKind::Int(_) | TyKind::Uint(_))
    }

    pub fn is_signed(&self) -> bool {
        matches!(self.kind, TyKind::Int(_))
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self.kind, TyKind::Float(_))
    }

    pub fn is_fn(&self) -> bool {
        matches!(self.kind, TyKind::FnDef(_) | TyKind::FnPtr { .. })
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TyKind::Bool => write!(f, "bool"),
            TyKind::Char => write!(f, "char"),
            TyKind::Str => write!(f, "str"),
            TyKind::Int(int_ty) => write!(f, "{}", int_ty.name()),
            TyKind::Uint(uint_ty) => write!(f, "{}", uint_ty.name()),
            TyKind::Float(float_ty) => write!(f, "{}", float_ty.name()),
            TyKind::Adt(adt) => write!(f, "{}", adt.ident),
            TyKind::Tuple(elems) => {
                write!(f, "(")?;
                for (i, ty) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", ty)?;
                }
                write!(f, ")")
            }
            TyKind::Array { elem, capacity } => write!(f, "[{}; {}]", elem, capacity),
            TyKind::Slice(elem) => write!(f, "[{}]", elem),
            TyKind::Ref { base, mutbl } => match mutbl {
                Mutability::Mut => write!(f, "&mut {}", base),
                Mutability::Not => write!(f, "&{}", base),
            },
            TyKind::FnDef(fn_ty) => write!(f, "fn {}", fn_ty.ident),
            TyKind::FnPtr { .. } => write!(f, "fn()"),
            TyKind::Dynamic(dynamic) => write!(f, "dyn {}", dynamic.ident),
            TyKind::Param(param) => write!(f, "{}", param.name),
            TyKind::Never => write!(f, "!"),
            TyKind::Error => write!(f, "{{type error}}"),
        }
    }
}

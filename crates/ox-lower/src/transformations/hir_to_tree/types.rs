//! Compilation of `TyTy` entities into backend tree types.

use super::TreeGenerator;
use ox_core::tree::TreeTy;
use ox_core::types::{AdtDef, FnTy, Ty, TyKind, VariantDef};

/// Tree type of every enum discriminant field.
pub(super) fn discriminant_tree_ty() -> TreeTy {
    TreeTy::Int {
        bits: 64,
        signed: true,
    }
}

impl<'a> TreeGenerator<'a> {
    pub(super) fn compile_ty(&self, ty: &Ty) -> TreeTy {
        match &ty.kind {
            TyKind::Bool => TreeTy::Bool,
            TyKind::Char => TreeTy::Char,
            // `str` is only ever seen behind a reference; both sides lower
            // to the same {data pointer, length} record.
            TyKind::Str => TreeTy::FatPointer(Box::new(TreeTy::Byte)),
            TyKind::Int(int_ty) => TreeTy::Int {
                bits: int_ty.bits(),
                signed: true,
            },
            TyKind::Uint(uint_ty) => TreeTy::Int {
                bits: uint_ty.bits(),
                signed: false,
            },
            TyKind::Float(float_ty) => TreeTy::Float {
                bits: float_ty.bits(),
            },
            TyKind::Never => TreeTy::Void,
            TyKind::Tuple(elems) => {
                if elems.is_empty() {
                    TreeTy::Void
                } else {
                    TreeTy::Record {
                        fields: elems.iter().map(|elem| self.compile_ty(elem)).collect(),
                    }
                }
            }
            TyKind::Array { elem, capacity } => TreeTy::Array {
                elem: Box::new(self.compile_ty(elem)),
                len: *capacity,
            },
            TyKind::Slice(elem) => TreeTy::FatPointer(Box::new(self.compile_ty(elem))),
            TyKind::Ref { base, .. } => {
                let compiled = self.compile_ty(base);
                // references to dynamically-sized views are already fat
                // pointers; no extra indirection layer
                if compiled.is_slice() {
                    compiled
                } else {
                    TreeTy::Pointer(Box::new(compiled))
                }
            }
            TyKind::Adt(adt) => self.compile_adt(adt),
            TyKind::FnDef(fn_ty) => self.fn_ptr_tree_ty(fn_ty),
            TyKind::FnPtr { params, output } => TreeTy::FnPtr {
                params: params.iter().map(|param| self.compile_ty(param)).collect(),
                ret: Box::new(self.compile_ty(output)),
            },
            // {data pointer, vtable pointer}
            TyKind::Dynamic(_) => TreeTy::Record {
                fields: vec![
                    TreeTy::Pointer(Box::new(TreeTy::Void)),
                    TreeTy::Pointer(Box::new(TreeTy::FnPtr {
                        params: Vec::new(),
                        ret: Box::new(TreeTy::Void),
                    })),
                ],
            },
            TyKind::Param(param) => match param.resolve() {
                Some(resolved) => self.compile_ty(resolved),
                None => TreeTy::Error,
            },
            TyKind::Error => TreeTy::Error,
        }
    }

    fn compile_adt(&self, adt: &AdtDef) -> TreeTy {
        if adt.is_enum() {
            // a tagged union: every variant record leads with the
            // discriminant as a common field
            TreeTy::Union {
                variants: adt
                    .variants
                    .iter()
                    .map(|variant| {
                        let mut fields = vec![discriminant_tree_ty()];
                        fields.extend(self.variant_field_tys(variant));
                        TreeTy::Record { fields }
                    })
                    .collect(),
            }
        } else if adt.is_union() {
            TreeTy::Union {
                variants: adt
                    .variants
                    .iter()
                    .map(|variant| TreeTy::Record {
                        fields: self.variant_field_tys(variant),
                    })
                    .collect(),
            }
        } else {
            let variant = adt.variants.first();
            TreeTy::Record {
                fields: variant.map(|v| self.variant_field_tys(v)).unwrap_or_default(),
            }
        }
    }

    fn variant_field_tys(&self, variant: &VariantDef) -> Vec<TreeTy> {
        variant
            .fields
            .iter()
            .map(|field| self.compile_ty(&field.ty))
            .collect()
    }

    pub(super) fn fn_ptr_tree_ty(&self, fn_ty: &FnTy) -> TreeTy {
        TreeTy::FnPtr {
            params: fn_ty
                .params
                .iter()
                .map(|(_, param)| self.compile_ty(param))
                .collect(),
            ret: Box::new(self.compile_ty(&fn_ty.output)),
        }
    }
}

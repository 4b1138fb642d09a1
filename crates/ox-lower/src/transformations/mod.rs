use ox_core::error::Result;

pub mod hir_to_tree;

/// A transformation from one IR to another.
pub trait IrTransform<Source, Target> {
    fn transform(&mut self, source: Source) -> Result<Target>;
}

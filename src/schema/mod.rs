// Clone image layout descriptions and variant resolution

pub mod registry;
pub mod variant;

pub use registry::{resolve, RegistryError, VARIANTS};
pub use variant::{Block, BlockKind, Variant, ICF2, ICF3};

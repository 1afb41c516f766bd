// Variant resolution: exact structural fingerprint match, no coercion

use thiserror::Error;
use tracing::debug;

use super::variant::{Variant, ICF2, ICF3};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Buffer ({len} bytes) matches no known clone image layout")]
    UnrecognizedFormat { len: usize },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// All known variants, most recent (and largest) first
pub static VARIANTS: [&Variant; 2] = [&ICF3, &ICF2];

/// Match a raw buffer against the known variants by exact length and
/// trailing footer bytes. A wrong-length buffer or a single corrupt footer
/// byte is rejected, never coerced.
pub fn resolve(buffer: &[u8]) -> Result<&'static Variant> {
    for variant in VARIANTS {
        if buffer.len() == variant.mem_size
            && &buffer[variant.footer_offset()..] == variant.footer
        {
            debug!(variant = variant.name, "resolved clone image layout");
            return Ok(variant);
        }
    }
    Err(RegistryError::UnrecognizedFormat { len: buffer.len() })
}

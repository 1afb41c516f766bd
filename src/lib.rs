// ICR6-RS: clone image codec for the Icom IC-R6 receiver
// Copyright 2024 - Licensed under GPLv3

pub mod bitwise;
pub mod codec;
pub mod consts;
pub mod formats;
pub mod image;
pub mod schema;

// Re-export commonly used types
pub use bitwise::{BitCursor, BitCursorMut, CursorError, Endianness};
pub use codec::{
    decode_freq, encode_freq, Bank, BankSlot, Channel, ChannelFlags, CodecError, Multiplier,
    ScanEdge, ScanLink, Settings,
};
pub use formats::{load_icf, save_icf, IcfError, IcfMetadata};
pub use image::{ImageError, MemoryImage};
pub use schema::{resolve, RegistryError, Variant};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}

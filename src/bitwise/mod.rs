// Bit-level access primitives for the clone image
// Every entity codec reads and writes through the cursors defined here

pub mod cursor;
pub mod types;

pub use cursor::{BitCursor, BitCursorMut, CursorError};
pub use types::Endianness;

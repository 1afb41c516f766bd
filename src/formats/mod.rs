// File container formats for clone images

pub mod icf;

pub use icf::{load_icf, save_icf, IcfError, IcfMetadata};

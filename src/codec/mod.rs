// Entity codecs: one record type per submodule, all reading and writing
// through the bitwise cursors over exact pre-validated spans

pub mod bank;
pub mod channel;
pub mod freq;
pub mod name;
pub mod scan;
pub mod settings;

use thiserror::Error;

use crate::bitwise::CursorError;
use freq::FreqError;
use name::NameError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Name(#[from] NameError),

    #[error(transparent)]
    Freq(#[from] FreqError),
}

pub type Result<T> = std::result::Result<T, CodecError>;

pub use bank::{Bank, ScanLink};
pub use channel::{
    BankSlot, Canceller, Channel, ChannelFlags, Duplex, Mode, Polarity, Skip, ToneMode,
};
pub use freq::{decode_freq, encode_freq, encode_freq_hinted, encode_freq_with, EncodedFreq, Multiplier};
pub use name::{decode_name, encode_name};
pub use scan::{ScanEdge, ScanEdgeMode};
pub use settings::{BandDefaults, Settings};

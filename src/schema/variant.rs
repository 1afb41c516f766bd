// Layout variant descriptions: every known clone image revision as an
// immutable table of block offsets and counts

use serde::{Deserialize, Serialize};

use crate::bitwise::Endianness;
use crate::consts::{
    NUM_AUTOWRITE_CHANNELS, NUM_BANDS, NUM_BANKS, NUM_CHANNELS, NUM_SCAN_EDGES, NUM_SCAN_LINKS,
};

/// Channel record width in bytes
pub const CHANNEL_LEN: usize = 16;
/// Channel control flag record width
pub const CHANNEL_FLAGS_LEN: usize = 2;
/// Scan edge record width
pub const SCAN_EDGE_LEN: usize = 16;
/// Scan edge flag record width
pub const SCAN_EDGE_FLAGS_LEN: usize = 4;
/// Bank / scan link name record width
pub const NAME_RECORD_LEN: usize = 8;
/// Comment field width
pub const COMMENT_LEN: usize = 16;
/// Footer width
pub const FOOTER_LEN: usize = 16;

/// What lives in a block; widths and counts follow from the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Channels,
    ChannelFlags,
    ScanEdges,
    ScanEdgeFlags,
    Settings,
    BankLinks,
    ScanLinkWords,
    Comment,
    BankNames,
    ScanLinkNames,
}

/// One writable span of the image: absolute offset, total length, contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub offset: usize,
    pub len: usize,
    pub kind: BlockKind,
}

/// An immutable description of one clone image revision.
///
/// Variants are never inferred field-by-field; a buffer either matches a
/// variant's exact length and trailing footer or it is rejected.
#[derive(Debug, PartialEq, Eq)]
pub struct Variant {
    pub name: &'static str,
    /// Trailing 16-byte ASCII marker
    pub footer: &'static [u8; FOOTER_LEN],
    /// Total image size in bytes
    pub mem_size: usize,
    /// Byte order of the bank bitmap words
    pub word_endianness: Endianness,

    pub channels_offset: usize,
    pub autowrite_offset: usize,
    pub scan_edges_offset: usize,
    pub channel_flags_offset: usize,
    /// Absent on revisions without per-edge visibility flags
    pub scan_edge_flags_offset: Option<usize>,
    pub autowrite_hidden_offset: usize,
    pub autowrite_positions_offset: usize,
    pub settings_offset: usize,
    pub bank_links_offset: usize,
    pub scan_link_words_offset: usize,
    pub comment_offset: usize,
    pub bank_names_offset: usize,
    pub scan_link_names_offset: usize,
    /// Absent on revisions without the factory band-defaults table
    pub bands_offset: Option<usize>,
}

impl Variant {
    pub fn footer_offset(&self) -> usize {
        self.mem_size - FOOTER_LEN
    }

    /// All writable spans in ascending offset order. Everything outside
    /// these spans (and the footer) is opaque and passes through encode
    /// verbatim.
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks = vec![
            Block {
                offset: self.channels_offset,
                len: NUM_CHANNELS * CHANNEL_LEN,
                kind: BlockKind::Channels,
            },
            Block {
                offset: self.scan_edges_offset,
                len: NUM_SCAN_EDGES * SCAN_EDGE_LEN,
                kind: BlockKind::ScanEdges,
            },
            Block {
                offset: self.channel_flags_offset,
                len: NUM_CHANNELS * CHANNEL_FLAGS_LEN,
                kind: BlockKind::ChannelFlags,
            },
            Block {
                offset: self.settings_offset,
                len: crate::codec::settings::SETTINGS_LEN,
                kind: BlockKind::Settings,
            },
            Block { offset: self.bank_links_offset, len: 4, kind: BlockKind::BankLinks },
            Block {
                offset: self.scan_link_words_offset,
                len: NUM_SCAN_LINKS * 4,
                kind: BlockKind::ScanLinkWords,
            },
            Block { offset: self.comment_offset, len: COMMENT_LEN, kind: BlockKind::Comment },
            Block {
                offset: self.bank_names_offset,
                len: NUM_BANKS * NAME_RECORD_LEN,
                kind: BlockKind::BankNames,
            },
            Block {
                offset: self.scan_link_names_offset,
                len: NUM_SCAN_LINKS * NAME_RECORD_LEN,
                kind: BlockKind::ScanLinkNames,
            },
        ];
        if let Some(offset) = self.scan_edge_flags_offset {
            blocks.push(Block {
                offset,
                len: NUM_SCAN_EDGES * SCAN_EDGE_FLAGS_LEN,
                kind: BlockKind::ScanEdgeFlags,
            });
        }
        blocks.sort_by_key(|b| b.offset);
        blocks
    }

    pub fn channel_offset(&self, idx: usize) -> usize {
        self.channels_offset + idx * CHANNEL_LEN
    }

    pub fn autowrite_channel_offset(&self, idx: usize) -> usize {
        self.autowrite_offset + idx * CHANNEL_LEN
    }

    pub fn band_offset(&self, idx: usize) -> Option<usize> {
        self.bands_offset.map(|base| base + idx * 16)
    }
}

/// Current revision: band defaults table, per-edge visibility flags,
/// big-endian bitmap words
pub static ICF3: Variant = Variant {
    name: "CloneFormat3",
    footer: b"IcomCloneFormat3",
    mem_size: 0x6E60,
    word_endianness: Endianness::Big,
    channels_offset: 0x0000,
    autowrite_offset: 0x5140,
    scan_edges_offset: 0x5DC0,
    channel_flags_offset: 0x5F80,
    scan_edge_flags_offset: Some(0x69A8),
    autowrite_hidden_offset: 0x6A10,
    autowrite_positions_offset: 0x6A30,
    settings_offset: 0x6BD0,
    bank_links_offset: 0x6C28,
    scan_link_words_offset: 0x6C2C,
    comment_offset: 0x6D00,
    bank_names_offset: 0x6D10,
    scan_link_names_offset: 0x6DC0,
    bands_offset: Some(0x6B00),
};

/// Earlier revision: shorter image, little-endian bitmap words, no band
/// defaults and no per-edge visibility flags
pub static ICF2: Variant = Variant {
    name: "CloneFormat2",
    footer: b"IcomCloneFormat2",
    mem_size: 0x6C40,
    word_endianness: Endianness::Little,
    channels_offset: 0x0000,
    autowrite_offset: 0x5140,
    scan_edges_offset: 0x5DC0,
    channel_flags_offset: 0x5F80,
    scan_edge_flags_offset: None,
    autowrite_hidden_offset: 0x69B0,
    autowrite_positions_offset: 0x69D0,
    settings_offset: 0x6AA0,
    bank_links_offset: 0x6AE8,
    scan_link_words_offset: 0x6AEC,
    comment_offset: 0x6B20,
    bank_names_offset: 0x6B30,
    scan_link_names_offset: 0x6BE0,
    bands_offset: None,
};

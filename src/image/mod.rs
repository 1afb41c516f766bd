// Whole-image codec: decodes a raw clone buffer into an owned model and
// reassembles it byte-exactly.
//
// Only the writable blocks the model covers are re-encoded; every other
// byte range (inter-block padding, the autowrite store and its maps, the
// band defaults table) is captured verbatim at decode time and replayed
// on encode.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::bitwise::{BitCursor, BitCursorMut, CursorError};
use crate::codec::{
    bank, Bank, BandDefaults, Channel, ChannelFlags, CodecError, ScanEdge, ScanLink, Settings,
};
use crate::consts::{
    NUM_AUTOWRITE_CHANNELS, NUM_BANDS, NUM_BANKS, NUM_CHANNELS, NUM_SCAN_EDGES, NUM_SCAN_LINKS,
};
use crate::schema::variant::{BlockKind, Variant, CHANNEL_LEN, COMMENT_LEN, SCAN_EDGE_LEN};
use crate::schema::{resolve, RegistryError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error(transparent)]
    UnrecognizedFormat(#[from] RegistryError),

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("{entity} index {idx} out of range (max {max})")]
    IndexOutOfRange { entity: &'static str, idx: usize, max: usize },

    #[error("Layout {variant} has no {block} block")]
    BlockNotPresent { variant: &'static str, block: &'static str },

    #[error("Comment {comment:?} is not 16 or fewer printable ASCII characters")]
    InvalidComment { comment: String },

    #[error("Re-encoded image failed self-validation: {reason}")]
    InternalInvariantViolation { reason: &'static str },
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// A fully decoded clone image.
///
/// Decode and encode are stateless transformations; the model owns all of
/// its data and two images never share backing storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryImage {
    #[serde(skip, default = "default_variant")]
    variant: &'static Variant,
    channels: Vec<Channel>,
    channel_flags: Vec<ChannelFlags>,
    scan_edges: Vec<ScanEdge>,
    banks: Vec<Bank>,
    scan_links: Vec<ScanLink>,
    settings: Settings,
    bank_links: u32,
    comment: String,
    /// Verbatim copies of every byte range no writable block owns,
    /// keyed by absolute offset
    opaque: BTreeMap<usize, Vec<u8>>,
}

fn default_variant() -> &'static Variant {
    &crate::schema::ICF3
}

/// Byte ranges between writable blocks (footer excluded); these pass
/// through encode untouched
fn opaque_segments(variant: &Variant) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut pos = 0;
    for block in variant.blocks() {
        if block.offset > pos {
            segments.push((pos, block.offset - pos));
        }
        pos = block.offset + block.len;
    }
    if variant.footer_offset() > pos {
        segments.push((pos, variant.footer_offset() - pos));
    }
    segments
}

impl MemoryImage {
    /// Decode a raw buffer, resolving its layout variant first
    pub fn decode(buffer: &[u8]) -> Result<Self> {
        let variant = resolve(buffer)?;
        Self::decode_with(buffer, variant)
    }

    /// Decode a buffer whose variant the caller already resolved
    pub fn decode_with(buffer: &[u8], variant: &'static Variant) -> Result<Self> {
        if buffer.len() != variant.mem_size {
            return Err(RegistryError::UnrecognizedFormat { len: buffer.len() }.into());
        }
        debug!(variant = variant.name, len = buffer.len(), "decoding clone image");

        let mut channels = Vec::with_capacity(NUM_CHANNELS);
        let mut channel_flags = Vec::with_capacity(NUM_CHANNELS);
        let mut scan_edges = Vec::with_capacity(NUM_SCAN_EDGES);
        let mut banks = Vec::with_capacity(NUM_BANKS);
        let mut scan_links = Vec::with_capacity(NUM_SCAN_LINKS);
        let mut settings = Settings::default();
        let mut bank_links = 0;
        let mut link_words = Vec::with_capacity(NUM_SCAN_LINKS);
        let mut comment = String::new();

        for block in variant.blocks() {
            let span = &buffer[block.offset..block.offset + block.len];
            let mut cur = BitCursor::new(span);
            match block.kind {
                BlockKind::Channels => {
                    for _ in 0..NUM_CHANNELS {
                        channels.push(Channel::decode_lossy(&mut cur)?);
                    }
                }
                BlockKind::ChannelFlags => {
                    for _ in 0..NUM_CHANNELS {
                        channel_flags.push(ChannelFlags::decode(&mut cur)?);
                    }
                }
                BlockKind::ScanEdges => {
                    for _ in 0..NUM_SCAN_EDGES {
                        scan_edges.push(ScanEdge::decode(&mut cur)?);
                    }
                }
                BlockKind::ScanEdgeFlags => {
                    for edge in scan_edges.iter_mut() {
                        edge.hidden = ScanEdge::decode_flags(&mut cur)?;
                    }
                }
                BlockKind::Settings => {
                    settings = Settings::decode(&mut cur)?;
                }
                BlockKind::BankLinks => {
                    bank_links = bank::decode_bank_word(&mut cur, variant.word_endianness)?;
                }
                // the word table precedes the name records; merged below
                BlockKind::ScanLinkWords => {
                    for _ in 0..NUM_SCAN_LINKS {
                        link_words
                            .push(bank::decode_bank_word(&mut cur, variant.word_endianness)?);
                    }
                }
                BlockKind::Comment => {
                    let raw = cur.read_bytes(COMMENT_LEN)?;
                    comment = if raw[0] == 0 {
                        String::new()
                    } else {
                        String::from_utf8_lossy(raw).trim_end().to_string()
                    };
                }
                BlockKind::BankNames => {
                    for _ in 0..NUM_BANKS {
                        banks.push(Bank::decode(&mut cur)?);
                    }
                }
                BlockKind::ScanLinkNames => {
                    for _ in 0..NUM_SCAN_LINKS {
                        scan_links.push(ScanLink::decode(&mut cur)?);
                    }
                }
            }
        }

        for (link, banks) in scan_links.iter_mut().zip(link_words) {
            link.banks = banks;
        }

        let opaque = opaque_segments(variant)
            .into_iter()
            .map(|(offset, len)| (offset, buffer[offset..offset + len].to_vec()))
            .collect();

        Ok(Self {
            variant,
            channels,
            channel_flags,
            scan_edges,
            banks,
            scan_links,
            settings,
            bank_links,
            comment,
            opaque,
        })
    }

    /// Reassemble the raw clone buffer
    pub fn encode(&self) -> Result<Vec<u8>> {
        let variant = self.variant;
        let mut buf = vec![0u8; variant.mem_size];

        for (&offset, bytes) in &self.opaque {
            buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        }

        for block in variant.blocks() {
            let span = &mut buf[block.offset..block.offset + block.len];
            let mut cur = BitCursorMut::new(span);
            match block.kind {
                BlockKind::Channels => {
                    for chan in &self.channels {
                        chan.encode(&mut cur)?;
                    }
                }
                BlockKind::ChannelFlags => {
                    for flags in &self.channel_flags {
                        flags.encode(&mut cur)?;
                    }
                }
                BlockKind::ScanEdges => {
                    for edge in &self.scan_edges {
                        edge.encode(&mut cur)?;
                    }
                }
                BlockKind::ScanEdgeFlags => {
                    for edge in &self.scan_edges {
                        edge.encode_flags(&mut cur)?;
                    }
                }
                BlockKind::Settings => {
                    self.settings.encode(&mut cur)?;
                }
                BlockKind::BankLinks => {
                    bank::encode_bank_word(self.bank_links, &mut cur, variant.word_endianness)?;
                }
                BlockKind::ScanLinkWords => {
                    for link in &self.scan_links {
                        bank::encode_bank_word(link.banks, &mut cur, variant.word_endianness)?;
                    }
                }
                BlockKind::Comment => {
                    if self.comment.is_empty() {
                        cur.write_bytes(&[0u8; COMMENT_LEN])?;
                    } else {
                        let mut field = [b' '; COMMENT_LEN];
                        for (dst, src) in field.iter_mut().zip(self.comment.bytes()) {
                            *dst = src;
                        }
                        cur.write_bytes(&field)?;
                    }
                }
                BlockKind::BankNames => {
                    for b in &self.banks {
                        b.encode(&mut cur)?;
                    }
                }
                BlockKind::ScanLinkNames => {
                    for link in &self.scan_links {
                        link.encode(&mut cur)?;
                    }
                }
            }
        }

        buf[variant.footer_offset()..].copy_from_slice(variant.footer);

        // a mis-assembled buffer must never leave this function
        match resolve(&buf) {
            Ok(resolved) if std::ptr::eq(resolved, variant) => Ok(buf),
            _ => Err(ImageError::InternalInvariantViolation {
                reason: "re-encoded buffer does not resolve to its own variant",
            }),
        }
    }

    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    fn check_index(entity: &'static str, idx: usize, max: usize) -> Result<()> {
        if idx >= max {
            return Err(ImageError::IndexOutOfRange { entity, idx, max: max - 1 });
        }
        Ok(())
    }

    /// Bytes of an opaque range, located by its containing segment
    fn opaque_bytes(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.opaque
            .range(..=offset)
            .next_back()
            .and_then(|(&start, bytes)| {
                let rel = offset - start;
                bytes.get(rel..rel + len)
            })
            .ok_or(ImageError::InternalInvariantViolation {
                reason: "opaque side-table does not cover a declared read-only range",
            })
    }

    pub fn channel(&self, idx: usize) -> Result<&Channel> {
        Self::check_index("channel", idx, NUM_CHANNELS)?;
        Ok(&self.channels[idx])
    }

    /// Replace a channel; the replacement is validated by encoding it once
    pub fn set_channel(&mut self, idx: usize, channel: Channel) -> Result<()> {
        Self::check_index("channel", idx, NUM_CHANNELS)?;
        let mut scratch = [0u8; CHANNEL_LEN];
        channel.encode(&mut BitCursorMut::new(&mut scratch))?;
        self.channels[idx] = channel;
        Ok(())
    }

    pub fn channel_flags(&self, idx: usize) -> Result<&ChannelFlags> {
        Self::check_index("channel", idx, NUM_CHANNELS)?;
        Ok(&self.channel_flags[idx])
    }

    pub fn set_channel_flags(&mut self, idx: usize, flags: ChannelFlags) -> Result<()> {
        Self::check_index("channel", idx, NUM_CHANNELS)?;
        self.channel_flags[idx] = flags;
        Ok(())
    }

    /// Decode one autowrite channel from the read-only store
    pub fn autowrite_channel(&self, idx: usize) -> Result<Channel> {
        Self::check_index("autowrite channel", idx, NUM_AUTOWRITE_CHANNELS)?;
        let span =
            self.opaque_bytes(self.variant.autowrite_channel_offset(idx), CHANNEL_LEN)?;
        Ok(Channel::decode_lossy(&mut BitCursor::new(span))?)
    }

    pub fn scan_edge(&self, idx: usize) -> Result<&ScanEdge> {
        Self::check_index("scan edge", idx, NUM_SCAN_EDGES)?;
        Ok(&self.scan_edges[idx])
    }

    pub fn set_scan_edge(&mut self, idx: usize, edge: ScanEdge) -> Result<()> {
        Self::check_index("scan edge", idx, NUM_SCAN_EDGES)?;
        let mut scratch = [0u8; SCAN_EDGE_LEN];
        edge.encode(&mut BitCursorMut::new(&mut scratch))?;
        self.scan_edges[idx] = edge;
        Ok(())
    }

    pub fn bank(&self, idx: usize) -> Result<&Bank> {
        Self::check_index("bank", idx, NUM_BANKS)?;
        Ok(&self.banks[idx])
    }

    pub fn set_bank(&mut self, idx: usize, bank: Bank) -> Result<()> {
        Self::check_index("bank", idx, NUM_BANKS)?;
        self.banks[idx] = bank;
        Ok(())
    }

    pub fn scan_link(&self, idx: usize) -> Result<&ScanLink> {
        Self::check_index("scan link", idx, NUM_SCAN_LINKS)?;
        Ok(&self.scan_links[idx])
    }

    pub fn set_scan_link(&mut self, idx: usize, link: ScanLink) -> Result<()> {
        Self::check_index("scan link", idx, NUM_SCAN_LINKS)?;
        self.scan_links[idx] = link;
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Device bank-link mask (bit per bank)
    pub fn bank_links(&self) -> u32 {
        self.bank_links
    }

    pub fn set_bank_links(&mut self, banks: u32) {
        self.bank_links = banks & bank::BANK_WORD_MASK;
    }

    /// Factory band defaults (layouts that carry the table only)
    pub fn band(&self, idx: usize) -> Result<BandDefaults> {
        Self::check_index("band", idx, NUM_BANDS)?;
        let offset = self.variant.band_offset(idx).ok_or(ImageError::BlockNotPresent {
            variant: self.variant.name,
            block: "band defaults",
        })?;
        let span = self.opaque_bytes(offset, 16)?;
        Ok(BandDefaults::decode(&mut BitCursor::new(span))?)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: &str) -> Result<()> {
        let ok = comment.len() <= COMMENT_LEN
            && comment.bytes().all(|b| (0x20..0x7F).contains(&b));
        if !ok {
            return Err(ImageError::InvalidComment { comment: comment.to_string() });
        }
        self.comment = comment.to_string();
        Ok(())
    }
}

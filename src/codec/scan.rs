// Scan edge codec: 16-byte record, plus an optional 4-byte visibility
// flag record on layouts that carry one

use serde::{Deserialize, Serialize};

use crate::bitwise::{BitCursor, BitCursorMut};
use crate::consts::{self, MAX_FREQUENCY, MIN_FREQUENCY, NAME_LEN};

use super::freq::FreqError;
use super::Result;

/// Scan edge reception mode (4-bit field; only 0..=4 are documented)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEdgeMode {
    Fm,
    Wfm,
    Am,
    Auto,
    NotSet,
    Unknown(u8),
}

impl ScanEdgeMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b1111 {
            0 => ScanEdgeMode::Fm,
            1 => ScanEdgeMode::Wfm,
            2 => ScanEdgeMode::Am,
            3 => ScanEdgeMode::Auto,
            4 => ScanEdgeMode::NotSet,
            other => ScanEdgeMode::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            ScanEdgeMode::Fm => 0,
            ScanEdgeMode::Wfm => 1,
            ScanEdgeMode::Am => 2,
            ScanEdgeMode::Auto => 3,
            ScanEdgeMode::NotSet => 4,
            ScanEdgeMode::Unknown(raw) => raw & 0b1111,
        }
    }
}

/// Scan edge attenuator (2-bit field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeAttenuator {
    Off,
    On,
    NotSet,
    Unknown(u8),
}

impl EdgeAttenuator {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => EdgeAttenuator::Off,
            1 => EdgeAttenuator::On,
            2 => EdgeAttenuator::NotSet,
            other => EdgeAttenuator::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            EdgeAttenuator::Off => 0,
            EdgeAttenuator::On => 1,
            EdgeAttenuator::NotSet => 2,
            EdgeAttenuator::Unknown(raw) => raw & 0b11,
        }
    }
}

/// Flag-record byte marking a hidden edge (duplicated in bytes 0 and 2)
const EDGE_HIDDEN: u8 = 0xFF;
const EDGE_VISIBLE: u8 = 0x7F;

/// One programmable scan edge.
///
/// Start and end are in Hz; the record stores them tripled so all four
/// multiplier grids land on integers. Byte 9 interleaves the attenuator
/// with selector bits the firmware manages itself, so the whole byte is
/// carried raw and only the attenuator bits are rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEdge {
    pub start: u64,
    pub end: u64,
    pub mode: ScanEdgeMode,
    /// 4-bit index into [`consts::STEPS`]
    pub tuning_step: u8,
    pub attenuator: EdgeAttenuator,
    pub name: String,
    /// From the parallel flag record; false on layouts without one
    pub hidden: bool,
    flags_raw: u8,
}

impl ScanEdge {
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        let start = u64::from(cur.read_u32_le()?) / 3;
        let end = u64::from(cur.read_u32_le()?) / 3;
        let mode = ScanEdgeMode::from_raw(cur.read_bits(4)? as u8);
        let tuning_step = cur.read_bits(4)? as u8;
        let flags_raw = cur.read_u8()?;
        let attenuator = EdgeAttenuator::from_raw((flags_raw >> 4) & 0b11);
        let raw_name = cur.read_bytes(NAME_LEN)?;
        let name = if raw_name[0] == 0 {
            String::new()
        } else {
            String::from_utf8_lossy(raw_name).trim_end().to_string()
        };
        Ok(Self {
            start,
            end,
            mode,
            tuning_step,
            attenuator,
            name,
            hidden: false,
            flags_raw,
        })
    }

    /// Encode the 16-byte record. A non-zero start or end outside the
    /// tunable range is rejected; zero marks an empty slot.
    pub fn encode(&self, cur: &mut BitCursorMut) -> Result<()> {
        for hz in [self.start, self.end] {
            if hz != 0 && !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&hz) {
                return Err(FreqError::FrequencyOutOfRange { hz }.into());
            }
        }
        cur.write_u32_le((self.start * 3) as u32)?;
        cur.write_u32_le((self.end * 3) as u32)?;
        cur.write_bits(4, u32::from(self.mode.raw()))?;
        cur.write_bits(4, u32::from(self.tuning_step & 0b1111))?;
        let flags =
            (self.flags_raw & 0b1100_1111) | (self.attenuator.raw() << 4);
        cur.write_u8(flags)?;
        if self.name.is_empty() {
            cur.write_bytes(&[0u8; NAME_LEN])?;
        } else {
            let mut buf = [b' '; NAME_LEN];
            for (dst, src) in buf.iter_mut().zip(self.name.bytes()) {
                *dst = src;
            }
            cur.write_bytes(&buf)?;
        }
        Ok(())
    }

    /// Read the visibility bit from a 4-byte flag record
    pub fn decode_flags(cur: &mut BitCursor) -> Result<bool> {
        let bytes = cur.read_bytes(4)?;
        Ok(bytes[0] & 0x80 != 0)
    }

    /// Write the 4-byte flag record for this edge's visibility
    pub fn encode_flags(&self, cur: &mut BitCursorMut) -> Result<()> {
        let mask = if self.hidden { EDGE_HIDDEN } else { EDGE_VISIBLE };
        cur.write_bytes(&[mask, 0xFF, mask, 0xFF])?;
        Ok(())
    }

    /// An all-zero record the firmware treats as an empty slot
    pub fn empty() -> Self {
        Self {
            start: 0,
            end: 0,
            mode: ScanEdgeMode::NotSet,
            tuning_step: consts::STEPS.len() as u8 - 1,
            attenuator: EdgeAttenuator::NotSet,
            name: String::new(),
            hidden: true,
            flags_raw: 0,
        }
    }

    pub fn step_label(&self) -> &'static str {
        consts::STEPS[usize::from(self.tuning_step & 0b1111)]
    }

    /// Display label of the mode; `None` for undocumented raw values
    pub fn mode_label(&self) -> Option<&'static str> {
        consts::SCAN_EDGE_MODES.get(usize::from(self.mode.raw())).copied()
    }

    /// Display label of the attenuator setting; `None` for undocumented
    /// raw values
    pub fn attenuator_label(&self) -> Option<&'static str> {
        consts::ATTENUATOR.get(usize::from(self.attenuator.raw())).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;

    fn edge_record(start_hz: u64, end_hz: u64) -> [u8; 16] {
        let mut rec = [0u8; 16];
        rec[0..4].copy_from_slice(&((start_hz * 3) as u32).to_le_bytes());
        rec[4..8].copy_from_slice(&((end_hz * 3) as u32).to_le_bytes());
        rec[8] = 0x05; // FM, step 12.5
        rec[9] = 0b0001_0110; // attenuator on, selector bits seeded
        rec[10..16].copy_from_slice(b"AIR   ");
        rec
    }

    #[test]
    fn test_decode() {
        let rec = edge_record(118_000_000, 136_000_000);
        let mut cur = BitCursor::new(&rec);
        let edge = ScanEdge::decode(&mut cur).unwrap();
        assert_eq!(edge.start, 118_000_000);
        assert_eq!(edge.end, 136_000_000);
        assert_eq!(edge.mode, ScanEdgeMode::Fm);
        assert_eq!(edge.step_label(), "12.5");
        assert_eq!(edge.attenuator, EdgeAttenuator::On);
        assert_eq!(edge.mode_label(), Some("FM"));
        assert_eq!(edge.attenuator_label(), Some("On"));
        assert_eq!(edge.name, "AIR");
        assert!(!edge.hidden);
    }

    #[test]
    fn test_out_of_range_edge_rejected() {
        // above the tunable range the tripled value no longer fits the
        // record; encoding must fail instead of storing a wrapped value
        let mut edge = ScanEdge::empty();
        edge.start = 2_000_000_000;
        edge.end = 2_100_000_000;
        let mut out = [0u8; 16];
        let err = edge.encode(&mut BitCursorMut::new(&mut out)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Freq(FreqError::FrequencyOutOfRange { hz: 2_000_000_000 })
        ));

        // a non-zero edge below the tunable range is rejected too
        edge.start = 50_000;
        edge.end = 2_000_000;
        assert!(edge.encode(&mut BitCursorMut::new(&mut out)).is_err());

        // zero start and end mark an empty slot and stay encodable
        let empty = ScanEdge::empty();
        assert!(empty.encode(&mut BitCursorMut::new(&mut out)).is_ok());
    }

    #[test]
    fn test_roundtrip_preserves_selector_bits() {
        let rec = edge_record(118_000_000, 136_000_000);
        let mut cur = BitCursor::new(&rec);
        let mut edge = ScanEdge::decode(&mut cur).unwrap();
        // changing the attenuator must leave byte 9's other bits alone
        edge.attenuator = EdgeAttenuator::Off;
        let mut out = [0u8; 16];
        edge.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out[9], 0b0000_0110);
        assert_eq!(out[..9], rec[..9]);
        assert_eq!(out[10..], rec[10..]);
    }

    #[test]
    fn test_empty_name_encodes_as_zeros() {
        let mut edge = ScanEdge::empty();
        edge.start = 1_000_000;
        edge.end = 2_000_000;
        let mut out = [0xFFu8; 16];
        edge.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(&out[10..16], &[0u8; 6]);
    }

    #[test]
    fn test_flag_record() {
        let hidden = [0xFF, 0xFF, 0xFF, 0xFF];
        let visible = [0x7F, 0xFF, 0x7F, 0xFF];
        assert!(ScanEdge::decode_flags(&mut BitCursor::new(&hidden)).unwrap());
        assert!(!ScanEdge::decode_flags(&mut BitCursor::new(&visible)).unwrap());

        let mut edge = ScanEdge::empty();
        edge.hidden = false;
        let mut out = [0u8; 4];
        edge.encode_flags(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, visible);
        edge.hidden = true;
        edge.encode_flags(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, hidden);
    }

    #[test]
    fn test_unknown_mode_roundtrips() {
        let mut rec = edge_record(1_000_000, 2_000_000);
        rec[8] = 0x95; // undocumented mode 9
        let mut cur = BitCursor::new(&rec);
        let edge = ScanEdge::decode(&mut cur).unwrap();
        assert_eq!(edge.mode, ScanEdgeMode::Unknown(9));
        let mut out = [0u8; 16];
        edge.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out[8], 0x95);
    }
}

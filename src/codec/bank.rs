// Bank and scan-link records: 8-byte name records plus the padded 22-bit
// bank bitmap words

use serde::{Deserialize, Serialize};

use crate::bitwise::{BitCursor, BitCursorMut, Endianness};
use crate::consts::NAME_LEN;

use super::Result;

/// Bank membership bits of a bitmap word
pub const BANK_WORD_MASK: u32 = 0x003F_FFFF;
/// Padding bits of a bitmap word; the firmware keeps them all set
pub const BANK_WORD_PAD: u32 = 0xFFC0_0000;

/// Decode a bank bitmap word: bits 0..22 are bank membership, the padding
/// bits above are constant and dropped
pub fn decode_bank_word(cur: &mut BitCursor, endianness: Endianness) -> Result<u32> {
    let word = if endianness.is_big() {
        cur.read_u32_be()?
    } else {
        cur.read_u32_le()?
    };
    Ok(word & BANK_WORD_MASK)
}

/// Encode a bank bitmap word with the padding bits forced to 1
pub fn encode_bank_word(
    banks: u32,
    cur: &mut BitCursorMut,
    endianness: Endianness,
) -> Result<()> {
    let word = BANK_WORD_PAD | (banks & BANK_WORD_MASK);
    if endianness.is_big() {
        cur.write_u32_be(word)?;
    } else {
        cur.write_u32_le(word)?;
    }
    Ok(())
}

/// Shared shape of bank and scan-link name records: 6 ASCII characters and
/// 2 reserved bytes carried verbatim. A leading NUL marks an empty slot.
fn decode_name_record(cur: &mut BitCursor) -> Result<(String, [u8; 2])> {
    let raw = cur.read_bytes(NAME_LEN)?;
    let name = if raw[0] == 0 {
        String::new()
    } else {
        String::from_utf8_lossy(raw).trim_end().to_string()
    };
    let reserved: [u8; 2] = cur.read_bytes(2)?.try_into().unwrap_or_default();
    Ok((name, reserved))
}

fn encode_name_record(name: &str, reserved: [u8; 2], cur: &mut BitCursorMut) -> Result<()> {
    if name.is_empty() {
        cur.write_bytes(&[0u8; NAME_LEN])?;
    } else {
        let mut buf = [b' '; NAME_LEN];
        for (dst, src) in buf.iter_mut().zip(name.bytes()) {
            *dst = src;
        }
        cur.write_bytes(&buf)?;
    }
    cur.write_bytes(&reserved)?;
    Ok(())
}

/// A memory bank's editable attributes (membership lives in the per-channel
/// flag records, not here)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    reserved: [u8; 2],
}

impl Bank {
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        let (name, reserved) = decode_name_record(cur)?;
        Ok(Self { name, reserved })
    }

    pub fn encode(&self, cur: &mut BitCursorMut) -> Result<()> {
        encode_name_record(&self.name, self.reserved, cur)
    }
}

/// A scan link: a named set of banks scanned together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanLink {
    pub name: String,
    /// Bank membership bits (bit per bank, bit 0 = bank A)
    pub banks: u32,
    reserved: [u8; 2],
}

impl ScanLink {
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        let (name, reserved) = decode_name_record(cur)?;
        Ok(Self { name, banks: 0, reserved })
    }

    pub fn encode(&self, cur: &mut BitCursorMut) -> Result<()> {
        encode_name_record(&self.name, self.reserved, cur)
    }

    pub fn contains(&self, bank: usize) -> bool {
        self.banks & (1 << bank) != 0
    }

    pub fn set(&mut self, bank: usize, member: bool) {
        let bit = 1u32 << bank;
        if member {
            self.banks |= bit;
        } else {
            self.banks &= !bit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_word_padding_forced() {
        let mut out = [0u8; 4];
        encode_bank_word(0b101, &mut BitCursorMut::new(&mut out), Endianness::Big).unwrap();
        assert_eq!(out, [0xFF, 0xC0, 0x00, 0x05]);

        let banks =
            decode_bank_word(&mut BitCursor::new(&out), Endianness::Big).unwrap();
        assert_eq!(banks, 0b101);
    }

    #[test]
    fn test_bank_word_little_endian() {
        let mut out = [0u8; 4];
        encode_bank_word(0x3F_FFFF, &mut BitCursorMut::new(&mut out), Endianness::Little)
            .unwrap();
        assert_eq!(out, [0xFF, 0xFF, 0xFF, 0xFF]);

        let data = [0x05, 0x00, 0xC0, 0xFF];
        let banks =
            decode_bank_word(&mut BitCursor::new(&data), Endianness::Little).unwrap();
        assert_eq!(banks, 0b101);
    }

    #[test]
    fn test_bank_name_roundtrip() {
        let data = *b"AIR   \xCA\xFE";
        let mut cur = BitCursor::new(&data);
        let bank = Bank::decode(&mut cur).unwrap();
        assert_eq!(bank.name, "AIR");

        // reserved bytes survive untouched
        let mut out = [0u8; 8];
        bank.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_empty_name_slot() {
        let data = [0u8; 8];
        let mut cur = BitCursor::new(&data);
        let bank = Bank::decode(&mut cur).unwrap();
        assert_eq!(bank.name, "");

        let mut out = [0xA5u8; 8];
        bank.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_scan_link_membership() {
        let mut link = ScanLink::default();
        link.set(0, true);
        link.set(21, true);
        assert!(link.contains(0));
        assert!(!link.contains(1));
        assert!(link.contains(21));
        assert_eq!(link.banks, (1 << 21) | 1);
        link.set(0, false);
        assert!(!link.contains(0));
    }
}

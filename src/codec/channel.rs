// Memory channel codec: 16-byte record plus 2-byte control flag record

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bitwise::{BitCursor, BitCursorMut};
use crate::consts::{self, BANK_NOT_SET, BANK_POS_NOT_SET, MAX_OFFSET};

use super::freq::{decode_freq, encode_freq_hinted, FreqError, Multiplier};
use super::name::{decode_name, encode_name};
use super::Result;

/// Reception mode, a total 2-bit field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Fm,
    Wfm,
    Am,
    Auto,
}

impl Mode {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => Mode::Fm,
            1 => Mode::Wfm,
            2 => Mode::Am,
            _ => Mode::Auto,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Mode::Fm => 0,
            Mode::Wfm => 1,
            Mode::Am => 2,
            Mode::Auto => 3,
        }
    }
}

/// Duplex direction; the field has one undocumented value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Duplex {
    None,
    Minus,
    Plus,
    Unknown(u8),
}

impl Duplex {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => Duplex::None,
            1 => Duplex::Minus,
            2 => Duplex::Plus,
            other => Duplex::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Duplex::None => 0,
            Duplex::Minus => 1,
            Duplex::Plus => 2,
            Duplex::Unknown(raw) => raw & 0b11,
        }
    }
}

/// Tone squelch mode (3-bit field, values above 4 undocumented)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneMode {
    None,
    Tsql,
    TsqlR,
    Dtcs,
    DtcsR,
    Unknown(u8),
}

impl ToneMode {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b111 {
            0 => ToneMode::None,
            1 => ToneMode::Tsql,
            2 => ToneMode::TsqlR,
            3 => ToneMode::Dtcs,
            4 => ToneMode::DtcsR,
            other => ToneMode::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            ToneMode::None => 0,
            ToneMode::Tsql => 1,
            ToneMode::TsqlR => 2,
            ToneMode::Dtcs => 3,
            ToneMode::DtcsR => 4,
            ToneMode::Unknown(raw) => raw & 0b111,
        }
    }
}

/// DTCS polarity bit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Normal,
    Reverse,
}

impl Polarity {
    pub fn from_raw(raw: u8) -> Self {
        if raw & 1 == 0 { Polarity::Normal } else { Polarity::Reverse }
    }

    pub fn raw(self) -> u8 {
        match self {
            Polarity::Normal => 0,
            Polarity::Reverse => 1,
        }
    }
}

/// Noise canceller mode (US models), a total 2-bit field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Canceller {
    Off,
    Train1,
    Train2,
    Msk,
}

impl Canceller {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => Canceller::Off,
            1 => Canceller::Train1,
            2 => Canceller::Train2,
            _ => Canceller::Msk,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Canceller::Off => 0,
            Canceller::Train1 => 1,
            Canceller::Train2 => 2,
            Canceller::Msk => 3,
        }
    }
}

/// Scan skip marker from the control flag record.
///
/// Raw value 2 is unused by the firmware but round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Skip {
    None,
    Skip,
    Priority,
    Unknown(u8),
}

impl Skip {
    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => Skip::None,
            1 => Skip::Skip,
            3 => Skip::Priority,
            other => Skip::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Skip::None => 0,
            Skip::Skip => 1,
            Skip::Priority => 3,
            Skip::Unknown(raw) => raw & 0b11,
        }
    }
}

/// Bank assignment: bank index and position within the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankSlot {
    pub bank: u8,
    pub pos: u8,
}

/// Control flag record held in the parallel flags table (2 bytes per
/// channel): visibility, scan skip, bank assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelFlags {
    pub hidden: bool,
    pub skip: Skip,
    pub bank: Option<BankSlot>,
}

impl Default for ChannelFlags {
    fn default() -> Self {
        Self { hidden: true, skip: Skip::None, bank: None }
    }
}

impl ChannelFlags {
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        let hidden = cur.read_bits(1)? != 0;
        let skip = Skip::from_raw(cur.read_bits(2)? as u8);
        let bank = cur.read_bits(5)? as u8;
        let pos = cur.read_u8()?;
        let bank = if bank == BANK_NOT_SET {
            // bank_pos is meaningless without a bank
            None
        } else {
            Some(BankSlot { bank, pos })
        };
        Ok(Self { hidden, skip, bank })
    }

    pub fn encode(&self, cur: &mut BitCursorMut) -> Result<()> {
        cur.write_bits(1, u32::from(self.hidden))?;
        cur.write_bits(2, u32::from(self.skip.raw()))?;
        match self.bank {
            Some(slot) => {
                cur.write_bits(5, u32::from(slot.bank & 0b11111))?;
                cur.write_u8(slot.pos)?;
            }
            None => {
                cur.write_bits(5, u32::from(BANK_NOT_SET))?;
                cur.write_u8(BANK_POS_NOT_SET)?;
            }
        }
        Ok(())
    }
}

/// One memory channel, decoded from its 16-byte record.
///
/// Frequency and offset are held in Hz. The multiplier selectors the record
/// was stored with are kept so an unmodified channel re-encodes
/// byte-for-byte; changing the frequency re-runs divisor selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub freq: u64,
    pub offset: u64,
    pub freq_mult: Multiplier,
    pub offset_mult: Multiplier,
    pub af_filter: bool,
    pub attenuator: bool,
    pub mode: Mode,
    /// 4-bit index into [`consts::STEPS`]
    pub tuning_step: u8,
    pub duplex: Duplex,
    pub tone_mode: ToneMode,
    /// Raw 6-bit CTCSS tone index; see [`Channel::tsql_tone`]
    pub tsql_freq: u8,
    pub polarity: Polarity,
    /// Raw 7-bit DTCS code index; see [`Channel::dtcs_code`]
    pub dtcs: u8,
    /// Canceller training frequency in Hz (stored in 10 Hz units)
    pub canceller_freq: u16,
    pub vsc: bool,
    pub canceller: Canceller,
    pub name: String,
}

impl Channel {
    /// Decode a 16-byte channel record; an undecodable name is an error
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        Self::decode_inner(cur, true)
    }

    /// Like [`Channel::decode`], but an undecodable name degrades to an
    /// empty one so a single corrupt glyph cannot abort a whole-image load
    pub fn decode_lossy(cur: &mut BitCursor) -> Result<Self> {
        Self::decode_inner(cur, false)
    }

    fn decode_inner(cur: &mut BitCursor, strict_name: bool) -> Result<Self> {
        let mant_low = cur.read_u16_le()?;
        let offset_sel = cur.read_bits(2)? as u8;
        let freq_sel = cur.read_bits(2)? as u8;
        cur.skip_bits(2)?;
        let mant_high = cur.read_bits(2)?;

        let af_filter = cur.read_bits(1)? != 0;
        let attenuator = cur.read_bits(1)? != 0;
        let mode = Mode::from_raw(cur.read_bits(2)? as u8);
        let tuning_step = cur.read_bits(4)? as u8;

        cur.skip_bits(2)?;
        let duplex = Duplex::from_raw(cur.read_bits(2)? as u8);
        cur.skip_bits(1)?;
        let tone_mode = ToneMode::from_raw(cur.read_bits(3)? as u8);

        let offset_mant = cur.read_u16_le()?;

        cur.skip_bits(2)?;
        let tsql_freq = cur.read_bits(6)? as u8;
        let polarity = Polarity::from_raw(cur.read_bits(1)? as u8);
        let dtcs = cur.read_bits(7)? as u8;

        let canc_high = cur.read_u8()?;
        let canc_low = cur.read_bits(1)?;
        cur.skip_bits(4)?;
        let vsc = cur.read_bits(1)? != 0;
        let canceller_raw = cur.read_bits(2)? as u8;

        let packed_name: [u8; 5] = cur.read_bytes(5)?.try_into().unwrap_or_default();
        let name = match decode_name(&packed_name) {
            Ok(name) => name,
            Err(err) if !strict_name => {
                warn!(?err, "unreadable channel name, substituting empty");
                String::new()
            }
            Err(err) => return Err(err.into()),
        };

        let freq_mult = Multiplier::from_raw(freq_sel);
        let offset_mult = Multiplier::from_raw(offset_sel);
        let mantissa = (mant_high << 16) | u32::from(mant_low);

        Ok(Self {
            freq: decode_freq(mantissa, freq_mult),
            offset: decode_freq(u32::from(offset_mant), offset_mult),
            freq_mult,
            offset_mult,
            af_filter,
            attenuator,
            mode,
            tuning_step,
            duplex,
            tone_mode,
            tsql_freq,
            polarity,
            dtcs,
            canceller_freq: (u16::from(canc_high) << 1 | canc_low as u16) * 10,
            vsc,
            canceller: if vsc { Canceller::Off } else { Canceller::from_raw(canceller_raw) },
            name,
        })
    }

    /// Encode into a 16-byte span, overwriting every bit
    pub fn encode(&self, cur: &mut BitCursorMut) -> Result<()> {
        let offset = self.offset.min(MAX_OFFSET);
        let enc =
            encode_freq_hinted(self.freq, offset, self.freq_mult, self.offset_mult)?;

        // the record holds an 18-bit mantissa and a 16-bit offset mantissa,
        // narrower than what the transcoder can represent
        if enc.freq_mantissa > 0x3_FFFF {
            return Err(FreqError::FrequencyOutOfRange { hz: self.freq }.into());
        }
        if enc.offset_mantissa > 0xFFFF {
            return Err(FreqError::FrequencyOutOfRange { hz: offset }.into());
        }

        cur.write_u16_le((enc.freq_mantissa & 0xFFFF) as u16)?;
        cur.write_bits(2, u32::from(enc.offset_mult.raw()))?;
        cur.write_bits(2, u32::from(enc.freq_mult.raw()))?;
        cur.write_bits(2, 0)?;
        cur.write_bits(2, enc.freq_mantissa >> 16)?;

        cur.write_bits(1, u32::from(self.af_filter))?;
        cur.write_bits(1, u32::from(self.attenuator))?;
        cur.write_bits(2, u32::from(self.mode.raw()))?;
        cur.write_bits(4, u32::from(self.tuning_step & 0b1111))?;

        cur.write_bits(2, 0)?;
        cur.write_bits(2, u32::from(self.duplex.raw()))?;
        cur.write_bits(1, 0)?;
        cur.write_bits(3, u32::from(self.tone_mode.raw()))?;

        cur.write_u16_le((enc.offset_mantissa & 0xFFFF) as u16)?;

        cur.write_bits(2, 0)?;
        cur.write_bits(6, u32::from(self.tsql_freq & 0b11_1111))?;
        cur.write_bits(1, u32::from(self.polarity.raw()))?;
        cur.write_bits(7, u32::from(self.dtcs & 0b111_1111))?;

        let canc_freq = self.canceller_freq / 10;
        cur.write_u8(((canc_freq >> 1) & 0xFF) as u8)?;
        cur.write_bits(1, u32::from(canc_freq & 1))?;
        cur.write_bits(4, 0)?;
        // vsc and the canceller are mutually exclusive; vsc wins
        if self.vsc {
            cur.write_bits(1, 1)?;
            cur.write_bits(2, 0)?;
        } else {
            cur.write_bits(1, 0)?;
            cur.write_bits(2, u32::from(self.canceller.raw()))?;
        }

        cur.write_bytes(&encode_name(&self.name)?)?;
        Ok(())
    }

    /// CTCSS tone in Hz for the stored tsql index, if documented
    pub fn tsql_tone(&self) -> Option<f32> {
        consts::ctcss_tone(self.tsql_freq)
    }

    /// DTCS code for the stored index, if documented
    pub fn dtcs_code(&self) -> Option<u16> {
        consts::dtcs_code(self.dtcs)
    }

    /// Display label of the tuning step
    pub fn step_label(&self) -> &'static str {
        consts::STEPS[usize::from(self.tuning_step & 0b1111)]
    }

    /// Display label of the canceller mode
    pub fn canceller_label(&self) -> &'static str {
        consts::CANCELLER[usize::from(self.canceller.raw())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecError;

    fn decode_record(hex: &str) -> Channel {
        let data = hex_to_bytes(hex);
        let mut cur = BitCursor::new(&data);
        Channel::decode(&mut cur).unwrap()
    }

    fn hex_to_bytes(hex: &str) -> Vec<u8> {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
            .collect()
    }

    fn encode_record(chan: &Channel) -> [u8; 16] {
        // seed with junk so the test catches any bit the encoder misses
        let mut out = [0xA5u8; 16];
        let mut cur = BitCursorMut::new(&mut out);
        chan.encode(&mut cur).unwrap();
        out
    }

    #[test]
    fn test_decode_am_channel() {
        let chan = decode_record("E9030020000000080072000BA5C21B00");
        assert_eq!(chan.freq, 5_005_000);
        assert_eq!(chan.freq_mult, Multiplier::Step5k);
        assert_eq!(chan.name, "NEPAL");
        assert_eq!(chan.mode, Mode::Am);
        assert!(!chan.af_filter);
        assert!(!chan.attenuator);
        assert_eq!(chan.step_label(), "5");
        assert_eq!(chan.duplex, Duplex::None);
        assert_eq!(chan.offset, 0);
        assert_eq!(chan.tone_mode, ToneMode::None);
        assert_eq!(chan.tsql_freq, 8);
        assert_eq!(chan.tsql_tone(), Some(88.5));
        assert_eq!(chan.polarity, Polarity::Normal);
        assert_eq!(chan.dtcs_code(), Some(23));
        assert!(!chan.vsc);
        assert_eq!(chan.canceller, Canceller::Off);
        assert_eq!(chan.canceller_label(), "Off");
        assert_eq!(chan.canceller_freq, 2280);
    }

    #[test]
    fn test_decode_duplex_channel() {
        let chan = decode_record("0a8b0205146009028472000935c0d000");
        assert_eq!(chan.freq, 833_330_000);
        assert_eq!(chan.name, "DUP-");
        assert_eq!(chan.mode, Mode::Fm);
        assert_eq!(chan.step_label(), "12.5");
        assert_eq!(chan.duplex, Duplex::Minus);
        assert_eq!(chan.offset, 12_000_000);
        assert_eq!(chan.tone_mode, ToneMode::DtcsR);
        assert_eq!(chan.tsql_freq, 2);
        assert_eq!(chan.polarity, Polarity::Reverse);
        assert_eq!(chan.dtcs_code(), Some(32));
    }

    #[test]
    fn test_decode_vsc_channel() {
        let chan = decode_record("282300c82420032cba72040d25cf4452");
        assert_eq!(chan.freq, 45_000_000);
        assert_eq!(chan.name, "TEST12");
        assert!(chan.af_filter);
        assert!(chan.attenuator);
        assert_eq!(chan.step_label(), "25");
        assert_eq!(chan.duplex, Duplex::Plus);
        assert_eq!(chan.offset, 4_000_000);
        assert_eq!(chan.tsql_freq, 44);
        assert_eq!(chan.dtcs, 58);
        assert!(chan.vsc);
        assert_eq!(chan.canceller, Canceller::Off);
        assert_eq!(chan.canceller_freq, 2280);
    }

    #[test]
    fn test_roundtrip_device_records() {
        for hex in [
            "e9030020000000080072000ba5c21b00",
            "f4030020000000080072000d7a8a5ae9",
            "9f040020000000080072000cecbf686b",
            "a6040020000000080072000d21a77351",
            "a9040020000000080072000ba5d28353",
            "ab0400200000000800720008efb35b62",
            "b00400200000000800720008f58a1351",
            "b4040020000000080072000d35cab979",
            "b7040020000000080072000daf84d440",
            "b80400200000000800720008e1b8f9e5",
            "0a8b0205146009028472000935c0d000",
        ] {
            let data = hex_to_bytes(hex);
            let mut cur = BitCursor::new(&data);
            let chan = Channel::decode(&mut cur).unwrap();
            assert_eq!(encode_record(&chan).as_slice(), &data[..], "{hex}");
        }
    }

    #[test]
    fn test_vsc_suppresses_canceller() {
        let mut chan = decode_record("E9030020000000080072000BA5C21B00");
        chan.vsc = true;
        chan.canceller = Canceller::Msk;
        let out = encode_record(&chan);
        // byte 10: vsc bit set, canceller bits cleared
        assert_eq!(out[10] & 0b0000_0111, 0b100);
    }

    #[test]
    fn test_flags_roundtrip_with_bank() {
        let data = [0x73, 0x2B];
        let mut cur = BitCursor::new(&data);
        let flags = ChannelFlags::decode(&mut cur).unwrap();
        assert!(!flags.hidden);
        assert_eq!(flags.skip, Skip::Priority);
        assert_eq!(flags.bank, Some(BankSlot { bank: 19, pos: 0x2B }));

        let mut out = [0u8; 2];
        flags.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_flags_bank_sentinel() {
        // bank 31 means unassigned whatever bank_pos says
        let data = [0b0001_1111, 0x07];
        let mut cur = BitCursor::new(&data);
        let flags = ChannelFlags::decode(&mut cur).unwrap();
        assert_eq!(flags.bank, None);

        let mut out = [0u8; 2];
        flags.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, [0b0001_1111, 0xFF]);
    }

    #[test]
    fn test_lossy_name_decode() {
        // zeroing byte 11 makes the first glyph code 0b000010, unassigned
        let mut data = hex_to_bytes("E9030020000000080072000BA5C21B00");
        data[11] = 0x00;
        let mut cur = BitCursor::new(&data);
        assert!(Channel::decode(&mut cur).is_err());

        let mut cur = BitCursor::new(&data);
        let chan = Channel::decode_lossy(&mut cur).unwrap();
        assert_eq!(chan.name, "");
    }

    #[test]
    fn test_encode_rejects_mantissa_over_record_width() {
        // 1_310_720_000 Hz sits on the 5 kHz grid with mantissa 0x40000,
        // one past the record's 18-bit field; the error must name the
        // frequency, not the cursor write
        let mut chan = decode_record("E9030020000000080072000BA5C21B00");
        chan.freq = 1_310_720_000;
        let mut out = [0u8; 16];
        let err = chan.encode(&mut BitCursorMut::new(&mut out)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Freq(FreqError::FrequencyOutOfRange { hz: 1_310_720_000 })
        ));
    }

    #[test]
    fn test_modified_freq_reselects_multiplier() {
        let mut chan = decode_record("E9030020000000080072000BA5C21B00");
        chan.freq = 100_006_250;
        let out = encode_record(&chan);
        let mut cur = BitCursor::new(&out);
        let redecoded = Channel::decode(&mut cur).unwrap();
        assert_eq!(redecoded.freq, 100_006_250);
        assert_eq!(redecoded.freq_mult, Multiplier::Step6k25);
    }
}

// Device settings codec (64-byte dense record) and per-band defaults.
//
// The settings record interleaves documented fields with reserved bits the
// firmware expects to keep their values, so the decoder captures the whole
// raw block and the encoder rewrites only the documented fields in a copy
// of it.

use serde::{Deserialize, Serialize};

use crate::bitwise::{BitCursor, BitCursorMut};

use super::channel::{Canceller, Duplex, Mode, Polarity, ToneMode};
use super::Result;

/// Size of the settings record in bytes
pub const SETTINGS_LEN: usize = 64;

/// Size of one band defaults record in bytes
pub const BAND_LEN: usize = 16;

fn masked_set(buf: &mut [u8], idx: usize, mask: u8, value: u8) {
    buf[idx] = (buf[idx] & !mask) | (value & mask);
}

fn set_bool(buf: &mut [u8], idx: usize, bit: u8, value: bool) {
    masked_set(buf, idx, 1 << bit, u8::from(value) << bit);
}

/// Global device settings.
///
/// All fields are raw device values; range clamping happens on encode where
/// the firmware is known to reject out-of-range values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub func_dial_step: u8,
    pub key_beep: bool,
    pub beep_level: u8,
    pub backlight: u8,
    pub power_save: bool,
    pub am_ant: u8,
    pub fm_ant: u8,
    pub set_expand: bool,
    pub key_lock: u8,
    pub dial_speed_up: bool,
    pub monitor: u8,
    pub auto_power_off: u8,
    pub pause_timer: u8,
    pub resume_timer: u8,
    pub stop_beep: bool,
    pub lcd_contrast: u8,
    pub wx_alert: bool,
    pub af_filter_fm: bool,
    pub af_filter_wfm: bool,
    pub af_filter_am: bool,
    pub civ_address: u8,
    pub civ_baud_rate: u8,
    pub civ_transceive: bool,
    pub charging_type: u8,
    pub dial_function: u8,
    pub mem_display_type: u8,
    pub program_skip_scan: bool,
    pub wx_channel: u8,
    /// The block as decoded; reserved bits are replayed from here on encode
    raw: Vec<u8>,
}

impl Settings {
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        let raw = cur.read_bytes(SETTINGS_LEN)?.to_vec();
        Ok(Self {
            func_dial_step: raw[13] & 0b11,
            key_beep: raw[15] & 1 != 0,
            beep_level: raw[16] & 0b11_1111,
            backlight: raw[17] & 0b11,
            power_save: raw[18] & 1 != 0,
            am_ant: raw[19] & 1,
            fm_ant: raw[20] & 1,
            set_expand: raw[21] & 1 != 0,
            key_lock: raw[22] & 0b11,
            dial_speed_up: raw[23] & 1 != 0,
            monitor: raw[24] & 1,
            auto_power_off: raw[25] & 0b111,
            pause_timer: raw[26] & 0b1111,
            resume_timer: raw[27] & 0b111,
            stop_beep: raw[28] & 1 != 0,
            lcd_contrast: raw[29] & 0b111,
            wx_alert: raw[30] != 0,
            af_filter_fm: raw[31] & 1 != 0,
            af_filter_wfm: raw[32] & 1 != 0,
            af_filter_am: raw[33] & 1 != 0,
            civ_address: raw[34],
            civ_baud_rate: raw[35] & 0b111,
            civ_transceive: raw[36] & 1 != 0,
            charging_type: raw[37] & 1,
            dial_function: (raw[52] >> 4) & 1,
            mem_display_type: raw[52] & 0b11,
            program_skip_scan: raw[53] & 0b1000 != 0,
            wx_channel: raw[59],
            raw,
        })
    }

    pub fn encode(&self, cur: &mut BitCursorMut) -> Result<()> {
        let mut buf = if self.raw.len() == SETTINGS_LEN {
            self.raw.clone()
        } else {
            vec![0; SETTINGS_LEN]
        };
        masked_set(&mut buf, 13, 0b11, self.func_dial_step);
        set_bool(&mut buf, 15, 0, self.key_beep);
        masked_set(&mut buf, 16, 0b11_1111, self.beep_level);
        masked_set(&mut buf, 17, 0b11, self.backlight);
        set_bool(&mut buf, 18, 0, self.power_save);
        masked_set(&mut buf, 19, 1, self.am_ant);
        masked_set(&mut buf, 20, 1, self.fm_ant);
        set_bool(&mut buf, 21, 0, self.set_expand);
        masked_set(&mut buf, 22, 0b11, self.key_lock);
        set_bool(&mut buf, 23, 0, self.dial_speed_up);
        masked_set(&mut buf, 24, 1, self.monitor);
        masked_set(&mut buf, 25, 0b111, self.auto_power_off);
        masked_set(&mut buf, 26, 0b1111, self.pause_timer);
        masked_set(&mut buf, 27, 0b111, self.resume_timer);
        set_bool(&mut buf, 28, 0, self.stop_beep);
        masked_set(&mut buf, 29, 0b111, self.lcd_contrast);
        buf[30] = u8::from(self.wx_alert);
        set_bool(&mut buf, 31, 0, self.af_filter_fm);
        set_bool(&mut buf, 32, 0, self.af_filter_wfm);
        set_bool(&mut buf, 33, 0, self.af_filter_am);
        buf[34] = self.civ_address;
        masked_set(&mut buf, 35, 0b111, self.civ_baud_rate);
        set_bool(&mut buf, 36, 0, self.civ_transceive);
        masked_set(&mut buf, 37, 1, self.charging_type);
        masked_set(&mut buf, 52, 0b1_0000, self.dial_function << 4);
        masked_set(&mut buf, 52, 0b11, self.mem_display_type);
        set_bool(&mut buf, 53, 3, self.program_skip_scan);
        buf[59] = self.wx_channel.min(9);
        cur.write_bytes(&buf)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        let zeros = vec![0; SETTINGS_LEN];
        let mut cur = BitCursor::new(&zeros);
        // decoding an all-zero block cannot fail
        Self::decode(&mut cur).unwrap_or_else(|_| unreachable!())
    }
}

/// Factory per-band defaults (read-mostly reference data; the raw block is
/// replayed verbatim on encode)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandDefaults {
    pub freq: u64,
    pub offset: u64,
    pub tuning_step: u8,
    pub tsql_freq: u8,
    pub dtcs: u8,
    pub mode: Mode,
    pub duplex: Duplex,
    pub tone_mode: ToneMode,
    pub vsc: bool,
    pub canceller: Canceller,
    pub polarity: Polarity,
    pub af_filter: bool,
    pub attenuator: bool,
    /// Training frequency, stored big-endian unlike every other multi-byte
    /// field in the image
    pub canceller_freq: u16,
}

impl BandDefaults {
    pub fn decode(cur: &mut BitCursor) -> Result<Self> {
        let start = u64::from(cur.read_u32_le()?) / 3;
        let offset = u64::from(cur.read_u32_le()?) / 3;
        let raw: [u8; 8] = cur.read_bytes(8)?.try_into().unwrap_or_default();
        Ok(Self {
            freq: start,
            offset,
            tuning_step: raw[0] & 0b1111,
            tsql_freq: raw[1] & 0b11_1111,
            dtcs: raw[2] & 0b111_1111,
            duplex: Duplex::from_raw(raw[4] >> 6),
            mode: Mode::from_raw((raw[4] >> 4) & 0b11),
            tone_mode: ToneMode::from_raw(raw[4] & 0b111),
            vsc: raw[5] & 0b100_0000 != 0,
            canceller: Canceller::from_raw((raw[5] >> 4) & 0b11),
            polarity: Polarity::from_raw((raw[5] >> 2) & 1),
            af_filter: raw[5] & 0b10 != 0,
            attenuator: raw[5] & 1 != 0,
            canceller_freq: u16::from(raw[6]) << 8 | u16::from(raw[7]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_block() -> Vec<u8> {
        // reserved bits set where no field lives
        let mut raw = vec![0xFFu8; SETTINGS_LEN];
        raw[16] = 0b1110_0101; // beep level 37, high bits reserved
        raw[30] = 1;
        raw[34] = 0x42;
        raw[59] = 3;
        raw
    }

    #[test]
    fn test_decode_fields() {
        let raw = seeded_block();
        let mut cur = BitCursor::new(&raw);
        let settings = Settings::decode(&mut cur).unwrap();
        assert_eq!(settings.beep_level, 37);
        assert!(settings.key_beep);
        assert_eq!(settings.civ_address, 0x42);
        assert_eq!(settings.wx_channel, 3);
        assert_eq!(settings.auto_power_off, 7);
        assert_eq!(settings.dial_function, 1);
    }

    #[test]
    fn test_reserved_bits_survive_mutation() {
        let raw = seeded_block();
        let mut cur = BitCursor::new(&raw);
        let mut settings = Settings::decode(&mut cur).unwrap();
        settings.beep_level = 0;
        settings.key_beep = false;

        let mut out = vec![0u8; SETTINGS_LEN];
        settings.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        // the two touched fields change, their reserved neighbours do not
        assert_eq!(out[16], 0b1100_0000);
        assert_eq!(out[15], 0b1111_1110);
        assert_eq!(out[0], 0xFF);
        assert_eq!(out[63], 0xFF);
    }

    #[test]
    fn test_roundtrip_is_byte_exact() {
        let raw = seeded_block();
        let mut cur = BitCursor::new(&raw);
        let settings = Settings::decode(&mut cur).unwrap();
        let mut out = vec![0u8; SETTINGS_LEN];
        settings.encode(&mut BitCursorMut::new(&mut out)).unwrap();
        assert_eq!(out, raw);
    }

    #[test]
    fn test_band_defaults_decode() {
        let mut rec = [0u8; BAND_LEN];
        rec[0..4].copy_from_slice(&(87_500_000u32 * 3).to_le_bytes());
        rec[4..8].copy_from_slice(&(100_000u32 * 3).to_le_bytes());
        rec[8] = 0x05;
        rec[9] = 8;
        rec[12] = 0b1001_0001; // duplex plus, mode WFM, tone TSQL
        rec[13] = 0b0100_0101;
        rec[14] = 0x08;
        rec[15] = 0xE8;

        let mut cur = BitCursor::new(&rec);
        let band = BandDefaults::decode(&mut cur).unwrap();
        assert_eq!(band.freq, 87_500_000);
        assert_eq!(band.offset, 100_000);
        assert_eq!(band.tuning_step, 5);
        assert_eq!(band.tsql_freq, 8);
        assert_eq!(band.duplex, Duplex::Plus);
        assert_eq!(band.mode, Mode::Wfm);
        assert_eq!(band.tone_mode, ToneMode::Tsql);
        assert!(band.vsc);
        assert_eq!(band.polarity, Polarity::Reverse);
        assert!(!band.af_filter);
        assert!(band.attenuator);
        assert_eq!(band.canceller_freq, 0x08E8);
    }
}

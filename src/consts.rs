// Device constants - record counts, lookup tables, character sets

/// Number of regular memory channels
pub const NUM_CHANNELS: usize = 1300;

/// Number of autowrite scan channels (read-only storage)
pub const NUM_AUTOWRITE_CHANNELS: usize = 200;

/// Number of memory banks
pub const NUM_BANKS: usize = 22;

/// Number of programmable scan edges
pub const NUM_SCAN_EDGES: usize = 25;

/// Number of scan links
pub const NUM_SCAN_LINKS: usize = 10;

/// Number of per-band default records
pub const NUM_BANDS: usize = 13;

/// Channel/scan-edge name length in characters
pub const NAME_LEN: usize = 6;

/// Packed channel name length in bytes (6 glyphs of 6 bits + 4-bit pad)
pub const ENCODED_NAME_LEN: usize = 5;

/// Bank field sentinel meaning "channel not assigned to any bank"
pub const BANK_NOT_SET: u8 = 31;

/// Bank position sentinel written alongside [`BANK_NOT_SET`]
pub const BANK_POS_NOT_SET: u8 = 255;

/// Lowest tunable frequency in Hz
pub const MIN_FREQUENCY: u64 = 100_000;

/// Highest tunable frequency in Hz
pub const MAX_FREQUENCY: u64 = 1_309_995_000;

/// Largest storable duplex offset in Hz
pub const MAX_OFFSET: u64 = 159_995_000;

/// Top of the AM broadcast band in Hz; the 9 kHz grid is only preferred for
/// frequencies at or below it
pub const MAX_9K_STEP_FREQUENCY: u64 = 1_620_000;

/// Single-letter bank labels, in storage order
pub const BANK_NAMES: &str = "ABCDEFGHIJKLMNOPQRTUWY";

/// Tuning steps indexed by the 4-bit step field
pub const STEPS: [&str; 16] = [
    "5", "6.25", "8.333333", "9", "10", "12.5", "15", "20", "25", "30", "50", "100", "125", "200",
    "Auto", "-",
];

/// Scan edge modes indexed by the 4-bit edge mode field (values above 4 are
/// undocumented)
pub const SCAN_EDGE_MODES: [&str; 5] = ["FM", "WFM", "AM", "Auto", "-"];

/// Attenuator settings for scan edges
pub const ATTENUATOR: [&str; 3] = ["Off", "On", "-"];

/// Canceller modes (US models only)
pub const CANCELLER: [&str; 4] = ["Off", "Train1", "Train2", "MSK"];

/// 50 standard CTCSS tones (in Hz), indexed by the 6-bit tsql field
pub const CTCSS_TONES: [f32; 50] = [
    67.0, 69.3, 71.9, 74.4, 77.0, 79.7, 82.5, 85.4, 88.5, 91.5, 94.8, 97.4, 100.0, 103.5, 107.2,
    110.9, 114.8, 118.8, 123.0, 127.3, 131.8, 136.5, 141.3, 146.2, 151.4, 156.7, 159.8, 162.2,
    165.5, 167.9, 171.3, 173.8, 177.3, 179.9, 183.5, 186.2, 189.9, 192.8, 196.6, 199.5, 203.5,
    206.5, 210.7, 218.1, 225.7, 229.1, 233.6, 241.8, 250.3, 254.1,
];

/// 104 standard DTCS codes, indexed by the 7-bit dtcs field
pub const DTCS_CODES: [u16; 104] = [
    23, 25, 26, 31, 32, 43, 47, 51, 53, 54, 65, 71, 72, 73, 74, 114, 115, 116, 122, 125, 131, 132,
    134, 143, 152, 155, 156, 162, 165, 172, 174, 205, 212, 223, 225, 226, 243, 244, 245, 246, 251,
    252, 261, 263, 265, 266, 271, 306, 311, 315, 325, 331, 343, 346, 351, 364, 365, 371, 411, 412,
    413, 423, 425, 431, 432, 445, 446, 452, 455, 464, 465, 466, 503, 506, 516, 521, 525, 532, 546,
    552, 564, 565, 606, 612, 624, 627, 631, 632, 645, 652, 654, 662, 664, 703, 712, 723, 725, 726,
    731, 732, 734, 743, 754, 0,
];

/// 6-bit name alphabet, indexed by glyph code; `^` marks codes with no
/// assigned glyph
pub const CODED_CHRS: &str =
    " ^^^^^^^()*+^-./0123456789:^^=^^^ABCDEFGHIJKLMNOPQRSTUVWXYZ^^^^^";

/// Characters accepted in channel names
pub const VALID_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789()*+-./:= ";

/// CTCSS tone for a raw tsql index, if documented
pub fn ctcss_tone(index: u8) -> Option<f32> {
    CTCSS_TONES.get(index as usize).copied()
}

/// DTCS code for a raw dtcs index, if documented
pub fn dtcs_code(index: u8) -> Option<u16> {
    match DTCS_CODES.get(index as usize) {
        Some(0) | None => None,
        Some(code) => Some(*code),
    }
}

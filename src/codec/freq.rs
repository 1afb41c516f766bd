// Frequency transcoder: Hz <-> packed (mantissa, multiplier selector)
// Pure functions, independent of the rest of the codec

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_9K_STEP_FREQUENCY;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FreqError {
    #[error("Frequency {hz} Hz cannot be represented in a 24-bit mantissa")]
    FrequencyOutOfRange { hz: u64 },
}

pub type Result<T> = std::result::Result<T, FreqError>;

/// Largest mantissa the packed representation can hold
const MAX_MANTISSA: u64 = 0xFF_FFFF;

/// Frequency multiplier selected by a 2-bit field.
///
/// The 8333.333... Hz step is the repeating fraction 25000/3; all arithmetic
/// is done on the (numerator, denominator) pair so re-encoding a decoded
/// value reproduces the original mantissa exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplier {
    /// 5 kHz
    Step5k,
    /// 6.25 kHz
    Step6k25,
    /// 8.3333... kHz (25000/3 Hz)
    Step8k33,
    /// 9 kHz
    Step9k,
}

impl Multiplier {
    /// All candidates, in ascending divisor order
    pub const ALL: [Multiplier; 4] = [
        Multiplier::Step5k,
        Multiplier::Step6k25,
        Multiplier::Step8k33,
        Multiplier::Step9k,
    ];

    pub fn from_raw(raw: u8) -> Self {
        match raw & 0b11 {
            0 => Multiplier::Step5k,
            1 => Multiplier::Step6k25,
            2 => Multiplier::Step8k33,
            _ => Multiplier::Step9k,
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            Multiplier::Step5k => 0,
            Multiplier::Step6k25 => 1,
            Multiplier::Step8k33 => 2,
            Multiplier::Step9k => 3,
        }
    }

    /// Hz-per-unit as an exact rational
    fn ratio(self) -> (u64, u64) {
        match self {
            Multiplier::Step5k => (5000, 1),
            Multiplier::Step6k25 => (6250, 1),
            Multiplier::Step8k33 => (25000, 3),
            Multiplier::Step9k => (9000, 1),
        }
    }

    /// Divisor scaled by 3, an integer for all candidates; used for ordering
    fn divisor_x3(self) -> u64 {
        let (num, den) = self.ratio();
        num * 3 / den
    }

    /// Does `hz` sit exactly on this multiplier's grid?
    pub fn divides(self, hz: u64) -> bool {
        let (num, den) = self.ratio();
        (hz * den) % num == 0
    }
}

/// Decode a packed mantissa into Hz.
///
/// For the 25000/3 step the result is floored, matching the radio's own
/// arithmetic; the error is below 1 Hz and [`encode_freq_hinted`] recovers
/// the original mantissa.
pub fn decode_freq(mantissa: u32, multiplier: Multiplier) -> u64 {
    let (num, den) = multiplier.ratio();
    u64::from(mantissa) * num / den
}

/// Result of multiplier selection for a frequency/offset pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedFreq {
    pub freq_mult: Multiplier,
    pub offset_mult: Multiplier,
    pub freq_mantissa: u32,
    pub offset_mantissa: u32,
}

impl EncodedFreq {
    /// The 4-bit selector field: offset selector in the high pair,
    /// frequency selector in the low pair
    pub fn selector_nibble(&self) -> u8 {
        (self.offset_mult.raw() << 2) | self.freq_mult.raw()
    }
}

/// Nearest mantissa for `hz` under `m`, plus the rounding error scaled by 3
/// (a common integer scale across all candidates)
fn nearest(hz: u64, m: Multiplier) -> (u64, u64) {
    let (num, den) = m.ratio();
    let mantissa = (hz * den + num / 2) / num;
    let err_x_den = (hz * den).abs_diff(mantissa * num);
    let err_x3 = err_x_den * 3 / den;
    (mantissa, err_x3)
}

/// Pick the candidate with the smallest rounding error for `hz`, ties going
/// to the smallest divisor. An exactly dividing candidate has zero error, so
/// this degenerates to "smallest exact divisor" whenever one exists.
fn select_single(hz: u64, candidates: &[Multiplier]) -> Multiplier {
    debug_assert!(!candidates.is_empty());
    let mut best = candidates[0];
    let mut best_key = {
        let (_, err) = nearest(hz, best);
        (err, best.divisor_x3())
    };
    for &cand in &candidates[1..] {
        let (_, err) = nearest(hz, cand);
        let key = (err, cand.divisor_x3());
        if key < best_key {
            best = cand;
            best_key = key;
        }
    }
    best
}

fn checked_mantissa(hz: u64, m: Multiplier) -> Result<u32> {
    let (mantissa, _) = nearest(hz, m);
    if mantissa > MAX_MANTISSA {
        return Err(FreqError::FrequencyOutOfRange { hz });
    }
    Ok(mantissa as u32)
}

/// Select multipliers and mantissas for a frequency and duplex offset,
/// considering all four step candidates
pub fn encode_freq(freq_hz: u64, offset_hz: u64) -> Result<EncodedFreq> {
    encode_freq_with(freq_hz, offset_hz, &Multiplier::ALL)
}

/// [`encode_freq`] restricted to a caller-supplied candidate set (air-band
/// tuning, for example, only uses the 8333.333 and 9000 Hz grids).
///
/// With a zero offset the offset selector is forced equal to the frequency
/// selector. With a non-zero offset a divisor dividing both values exactly
/// is preferred - 9000 Hz first when the frequency sits in the AM broadcast
/// band (at or below [`MAX_9K_STEP_FREQUENCY`]), then the smallest - and
/// only if none exists are the two values rounded independently.
pub fn encode_freq_with(
    freq_hz: u64,
    offset_hz: u64,
    candidates: &[Multiplier],
) -> Result<EncodedFreq> {
    if offset_hz == 0 {
        let m = select_single(freq_hz, candidates);
        return Ok(EncodedFreq {
            freq_mult: m,
            offset_mult: m,
            freq_mantissa: checked_mantissa(freq_hz, m)?,
            offset_mantissa: 0,
        });
    }

    let common: Vec<Multiplier> = candidates
        .iter()
        .copied()
        .filter(|m| m.divides(freq_hz) && m.divides(offset_hz))
        .collect();

    // the firmware only keeps AM broadcast frequencies on the 9 kHz grid
    let picked = if common.contains(&Multiplier::Step9k) && freq_hz <= MAX_9K_STEP_FREQUENCY {
        Some(Multiplier::Step9k)
    } else {
        common.iter().copied().min_by_key(|m| m.divisor_x3())
    };

    if let Some(m) = picked {
        return Ok(EncodedFreq {
            freq_mult: m,
            offset_mult: m,
            freq_mantissa: checked_mantissa(freq_hz, m)?,
            offset_mantissa: checked_mantissa(offset_hz, m)?,
        });
    }

    // no shared grid: round each value onto its own best grid
    let fm = select_single(freq_hz, candidates);
    let om = select_single(offset_hz, candidates);
    Ok(EncodedFreq {
        freq_mult: fm,
        offset_mult: om,
        freq_mantissa: checked_mantissa(freq_hz, fm)?,
        offset_mantissa: checked_mantissa(offset_hz, om)?,
    })
}

/// Re-encode using previously decoded selectors when they still represent
/// the values exactly, falling back to fresh selection otherwise.
///
/// Channel records keep their selectors across a decode/encode cycle this
/// way, so an untouched channel re-encodes byte-for-byte.
pub fn encode_freq_hinted(
    freq_hz: u64,
    offset_hz: u64,
    freq_mult: Multiplier,
    offset_mult: Multiplier,
) -> Result<EncodedFreq> {
    let (fm_mant, _) = nearest(freq_hz, freq_mult);
    let (om_mant, _) = nearest(offset_hz, offset_mult);

    let freq_ok = fm_mant <= MAX_MANTISSA && decode_freq(fm_mant as u32, freq_mult) == freq_hz;
    let offset_ok =
        om_mant <= MAX_MANTISSA && decode_freq(om_mant as u32, offset_mult) == offset_hz;

    if freq_ok && offset_ok {
        return Ok(EncodedFreq {
            freq_mult,
            offset_mult,
            freq_mantissa: fm_mant as u32,
            offset_mantissa: om_mant as u32,
        });
    }

    encode_freq(freq_hz, offset_hz)
}

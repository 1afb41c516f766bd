// 6-bit packed name alphabet
// Six glyphs and a zero pad nibble fit in five bytes

use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

use crate::bitwise::{BitCursor, BitCursorMut};
use crate::consts::{CODED_CHRS, ENCODED_NAME_LEN, NAME_LEN};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Glyph code {code:#04x} has no assigned character")]
    InvalidCharacterCode { code: u8 },

    #[error("Character {ch:?} cannot be encoded")]
    UnsupportedCharacter { ch: char },

    #[error("Name is {len} characters, at most {NAME_LEN} fit")]
    NameTooLong { len: usize },
}

pub type Result<T> = std::result::Result<T, NameError>;

lazy_static! {
    /// Reverse index of [`CODED_CHRS`]: character -> 6-bit glyph code
    static ref CHR_CODES: HashMap<char, u8> = CODED_CHRS
        .chars()
        .enumerate()
        .filter(|&(_, c)| c != '^')
        .map(|(code, c)| (c, code as u8))
        .collect();
}

/// Unpack a 5-byte name field into a string, trailing spaces trimmed.
///
/// Any glyph code with no assigned character is an error; callers decide
/// whether that is fatal or worth substituting an empty name.
pub fn decode_name(packed: &[u8; ENCODED_NAME_LEN]) -> Result<String> {
    let mut cur = BitCursor::new(packed);
    // pad nibble, then six glyphs; the cursor cannot run out here
    let _ = cur.read_bits(4);
    let mut name = String::with_capacity(NAME_LEN);
    for _ in 0..NAME_LEN {
        let code = cur.read_bits(6).unwrap_or(0) as u8;
        match CODED_CHRS.as_bytes().get(code as usize) {
            Some(&b) if b != b'^' => name.push(b as char),
            _ => return Err(NameError::InvalidCharacterCode { code }),
        }
    }
    Ok(name.trim_end().to_string())
}

/// Pack a name into the 5-byte field, space-padded to six glyphs.
///
/// Lowercase ASCII is folded to uppercase first; anything outside the
/// alphabet is rejected.
pub fn encode_name(name: &str) -> Result<[u8; ENCODED_NAME_LEN]> {
    if name.chars().count() > NAME_LEN {
        return Err(NameError::NameTooLong { len: name.chars().count() });
    }

    let mut packed = [0u8; ENCODED_NAME_LEN];
    let mut cur = BitCursorMut::new(&mut packed);
    let _ = cur.write_bits(4, 0);
    let mut written = 0;
    for ch in name.chars() {
        let upper = ch.to_ascii_uppercase();
        let code = CHR_CODES
            .get(&upper)
            .copied()
            .ok_or(NameError::UnsupportedCharacter { ch })?;
        let _ = cur.write_bits(6, u32::from(code));
        written += 1;
    }
    let space = CHR_CODES[&' '];
    for _ in written..NAME_LEN {
        let _ = cur.write_bits(6, u32::from(space));
    }
    Ok(packed)
}

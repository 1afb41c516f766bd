// Bit-level read/write head over a byte buffer
// All sub-byte fields in the clone image are packed most-significant-bit first

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("Read/write past end of buffer: wanted {wanted} bits, {available} available")]
    OutOfRange { wanted: usize, available: usize },

    #[error("Value {value:#x} does not fit in {width} bits")]
    ValueTooWide { value: u32, width: u32 },

    #[error("Byte-width access at unaligned bit offset {bit}")]
    Unaligned { bit: u32 },
}

pub type Result<T> = std::result::Result<T, CursorError>;

/// Read head positioned over a byte slice at sub-byte granularity.
///
/// Bits are consumed most-significant-first within each byte; reads advance
/// across byte boundaries transparently. Multi-byte integers are byte-aligned
/// and carry their endianness in the method name - the clone image mixes
/// little-endian mantissas with big-endian bitmap words in the same record
/// set, so no global byte order exists.
#[derive(Debug)]
pub struct BitCursor<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u32,
}

impl<'a> BitCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, byte: 0, bit: 0 }
    }

    /// Bits left between the head and the end of the slice
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte) * 8 - self.bit as usize
    }

    /// Current position as (byte, bit-within-byte)
    pub fn position(&self) -> (usize, u32) {
        (self.byte, self.bit)
    }

    fn check(&self, bits: usize) -> Result<()> {
        if bits > self.remaining_bits() {
            return Err(CursorError::OutOfRange {
                wanted: bits,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    fn check_aligned(&self) -> Result<()> {
        if self.bit != 0 {
            return Err(CursorError::Unaligned { bit: self.bit });
        }
        Ok(())
    }

    /// Read `n` bits (1-32) as an unsigned integer, MSB-first
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!((1..=32).contains(&n));
        self.check(n as usize)?;

        let mut value: u32 = 0;
        let mut left = n;
        while left > 0 {
            let avail = 8 - self.bit;
            let take = left.min(avail);
            let shift = avail - take;
            let mask = if take == 8 { 0xFF } else { (1u8 << take) - 1 };
            let bits = (self.data[self.byte] >> shift) & mask;
            value = (value << take) | u32::from(bits);

            self.bit += take;
            if self.bit == 8 {
                self.bit = 0;
                self.byte += 1;
            }
            left -= take;
        }
        Ok(value)
    }

    /// Advance over `n` bits without decoding them
    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.check(n)?;
        let pos = self.byte * 8 + self.bit as usize + n;
        self.byte = pos / 8;
        self.bit = (pos % 8) as u32;
        Ok(())
    }

    /// Advance to the next byte boundary (no-op when already aligned)
    pub fn align_to_byte(&mut self) {
        if self.bit != 0 {
            self.bit = 0;
            self.byte += 1;
        }
    }

    /// Read `n` byte-aligned bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check_aligned()?;
        self.check(n * 8)?;
        let slice = &self.data[self.byte..self.byte + n];
        self.byte += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u16_be(&mut self) -> Result<u16> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u24_le(&mut self) -> Result<u32> {
        let b = self.read_bytes(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u32_be(&mut self) -> Result<u32> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Write head mirroring [`BitCursor`].
///
/// `write_bits` replaces exactly the addressed bits and leaves the rest of
/// the byte untouched, so encoders may interleave fresh fields with
/// previously seeded reserved bits.
#[derive(Debug)]
pub struct BitCursorMut<'a> {
    data: &'a mut [u8],
    byte: usize,
    bit: u32,
}

impl<'a> BitCursorMut<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, byte: 0, bit: 0 }
    }

    pub fn remaining_bits(&self) -> usize {
        (self.data.len() - self.byte) * 8 - self.bit as usize
    }

    pub fn position(&self) -> (usize, u32) {
        (self.byte, self.bit)
    }

    fn check(&self, bits: usize) -> Result<()> {
        if bits > self.remaining_bits() {
            return Err(CursorError::OutOfRange {
                wanted: bits,
                available: self.remaining_bits(),
            });
        }
        Ok(())
    }

    fn check_aligned(&self) -> Result<()> {
        if self.bit != 0 {
            return Err(CursorError::Unaligned { bit: self.bit });
        }
        Ok(())
    }

    /// Write the low `n` bits (1-32) of `value`, MSB-first
    pub fn write_bits(&mut self, n: u32, value: u32) -> Result<()> {
        debug_assert!((1..=32).contains(&n));
        if n < 32 && value >= (1u32 << n) {
            return Err(CursorError::ValueTooWide { value, width: n });
        }
        self.check(n as usize)?;

        let mut left = n;
        while left > 0 {
            let avail = 8 - self.bit;
            let take = left.min(avail);
            let shift = avail - take;
            let mask = if take == 8 { 0xFF } else { ((1u8 << take) - 1) << shift };
            let bits = ((value >> (left - take)) as u8) << shift;
            self.data[self.byte] = (self.data[self.byte] & !mask) | (bits & mask);

            self.bit += take;
            if self.bit == 8 {
                self.bit = 0;
                self.byte += 1;
            }
            left -= take;
        }
        Ok(())
    }

    /// Advance over `n` bits, leaving them as seeded
    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.check(n)?;
        let pos = self.byte * 8 + self.bit as usize + n;
        self.byte = pos / 8;
        self.bit = (pos % 8) as u32;
        Ok(())
    }

    /// Advance to the next byte boundary (no-op when already aligned)
    pub fn align_to_byte(&mut self) {
        if self.bit != 0 {
            self.bit = 0;
            self.byte += 1;
        }
    }

    /// Write byte-aligned bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_aligned()?;
        self.check(bytes.len() * 8)?;
        self.data[self.byte..self.byte + bytes.len()].copy_from_slice(bytes);
        self.byte += bytes.len();
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_u16_le(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u24_le(&mut self, value: u32) -> Result<()> {
        let b = value.to_le_bytes();
        self.write_bytes(&[b[0], b[1], b[2]])
    }

    pub fn write_u32_le(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u32_be(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_bits_msb_first() {
        let data = [0b1011_0010, 0b0100_0000];
        let mut cur = BitCursor::new(&data);
        assert_eq!(cur.read_bits(1).unwrap(), 1);
        assert_eq!(cur.read_bits(3).unwrap(), 0b011);
        assert_eq!(cur.read_bits(4).unwrap(), 0b0010);
        assert_eq!(cur.read_bits(2).unwrap(), 0b01);
        assert_eq!(cur.remaining_bits(), 6);
    }

    #[test]
    fn test_read_bits_across_byte_boundary() {
        let data = [0b0000_0101, 0b1010_0000];
        let mut cur = BitCursor::new(&data);
        cur.skip_bits(5).unwrap();
        // 6-bit field straddling the boundary: 101 | 101
        assert_eq!(cur.read_bits(6).unwrap(), 0b101101);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0xFF];
        let mut cur = BitCursor::new(&data);
        cur.read_bits(6).unwrap();
        assert_eq!(
            cur.read_bits(3),
            Err(CursorError::OutOfRange { wanted: 3, available: 2 })
        );
    }

    #[test]
    fn test_integers_mixed_endianness() {
        let data = [0x34, 0x12, 0xAB, 0xCD, 0x01, 0x02, 0x03];
        let mut cur = BitCursor::new(&data);
        assert_eq!(cur.read_u16_le().unwrap(), 0x1234);
        assert_eq!(cur.read_u16_be().unwrap(), 0xABCD);
        assert_eq!(cur.read_u24_le().unwrap(), 0x030201);
    }

    #[test]
    fn test_unaligned_byte_read_rejected() {
        let data = [0xFF, 0xFF];
        let mut cur = BitCursor::new(&data);
        cur.read_bits(3).unwrap();
        assert_eq!(cur.read_u8(), Err(CursorError::Unaligned { bit: 3 }));
        cur.align_to_byte();
        assert_eq!(cur.read_u8().unwrap(), 0xFF);
    }

    #[test]
    fn test_write_bits() {
        let mut data = [0u8; 2];
        let mut cur = BitCursorMut::new(&mut data);
        cur.write_bits(1, 1).unwrap();
        cur.write_bits(3, 0b011).unwrap();
        cur.write_bits(6, 0b101101).unwrap();
        cur.write_bits(6, 0b000001).unwrap();
        assert_eq!(data, [0b1011_1011, 0b0100_0001]);
    }

    #[test]
    fn test_write_preserves_seeded_bits() {
        let mut data = [0xFF];
        let mut cur = BitCursorMut::new(&mut data);
        cur.skip_bits(2).unwrap();
        cur.write_bits(4, 0).unwrap();
        assert_eq!(data, [0b1100_0011]);
    }

    #[test]
    fn test_write_too_wide() {
        let mut data = [0u8; 2];
        let mut cur = BitCursorMut::new(&mut data);
        assert_eq!(
            cur.write_bits(3, 0b1000),
            Err(CursorError::ValueTooWide { value: 8, width: 3 })
        );
    }

    #[test]
    fn test_roundtrip_u32() {
        let mut data = [0u8; 8];
        {
            let mut wr = BitCursorMut::new(&mut data);
            wr.write_u32_be(0xDEAD_BEEF).unwrap();
            wr.write_u32_le(0xDEAD_BEEF).unwrap();
        }
        let mut rd = BitCursor::new(&data);
        assert_eq!(rd.read_u32_be().unwrap(), 0xDEAD_BEEF);
        assert_eq!(rd.read_u32_le().unwrap(), 0xDEAD_BEEF);
    }
}

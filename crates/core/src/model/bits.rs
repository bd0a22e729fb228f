//! MSB-first bit reader for sampled functions and mesh shadings.

/// Reads big-endian bit fields of 1 to 32 bits.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit: u32,
}

impl<'a> BitReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit: 0,
        }
    }

    /// Reads `n` bits, or `None` once the data runs out.
    pub fn read(&mut self, n: u32) -> Option<u32> {
        debug_assert!(n <= 32);
        let mut value: u64 = 0;
        let mut left = n;
        while left > 0 {
            let byte = *self.data.get(self.pos)?;
            let avail = 8 - self.bit;
            let take = avail.min(left);
            let shift = avail - take;
            let bits = (byte as u32 >> shift) & ((1u32 << take) - 1);
            value = (value << take) | bits as u64;
            left -= take;
            self.bit += take;
            if self.bit == 8 {
                self.bit = 0;
                self.pos += 1;
            }
        }
        Some(value as u32)
    }

    /// Reads `n` bits and maps them linearly onto `[min, max]`.
    pub fn read_scaled(&mut self, n: u32, min: f64, max: f64) -> Option<f64> {
        let raw = self.read(n)? as f64;
        let full = if n >= 32 {
            u32::MAX as f64
        } else {
            ((1u64 << n) - 1) as f64
        };
        Some(min + raw * (max - min) / full)
    }

    /// Skips to the next byte boundary.
    pub fn align(&mut self) {
        if self.bit != 0 {
            self.bit = 0;
            self.pos += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_across_bytes() {
        let mut r = BitReader::new(&[0b1010_1100, 0b0101_0000]);
        assert_eq!(r.read(3), Some(0b101));
        assert_eq!(r.read(7), Some(0b01100_01));
        assert_eq!(r.read(2), Some(0b01));
        r.align();
        assert!(r.is_empty());
        assert_eq!(r.read(1), None);
    }

    #[test]
    fn test_read_wide_fields() {
        let mut r = BitReader::new(&[0x12, 0x34, 0x56, 0x78, 0xff]);
        assert_eq!(r.read(32), Some(0x1234_5678));
        assert_eq!(r.read_scaled(8, 0.0, 1.0), Some(1.0));
    }
}

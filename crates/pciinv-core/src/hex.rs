//! # Hex Formatting
//!
//! Inventory fields are stored as `0x`-prefixed lowercase hex strings whose
//! width is derived from the number of significant bits, never from the
//! storage type. A 24-bit class code is six digits even though it travels in
//! a `u32`.

/// Formats the low `bits` bits of `value` as `0x` + `ceil(bits / 4)` digits.
///
/// `bits` is clamped to `1..=64`.
pub fn to_hex(value: u64, bits: u32) -> String {
    let bits = bits.clamp(1, 64);
    let digits = bits.div_ceil(4) as usize;
    let masked = if bits == 64 {
        value
    } else {
        value & ((1u64 << bits) - 1)
    };
    format!("0x{masked:0digits$x}")
}

/// Formats a full `u8` (two digits).
pub fn hex8(value: u8) -> String {
    to_hex(u64::from(value), 8)
}

/// Formats a full `u16` (four digits).
pub fn hex16(value: u16) -> String {
    to_hex(u64::from(value), 16)
}

/// Formats a 24-bit quantity stored in a `u32` (six digits).
pub fn hex24(value: u32) -> String {
    to_hex(u64::from(value), 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_widths() {
        assert_eq!(hex8(0x03), "0x03");
        assert_eq!(hex16(0x8086), "0x8086");
        assert_eq!(hex16(0xA1B2), "0xa1b2");
        assert_eq!(hex16(0), "0x0000");
        assert_eq!(hex24(0x060100), "0x060100");
    }

    #[test]
    fn test_masks_insignificant_bits() {
        assert_eq!(hex24(0xff06_0100), "0x060100");
        assert_eq!(to_hex(0x1f, 4), "0xf");
    }

    #[test]
    fn test_partial_nibble_rounds_up() {
        // 3 significant bits still need a whole digit
        assert_eq!(to_hex(0x7, 3), "0x7");
        assert_eq!(to_hex(0x1ff, 9), "0x1ff");
    }

    #[test]
    fn test_bits_are_clamped() {
        assert_eq!(to_hex(u64::MAX, 64), "0xffffffffffffffff");
        assert_eq!(to_hex(u64::MAX, 100), "0xffffffffffffffff");
        assert_eq!(to_hex(1, 0), "0x1");
    }
}

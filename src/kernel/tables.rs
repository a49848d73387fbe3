//! Read-only lookup tables shared by the SIMD kernels.
//!
//! The three UTF-8 classification tables follow the lookup algorithm of
//! Keiser and Lemire ("Validating UTF-8 In Less Than One Instruction Per
//! Byte", 2021). The shuffle tables are generated at compile time.

#![cfg_attr(not(any(target_arch = "x86_64", target_arch = "aarch64")), allow(dead_code))]

// =============================================================================
// UTF-8 validation
// =============================================================================

/// `11______ 0_______` or `11______ 11______`
pub const TOO_SHORT: u8 = 1 << 0;
/// `0_______ 10______`
pub const TOO_LONG: u8 = 1 << 1;
/// `11100000 100_____`
pub const OVERLONG_3: u8 = 1 << 2;
/// `11110100 1001____`, `11110100 101_____`, `11110101 ________` and above
pub const TOO_LARGE: u8 = 1 << 3;
/// `11101101 101_____`
pub const SURROGATE: u8 = 1 << 4;
/// `1100000_ 10______`
pub const OVERLONG_2: u8 = 1 << 5;
/// `11110101 1000____` and above
pub const TOO_LARGE_1000: u8 = 1 << 6;
/// `11110000 1000____`
pub const OVERLONG_4: u8 = 1 << 6;
/// `10______ 10______`
pub const TWO_CONTS: u8 = 1 << 7;

const CARRY: u8 = TOO_SHORT | TOO_LONG | TWO_CONTS;

/// Indexed by the high nibble of the previous byte.
pub static BYTE_1_HIGH: [u8; 16] = [
    // 0_______ ________ ASCII
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    TOO_LONG,
    // 10______ ________ continuation
    TWO_CONTS,
    TWO_CONTS,
    TWO_CONTS,
    TWO_CONTS,
    // 1100____ ________
    TOO_SHORT | OVERLONG_2,
    // 1101____ ________
    TOO_SHORT,
    // 1110____ ________
    TOO_SHORT | OVERLONG_3 | SURROGATE,
    // 1111____ ________
    TOO_SHORT | TOO_LARGE | TOO_LARGE_1000 | OVERLONG_4,
];

/// Indexed by the low nibble of the previous byte.
pub static BYTE_1_LOW: [u8; 16] = [
    // ____0000 ________
    CARRY | OVERLONG_3 | OVERLONG_2 | OVERLONG_4,
    // ____0001 ________
    CARRY | OVERLONG_2,
    // ____001_ ________
    CARRY,
    CARRY,
    // ____0100 ________
    CARRY | TOO_LARGE,
    // ____0101 ________
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    // ____011_ ________
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    // ____1___ ________
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    // ____1101 ________
    CARRY | TOO_LARGE | TOO_LARGE_1000 | SURROGATE,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
    CARRY | TOO_LARGE | TOO_LARGE_1000,
];

/// Indexed by the high nibble of the current byte.
pub static BYTE_2_HIGH: [u8; 16] = [
    // ________ 0_______
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    // ________ 1000____
    TOO_LONG | OVERLONG_2 | TWO_CONTS | OVERLONG_3 | TOO_LARGE_1000 | OVERLONG_4,
    // ________ 1001____
    TOO_LONG | OVERLONG_2 | TWO_CONTS | OVERLONG_3 | TOO_LARGE,
    // ________ 101_____
    TOO_LONG | OVERLONG_2 | TWO_CONTS | SURROGATE | TOO_LARGE,
    TOO_LONG | OVERLONG_2 | TWO_CONTS | SURROGATE | TOO_LARGE,
    // ________ 11______
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
    TOO_SHORT,
];

/// Saturating-subtract thresholds flagging a sequence cut off by the end of
/// a block. Kernels load the last `width` bytes.
pub static INCOMPLETE_MAX: [u8; 64] = {
    let mut t = [0xFF; 64];
    t[61] = 0xF0 - 1;
    t[62] = 0xE0 - 1;
    t[63] = 0xC0 - 1;
    t
};

// =============================================================================
// Shuffles
// =============================================================================

/// Byte swap within each 16-bit unit.
pub static SWAP_BYTES_16: [u8; 16] = [1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14];

/// Gathers bytes `i..i + 4` into `u32` lane `i`, for four lanes. Decoders
/// read each lane's leading byte and up to three continuation bytes from it.
pub static UTF8_WINDOWS: [u8; 16] = [0, 1, 2, 3, 1, 2, 3, 4, 2, 3, 4, 5, 3, 4, 5, 6];

/// [`UTF8_WINDOWS`] for sixteen lanes, as a full-width byte permutation.
pub static UTF8_WINDOWS_X16: [u8; 64] = {
    let mut t = [0u8; 64];
    let mut lane = 0;
    while lane < 16 {
        let mut b = 0;
        while b < 4 {
            t[lane * 4 + b] = (lane + b) as u8;
            b += 1;
        }
        lane += 1;
    }
    t
};

/// Widen a 4-bit mask so bit `i` lands on bit `2 * i`.
pub static SPREAD_4: [u8; 16] = {
    let mut t = [0u8; 16];
    let mut m = 0;
    while m < 16 {
        let mut v = 0u8;
        let mut i = 0;
        while i < 4 {
            if m & (1 << i) != 0 {
                v |= 1 << (2 * i);
            }
            i += 1;
        }
        t[m] = v;
        m += 1;
    }
    t
};

/// Byte shuffle moving the `u32` lanes selected by a 4-bit mask to the front.
pub static COMPRESS_32X4: [[u8; 16]; 16] = {
    let mut t = [[0x80u8; 16]; 16];
    let mut m = 0;
    while m < 16 {
        let mut out = 0;
        let mut lane = 0;
        while lane < 4 {
            if m & (1 << lane) != 0 {
                let mut b = 0;
                while b < 4 {
                    t[m][out * 4 + b] = (lane * 4 + b) as u8;
                    b += 1;
                }
                out += 1;
            }
            lane += 1;
        }
        m += 1;
    }
    t
};

/// Lane permutation moving the `u32` lanes selected by an 8-bit mask to the
/// front, for `vpermd`.
pub static COMPRESS_32X8: [[u32; 8]; 256] = {
    let mut t = [[0u32; 8]; 256];
    let mut m = 0;
    while m < 256 {
        let mut out = 0;
        let mut lane = 0;
        while lane < 8 {
            if m & (1 << lane) != 0 {
                t[m][out] = lane as u32;
                out += 1;
            }
            lane += 1;
        }
        m += 1;
    }
    t
};

/// Byte shuffle moving the `u16` slots selected by an 8-bit mask to the
/// front. Each `u32` lane holds one or two UTF-16 units; slot `2 * i` is
/// the first unit of lane `i` and slot `2 * i + 1` the second.
pub static COMPRESS_16X8: [[u8; 16]; 256] = {
    let mut t = [[0x80u8; 16]; 256];
    let mut m = 0;
    while m < 256 {
        let mut out = 0;
        let mut slot = 0;
        while slot < 8 {
            if m & (1 << slot) != 0 {
                t[m][out * 2] = (slot * 2) as u8;
                t[m][out * 2 + 1] = (slot * 2 + 1) as u8;
                out += 1;
            }
            slot += 1;
        }
        m += 1;
    }
    t
};

/// Byte shuffle packing four `u32` lanes of UTF-8 bytes. The key holds two
/// bits per lane: the lane's encoded length minus one.
pub static PACK_UTF8: [[u8; 16]; 256] = {
    let mut t = [[0x80u8; 16]; 256];
    let mut key = 0;
    while key < 256 {
        let mut out = 0;
        let mut lane = 0;
        while lane < 4 {
            let len = ((key >> (2 * lane)) & 3) + 1;
            let mut b = 0;
            while b < len {
                t[key][out] = (lane * 4 + b) as u8;
                out += 1;
                b += 1;
            }
            lane += 1;
        }
        key += 1;
    }
    t
};

/// Total bytes produced by [`PACK_UTF8`] for each key.
pub static PACK_UTF8_LEN: [u8; 256] = {
    let mut t = [0u8; 256];
    let mut key = 0;
    while key < 256 {
        let mut lane = 0;
        let mut total = 0;
        while lane < 4 {
            total += ((key >> (2 * lane)) & 3) + 1;
            lane += 1;
        }
        t[key] = total as u8;
        key += 1;
    }
    t
};

/// Key for [`PACK_UTF8`] from the lane masks `cp > 0x7F`, `cp > 0x7FF` and
/// `cp > 0xFFFF`, each one bit per lane.
#[inline(always)]
pub fn utf8_pack_key(gt_7f: u32, gt_7ff: u32, gt_ffff: u32) -> usize {
    let low = SPREAD_4[((gt_7f ^ gt_7ff ^ gt_ffff) & 0xF) as usize];
    let high = SPREAD_4[(gt_7ff & 0xF) as usize];
    (low | (high << 1)) as usize
}

/// Slot mask for [`COMPRESS_16X8`]: first unit of every `present` lane and
/// second unit of every `pair` lane.
#[inline(always)]
pub fn utf16_slot_mask(present: u32, pair: u32) -> usize {
    let first = SPREAD_4[(present & 0xF) as usize];
    let second = SPREAD_4[(pair & 0xF) as usize];
    (first | (second << 1)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spread() {
        assert_eq!(SPREAD_4[0b0000], 0b0000_0000);
        assert_eq!(SPREAD_4[0b0001], 0b0000_0001);
        assert_eq!(SPREAD_4[0b0010], 0b0000_0100);
        assert_eq!(SPREAD_4[0b1111], 0b0101_0101);
    }

    #[test]
    fn compress_32x4() {
        assert_eq!(COMPRESS_32X4[0b0000], [0x80; 16]);
        assert_eq!(
            COMPRESS_32X4[0b1010],
            [
                4, 5, 6, 7, 12, 13, 14, 15, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80,
            ]
        );
    }

    #[test]
    fn compress_32x8() {
        assert_eq!(COMPRESS_32X8[0b1000_0001][..2], [0, 7]);
        assert_eq!(COMPRESS_32X8[0xFF], [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn compress_16x8() {
        // Lane 0 single unit, lane 1 a pair
        let mask = utf16_slot_mask(0b0011, 0b0010);
        assert_eq!(mask, 0b0000_1101);
        assert_eq!(COMPRESS_16X8[mask][..6], [0, 1, 4, 5, 6, 7]);
        assert_eq!(COMPRESS_16X8[mask][6], 0x80);
    }

    #[test]
    fn utf8_pack() {
        // Lengths 1, 2, 3, 4
        let key = utf8_pack_key(0b1110, 0b1100, 0b1000);
        assert_eq!(key, 0b11_10_01_00);
        assert_eq!(PACK_UTF8_LEN[key], 10);
        assert_eq!(
            PACK_UTF8[key][..10],
            [0, 4, 5, 8, 9, 10, 12, 13, 14, 15]
        );
        assert_eq!(PACK_UTF8_LEN[0], 4);
        assert_eq!(PACK_UTF8_LEN[0xFF], 16);
    }

    #[test]
    fn windows_extend_to_sixteen_lanes() {
        assert_eq!(UTF8_WINDOWS_X16[..16], UTF8_WINDOWS);
        assert_eq!(UTF8_WINDOWS_X16[60..], [15, 16, 17, 18]);
    }

    #[test]
    fn incomplete_thresholds() {
        assert_eq!(&INCOMPLETE_MAX[60..], &[0xFF, 0xEF, 0xDF, 0xBF]);
    }
}

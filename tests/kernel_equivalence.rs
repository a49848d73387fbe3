//! Every supported kernel must agree with the scalar kernel on every
//! operation, for valid, corrupted and random inputs up to 1025 units.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use turbo_unicode::kernel::{kernel_by_name, supported_kernels, KernelOps};
use turbo_unicode::TranscodeResult;

const ROUNDS: usize = 300;
const MAX_LEN: usize = 1025;

fn scalar() -> &'static KernelOps {
    kernel_by_name("scalar")
        .and_then(|k| k.ops())
        .expect("scalar kernel is always available")
}

/// Supported kernels other than scalar.
fn simd_kernels() -> Vec<(&'static str, &'static KernelOps)> {
    supported_kernels()
        .filter(|k| k.name() != "scalar")
        .filter_map(|k| k.ops().map(|ops| (k.name(), ops)))
        .collect()
}

// ============================================================================
// Input generators
// ============================================================================

fn random_char(rng: &mut ChaCha8Rng, ascii_bias: u32) -> char {
    let cp = match rng.gen_range(0..100) {
        n if n < ascii_bias => rng.gen_range(0x20..0x7F),
        n if n < ascii_bias + (100 - ascii_bias) / 3 => rng.gen_range(0x80..0x800),
        n if n < ascii_bias + 2 * (100 - ascii_bias) / 3 => rng.gen_range(0x800..0xD800),
        _ => rng.gen_range(0x10000..0x110000),
    };
    char::from_u32(cp).unwrap_or(' ')
}

fn random_text(rng: &mut ChaCha8Rng, max_bytes: usize) -> String {
    let ascii_bias = [0, 50, 90, 100][rng.gen_range(0..4)];
    let mut text = String::new();
    loop {
        let c = random_char(rng, ascii_bias);
        if text.len() + c.len_utf8() > max_bytes {
            return text;
        }
        text.push(c);
    }
}

fn valid_utf8(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.gen_range(0..=MAX_LEN);
    random_text(rng, len).into_bytes()
}

fn corrupted_utf8(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let mut bytes = valid_utf8(rng);
    if bytes.is_empty() {
        bytes.push(0x80);
    }
    for _ in 0..rng.gen_range(1..=3) {
        let at = rng.gen_range(0..bytes.len());
        bytes[at] = rng.gen();
    }
    bytes
}

fn random_bytes(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let len = rng.gen_range(0..=MAX_LEN);
    (0..len).map(|_| rng.gen()).collect()
}

/// Native-order UTF-16 with an occasional planted lone surrogate.
fn utf16_units(rng: &mut ChaCha8Rng, corrupt: bool) -> Vec<u16> {
    let len = rng.gen_range(0..=MAX_LEN);
    let mut units: Vec<u16> = random_text(rng, len * 2).encode_utf16().take(len).collect();
    // `take` may have split a pair
    if units.last().is_some_and(|u| (0xD800..0xDC00).contains(u)) {
        units.pop();
    }
    if corrupt && !units.is_empty() {
        let at = rng.gen_range(0..units.len());
        units[at] = rng.gen_range(0xD800..0xE000);
    }
    units
}

fn utf32_units(rng: &mut ChaCha8Rng, corrupt: bool) -> Vec<u32> {
    let len = rng.gen_range(0..=MAX_LEN);
    let mut units: Vec<u32> = (0..len).map(|_| u32::from(random_char(rng, 60))).collect();
    if corrupt && !units.is_empty() {
        let at = rng.gen_range(0..units.len());
        units[at] = if rng.gen() {
            rng.gen_range(0xD800..0xE000)
        } else {
            rng.gen_range(0x11_0000..=u32::MAX)
        };
    }
    units
}

fn to_le(units: &[u16]) -> Vec<u16> {
    units.iter().map(|u| u.to_le()).collect()
}

fn to_be(units: &[u16]) -> Vec<u16> {
    units.iter().map(|u| u.to_be()).collect()
}

// ============================================================================
// Conversion harness
// ============================================================================

/// Run a `_with_errors` converter on both kernels with a generous output
/// buffer and compare the result and the written output.
fn check_conversion<I, O: Copy + Default + PartialEq + std::fmt::Debug>(
    name: &str,
    what: &str,
    input: &[I],
    capacity: usize,
    run: impl Fn(&KernelOps, &[I], &mut [O]) -> TranscodeResult,
    ops: &KernelOps,
) -> Option<Vec<O>> {
    let mut expected = vec![O::default(); capacity];
    let mut actual = vec![O::default(); capacity];
    let want = run(scalar(), input, &mut expected);
    let got = run(ops, input, &mut actual);
    assert_eq!(got, want, "{name}: {what}");
    if want.is_ok() {
        assert_eq!(
            &actual[..got.count],
            &expected[..want.count],
            "{name}: {what}"
        );
        expected.truncate(want.count);
        Some(expected)
    } else {
        None
    }
}

// ============================================================================
// UTF-8 sources
// ============================================================================

fn check_utf8_source(name: &str, ops: &KernelOps, input: &[u8]) {
    let s = scalar();
    assert_eq!(ops.validate_utf8(input), s.validate_utf8(input), "{name}");
    assert_eq!(
        ops.validate_utf8_with_errors(input),
        s.validate_utf8_with_errors(input),
        "{name}"
    );
    assert_eq!(ops.validate_ascii(input), s.validate_ascii(input), "{name}");
    assert_eq!(
        ops.validate_ascii_with_errors(input),
        s.validate_ascii_with_errors(input),
        "{name}"
    );
    assert_eq!(
        ops.detect_encodings(input),
        s.detect_encodings(input),
        "{name}"
    );

    let valid = s.validate_utf8(input);
    let n = input.len();

    let utf16 = check_conversion(name, "utf8->utf16le", input, n, |k, i, o| {
        k.convert_utf8_to_utf16le_with_errors(i, o)
    }, ops);
    check_conversion(name, "utf8->utf16be", input, n, |k, i, o| {
        k.convert_utf8_to_utf16be_with_errors(i, o)
    }, ops);
    let utf32 = check_conversion(name, "utf8->utf32", input, n, |k, i, o| {
        k.convert_utf8_to_utf32_with_errors(i, o)
    }, ops);

    let mut out16 = vec![0u16; n];
    let mut out32 = vec![0u32; n];
    let written16 = ops.convert_utf8_to_utf16le(input, &mut out16);
    let written32 = ops.convert_utf8_to_utf32(input, &mut out32);

    if !valid {
        assert_eq!(written16, 0, "{name}");
        assert_eq!(written32, 0, "{name}");
        return;
    }

    assert_eq!(ops.count_utf8(input), s.count_utf8(input), "{name}");
    let len16 = ops.utf16_length_from_utf8(input);
    let len32 = ops.utf32_length_from_utf8(input);
    assert_eq!(len16, s.utf16_length_from_utf8(input), "{name}");
    assert_eq!(len32, s.utf32_length_from_utf8(input), "{name}");

    let utf16 = utf16.expect("valid input converts");
    let utf32 = utf32.expect("valid input converts");
    assert_eq!(utf16.len(), len16, "{name}: estimate");
    assert_eq!(utf32.len(), len32, "{name}: estimate");
    assert_eq!(&out16[..written16], &utf16[..], "{name}");
    assert_eq!(&out32[..written32], &utf32[..], "{name}");

    // Exact-size buffers for the unchecked variants
    let mut exact16 = vec![0u16; len16];
    assert_eq!(
        ops.convert_valid_utf8_to_utf16le(input, &mut exact16),
        len16,
        "{name}"
    );
    assert_eq!(exact16, utf16, "{name}");
    let mut exact32 = vec![0u32; len32];
    assert_eq!(
        ops.convert_valid_utf8_to_utf32(input, &mut exact32),
        len32,
        "{name}"
    );
    assert_eq!(exact32, utf32, "{name}");
    let mut exact16be = vec![0u16; len16];
    assert_eq!(
        ops.convert_valid_utf8_to_utf16be(input, &mut exact16be),
        len16,
        "{name}"
    );
    let swapped: Vec<u16> = utf16.iter().map(|u| u.swap_bytes()).collect();
    assert_eq!(exact16be, swapped, "{name}");
}

#[test]
fn test_utf8_sources_match_scalar() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_0008);
    for (name, ops) in simd_kernels() {
        for _ in 0..ROUNDS {
            check_utf8_source(name, ops, &valid_utf8(&mut rng));
            check_utf8_source(name, ops, &corrupted_utf8(&mut rng));
            check_utf8_source(name, ops, &random_bytes(&mut rng));
        }
    }
}

#[test]
fn test_utf8_every_length_near_vector_boundaries() {
    let text = "aé€😀".repeat(64);
    let bytes = text.as_bytes();
    for (name, ops) in simd_kernels() {
        for len in 0..=bytes.len().min(200) {
            check_utf8_source(name, ops, &bytes[..len]);
        }
    }
}

// ============================================================================
// UTF-16 sources
// ============================================================================

fn check_utf16_source(name: &str, ops: &KernelOps, native: &[u16]) {
    let s = scalar();
    let le = to_le(native);
    let be = to_be(native);
    let n = native.len();

    for (input, big) in [(&le, false), (&be, true)] {
        let input = input.as_slice();
        let validate = |k: &KernelOps| {
            if big {
                (k.validate_utf16be(input), k.validate_utf16be_with_errors(input))
            } else {
                (k.validate_utf16le(input), k.validate_utf16le_with_errors(input))
            }
        };
        let (valid, result) = validate(s);
        assert_eq!(validate(ops), (valid, result), "{name} big={big}");

        let utf8 = check_conversion(name, "utf16->utf8", input, 3 * n, |k, i, o| {
            if big {
                k.convert_utf16be_to_utf8_with_errors(i, o)
            } else {
                k.convert_utf16le_to_utf8_with_errors(i, o)
            }
        }, ops);
        let utf32 = check_conversion(name, "utf16->utf32", input, n, |k, i, o| {
            if big {
                k.convert_utf16be_to_utf32_with_errors(i, o)
            } else {
                k.convert_utf16le_to_utf32_with_errors(i, o)
            }
        }, ops);

        let mut swapped = vec![0u16; n];
        ops.change_endianness_utf16(input, &mut swapped);
        assert_eq!(swapped, if big { le.clone() } else { be.clone() }, "{name}");

        if !valid {
            let mut out = vec![0u8; 3 * n];
            let written = if big {
                ops.convert_utf16be_to_utf8(input, &mut out)
            } else {
                ops.convert_utf16le_to_utf8(input, &mut out)
            };
            assert_eq!(written, 0, "{name}");
            continue;
        }

        let (count, len8, len32) = if big {
            (
                ops.count_utf16be(input),
                ops.utf8_length_from_utf16be(input),
                ops.utf32_length_from_utf16be(input),
            )
        } else {
            (
                ops.count_utf16le(input),
                ops.utf8_length_from_utf16le(input),
                ops.utf32_length_from_utf16le(input),
            )
        };
        let utf8 = utf8.expect("valid input converts");
        let utf32 = utf32.expect("valid input converts");
        assert_eq!(count, utf32.len(), "{name}");
        assert_eq!(len8, utf8.len(), "{name}: estimate");
        assert_eq!(len32, utf32.len(), "{name}: estimate");

        let mut exact8 = vec![0u8; len8];
        let mut exact32 = vec![0u32; len32];
        if big {
            assert_eq!(
                ops.convert_valid_utf16be_to_utf8(input, &mut exact8),
                len8,
                "{name}"
            );
            assert_eq!(
                ops.convert_valid_utf16be_to_utf32(input, &mut exact32),
                len32,
                "{name}"
            );
        } else {
            assert_eq!(
                ops.convert_valid_utf16le_to_utf8(input, &mut exact8),
                len8,
                "{name}"
            );
            assert_eq!(
                ops.convert_valid_utf16le_to_utf32(input, &mut exact32),
                len32,
                "{name}"
            );
        }
        assert_eq!(exact8, utf8, "{name}");
        assert_eq!(exact32, utf32, "{name}");
    }
}

#[test]
fn test_utf16_sources_match_scalar() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_0016);
    for (name, ops) in simd_kernels() {
        for _ in 0..ROUNDS {
            check_utf16_source(name, ops, &utf16_units(&mut rng, false));
            check_utf16_source(name, ops, &utf16_units(&mut rng, true));
            let len = rng.gen_range(0..=MAX_LEN);
            let noise: Vec<u16> = (0..len).map(|_| rng.gen()).collect();
            check_utf16_source(name, ops, &noise);
        }
    }
}

// ============================================================================
// UTF-32 sources
// ============================================================================

fn check_utf32_source(name: &str, ops: &KernelOps, input: &[u32]) {
    let s = scalar();
    let n = input.len();
    assert_eq!(ops.validate_utf32(input), s.validate_utf32(input), "{name}");
    assert_eq!(
        ops.validate_utf32_with_errors(input),
        s.validate_utf32_with_errors(input),
        "{name}"
    );

    let utf8 = check_conversion(name, "utf32->utf8", input, 4 * n, |k, i, o| {
        k.convert_utf32_to_utf8_with_errors(i, o)
    }, ops);
    let utf16 = check_conversion(name, "utf32->utf16le", input, 2 * n, |k, i, o| {
        k.convert_utf32_to_utf16le_with_errors(i, o)
    }, ops);
    check_conversion(name, "utf32->utf16be", input, 2 * n, |k, i, o| {
        k.convert_utf32_to_utf16be_with_errors(i, o)
    }, ops);

    if !s.validate_utf32(input) {
        let mut out = vec![0u8; 4 * n];
        assert_eq!(ops.convert_utf32_to_utf8(input, &mut out), 0, "{name}");
        return;
    }

    let len8 = ops.utf8_length_from_utf32(input);
    let len16 = ops.utf16_length_from_utf32(input);
    let utf8 = utf8.expect("valid input converts");
    let utf16 = utf16.expect("valid input converts");
    assert_eq!(len8, utf8.len(), "{name}: estimate");
    assert_eq!(len16, utf16.len(), "{name}: estimate");

    let mut exact8 = vec![0u8; len8];
    assert_eq!(
        ops.convert_valid_utf32_to_utf8(input, &mut exact8),
        len8,
        "{name}"
    );
    assert_eq!(exact8, utf8, "{name}");
    let mut exact16 = vec![0u16; len16];
    assert_eq!(
        ops.convert_valid_utf32_to_utf16le(input, &mut exact16),
        len16,
        "{name}"
    );
    assert_eq!(exact16, utf16, "{name}");
}

#[test]
fn test_utf32_sources_match_scalar() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_0032);
    for (name, ops) in simd_kernels() {
        for _ in 0..ROUNDS {
            check_utf32_source(name, ops, &utf32_units(&mut rng, false));
            check_utf32_source(name, ops, &utf32_units(&mut rng, true));
        }
    }
}

// ============================================================================
// Scalar self-consistency (runs on every host)
// ============================================================================

#[test]
fn test_scalar_estimates_match_output() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let s = scalar();
    for _ in 0..ROUNDS {
        let input = valid_utf8(&mut rng);
        let expected: Vec<u16> = std::str::from_utf8(&input)
            .expect("generator yields valid UTF-8")
            .encode_utf16()
            .collect();
        let mut out = vec![0u16; s.utf16_length_from_utf8(&input)];
        assert_eq!(s.convert_utf8_to_utf16le(&input, &mut out), expected.len());
        assert_eq!(out, to_le(&expected));
    }
}

// ============================================================================
// Unchecked converters on malformed input
// ============================================================================

fn all_kernels() -> Vec<(&'static str, &'static KernelOps)> {
    supported_kernels()
        .filter_map(|k| k.ops().map(|ops| (k.name(), ops)))
        .collect()
}

/// Random units biased toward surrogates and wide BMP values.
fn hostile_utf16(rng: &mut ChaCha8Rng) -> Vec<u16> {
    let len = rng.gen_range(0..=MAX_LEN);
    (0..len)
        .map(|_| match rng.gen_range(0..4) {
            0 => rng.gen_range(0xD800..0xE000),
            1 => rng.gen_range(0x0800..0xD800),
            2 => rng.gen_range(0..0x80),
            _ => rng.gen(),
        })
        .collect()
}

/// Estimator-sized buffers must hold whatever `convert_valid_*` writes.
fn check_valid_converters_stay_in_bounds(
    name: &str,
    ops: &KernelOps,
    bytes: &[u8],
    units: &[u16],
    wide: &[u32],
) {
    let mut out16 = vec![0u16; ops.utf16_length_from_utf8(bytes)];
    assert!(
        ops.convert_valid_utf8_to_utf16le(bytes, &mut out16) <= out16.len(),
        "{name}"
    );
    assert!(
        ops.convert_valid_utf8_to_utf16be(bytes, &mut out16) <= out16.len(),
        "{name}"
    );
    let mut out32 = vec![0u32; ops.utf32_length_from_utf8(bytes)];
    assert!(
        ops.convert_valid_utf8_to_utf32(bytes, &mut out32) <= out32.len(),
        "{name}"
    );

    let mut out8 = vec![0u8; ops.utf8_length_from_utf16le(units)];
    assert!(
        ops.convert_valid_utf16le_to_utf8(units, &mut out8) <= out8.len(),
        "{name}"
    );
    let mut out8 = vec![0u8; ops.utf8_length_from_utf16be(units)];
    assert!(
        ops.convert_valid_utf16be_to_utf8(units, &mut out8) <= out8.len(),
        "{name}"
    );
    let mut out32 = vec![0u32; ops.utf32_length_from_utf16le(units)];
    assert!(
        ops.convert_valid_utf16le_to_utf32(units, &mut out32) <= out32.len(),
        "{name}"
    );
    let mut out32 = vec![0u32; ops.utf32_length_from_utf16be(units)];
    assert!(
        ops.convert_valid_utf16be_to_utf32(units, &mut out32) <= out32.len(),
        "{name}"
    );

    let mut out8 = vec![0u8; ops.utf8_length_from_utf32(wide)];
    assert!(
        ops.convert_valid_utf32_to_utf8(wide, &mut out8) <= out8.len(),
        "{name}"
    );
    let mut out16 = vec![0u16; ops.utf16_length_from_utf32(wide)];
    assert!(
        ops.convert_valid_utf32_to_utf16le(wide, &mut out16) <= out16.len(),
        "{name}"
    );
    assert!(
        ops.convert_valid_utf32_to_utf16be(wide, &mut out16) <= out16.len(),
        "{name}"
    );
}

#[test]
fn test_valid_converters_survive_garbage() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xBAD);
    for (name, ops) in all_kernels() {
        // Lone surrogates at the start, the end, and as the last unit of a block
        let high_then_ascii = [0xD800u16.to_le(), 0x0041u16.to_le()];
        let mut block_edge = Vec::new();
        for _ in 0..8 {
            block_edge.extend(std::iter::repeat(0x4E2Du16.to_le()).take(31));
            block_edge.extend([0xD800u16.to_le(), 0x0041u16.to_le()]);
        }
        let lone_high = [0xD800u16.to_le()];
        let lone_low = [0xDC00u16.to_le()];
        let cases: [&[u16]; 4] = [
            &lone_high,
            &lone_low,
            &high_then_ascii,
            block_edge.as_slice(),
        ];
        let (bytes, wide) = (b"\xF4\xFF", [u32::MAX]);
        for units in cases {
            check_valid_converters_stay_in_bounds(name, ops, bytes, units, &wide);
        }

        for _ in 0..ROUNDS {
            let bytes = random_bytes(&mut rng);
            let units = hostile_utf16(&mut rng);
            let len = rng.gen_range(0..=MAX_LEN);
            let wide: Vec<u32> = (0..len).map(|_| rng.gen()).collect();
            check_valid_converters_stay_in_bounds(name, ops, &bytes, &units, &wide);
        }
    }
}

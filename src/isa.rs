//! Instruction set detection.
//!
//! [`detect`] queries the host once and caches the answer; every later call
//! is a single relaxed atomic load.
//!
//! On x86 detection reads CPUID leaves 1, 7 and 0x80000001 directly and
//! confirms through XGETBV that the operating system saves YMM and ZMM
//! state before reporting any AVX or AVX-512 family. On aarch64 NEON is
//! part of the baseline. Other targets report what the compile-time
//! target features guarantee.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// A set of instruction set families.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct IsaFeatures: u64 {
        const SSE2 = 1 << 0;
        const SSE3 = 1 << 1;
        const SSSE3 = 1 << 2;
        const SSE41 = 1 << 3;
        const SSE42 = 1 << 4;
        const PCLMULQDQ = 1 << 5;
        const AVX = 1 << 6;
        const AVX2 = 1 << 7;
        const BMI1 = 1 << 8;
        const BMI2 = 1 << 9;
        const LZCNT = 1 << 10;
        const POPCNT = 1 << 11;
        const AVX512F = 1 << 12;
        const AVX512DQ = 1 << 13;
        const AVX512CD = 1 << 14;
        const AVX512BW = 1 << 15;
        const AVX512VL = 1 << 16;
        const AVX512VBMI = 1 << 17;
        const AVX512VBMI2 = 1 << 18;
        const AVX512VPOPCNTDQ = 1 << 19;
        const AVX512BITALG = 1 << 20;
        const AVX512IFMA = 1 << 21;
        const AVX512VPCLMULQDQ = 1 << 22;
        const NEON = 1 << 23;
        const ALTIVEC = 1 << 24;
    }
}

impl IsaFeatures {
    /// What every CPU of the compilation target is guaranteed to have.
    pub const fn baseline() -> Self {
        let mut features = Self::empty();
        if cfg!(target_arch = "x86_64") || cfg!(target_feature = "sse2") {
            features = features.union(Self::SSE2);
        }
        if cfg!(target_arch = "aarch64") || cfg!(target_feature = "neon") {
            features = features.union(Self::NEON);
        }
        if cfg!(target_feature = "altivec") {
            features = features.union(Self::ALTIVEC);
        }
        features
    }
}

impl fmt::Display for IsaFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        for (i, (name, _)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Set once the cache holds a real answer.
const CACHED: u64 = 1 << 63;

static DETECTED: AtomicU64 = AtomicU64::new(0);

/// Features supported by the host. Probes once, then serves from cache.
pub fn detect() -> IsaFeatures {
    let cached = DETECTED.load(Ordering::Relaxed);
    if cached & CACHED != 0 {
        return IsaFeatures::from_bits_retain(cached & !CACHED);
    }
    // Racing threads compute the same value, so a plain store is enough
    let features = query_host();
    DETECTED.store(features.bits() | CACHED, Ordering::Relaxed);
    features
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn query_host() -> IsaFeatures {
    x86::query_host()
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn query_host() -> IsaFeatures {
    IsaFeatures::baseline()
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod x86 {
    #[cfg(target_arch = "x86")]
    use core::arch::x86::{CpuidResult, __cpuid_count, __get_cpuid_max, _xgetbv};
    #[cfg(target_arch = "x86_64")]
    use core::arch::x86_64::{CpuidResult, __cpuid_count, __get_cpuid_max, _xgetbv};

    use super::IsaFeatures;

    /// XCR0 bits for SSE and AVX (YMM upper halves) state.
    const XCR0_AVX: u64 = 0x6;
    /// XCR0 bits for opmask, ZMM_Hi256 and Hi16_ZMM state.
    const XCR0_AVX512: u64 = 0xE0;

    #[inline]
    const fn bit(reg: u32, n: u32) -> bool {
        reg & (1 << n) != 0
    }

    fn cpuid(leaf: u32, subleaf: u32) -> CpuidResult {
        // SAFETY: CPUID is available on every x86_64 CPU and on every x86 CPU
        // Rust targets.
        #[allow(unused_unsafe)]
        unsafe {
            __cpuid_count(leaf, subleaf)
        }
    }

    #[target_feature(enable = "xsave")]
    unsafe fn read_xcr0() -> u64 {
        _xgetbv(0)
    }

    pub(super) fn query_host() -> IsaFeatures {
        let mut features = IsaFeatures::baseline();

        // SAFETY: see `cpuid`.
        #[allow(unused_unsafe)]
        let (max_leaf, _) = unsafe { __get_cpuid_max(0) };
        if max_leaf < 1 {
            return features;
        }

        let leaf1 = cpuid(1, 0);
        if bit(leaf1.edx, 26) {
            features |= IsaFeatures::SSE2;
        }
        if bit(leaf1.ecx, 0) {
            features |= IsaFeatures::SSE3;
        }
        if bit(leaf1.ecx, 1) {
            features |= IsaFeatures::PCLMULQDQ;
        }
        if bit(leaf1.ecx, 9) {
            features |= IsaFeatures::SSSE3;
        }
        if bit(leaf1.ecx, 19) {
            features |= IsaFeatures::SSE41;
        }
        if bit(leaf1.ecx, 20) {
            features |= IsaFeatures::SSE42;
        }
        if bit(leaf1.ecx, 23) {
            features |= IsaFeatures::POPCNT;
        }

        let osxsave = bit(leaf1.ecx, 27);
        let xcr0 = if osxsave {
            // SAFETY: OSXSAVE set means XGETBV is enabled.
            unsafe { read_xcr0() }
        } else {
            0
        };
        let os_avx = xcr0 & XCR0_AVX == XCR0_AVX;
        let os_avx512 = os_avx && xcr0 & XCR0_AVX512 == XCR0_AVX512;

        if os_avx && bit(leaf1.ecx, 28) {
            features |= IsaFeatures::AVX;
        }

        if max_leaf >= 7 {
            let leaf7 = cpuid(7, 0);
            let (ebx, ecx) = (leaf7.ebx, leaf7.ecx);

            if bit(ebx, 3) {
                features |= IsaFeatures::BMI1;
            }
            if bit(ebx, 8) {
                features |= IsaFeatures::BMI2;
            }
            if os_avx && bit(ebx, 5) {
                features |= IsaFeatures::AVX2;
            }

            if os_avx512 && bit(ebx, 16) {
                features |= IsaFeatures::AVX512F;
                let avx512 = [
                    (bit(ebx, 17), IsaFeatures::AVX512DQ),
                    (bit(ebx, 21), IsaFeatures::AVX512IFMA),
                    (bit(ebx, 28), IsaFeatures::AVX512CD),
                    (bit(ebx, 30), IsaFeatures::AVX512BW),
                    (bit(ebx, 31), IsaFeatures::AVX512VL),
                    (bit(ecx, 1), IsaFeatures::AVX512VBMI),
                    (bit(ecx, 6), IsaFeatures::AVX512VBMI2),
                    (bit(ecx, 10), IsaFeatures::AVX512VPCLMULQDQ),
                    (bit(ecx, 12), IsaFeatures::AVX512BITALG),
                    (bit(ecx, 14), IsaFeatures::AVX512VPOPCNTDQ),
                ];
                for (present, flag) in avx512 {
                    if present {
                        features |= flag;
                    }
                }
            }
        }

        // SAFETY: see `cpuid`.
        #[allow(unused_unsafe)]
        let (max_extended, _) = unsafe { __get_cpuid_max(0x8000_0000) };
        if max_extended >= 0x8000_0001 && bit(cpuid(0x8000_0001, 0).ecx, 5) {
            features |= IsaFeatures::LZCNT;
        }

        features
    }
}

//! Kernels: complete implementations of the codec for one instruction set.
//!
//! A [`Kernel`] is a static descriptor (name, description, required
//! features) around a [`KernelOps`] table of function pointers. Kernels
//! hold no state, so one static instance per target serves every thread.
//!
//! SIMD entry points are compiled with `#[target_feature]` and are only
//! sound to call on hosts that have those features. The table is therefore
//! handed out by [`Kernel::ops`] only after the host has been checked, and
//! [`KernelOps`] cannot be built outside this crate.
//!
//! # Example
//!
//! ```
//! use turbo_unicode::kernel;
//!
//! for k in kernel::supported_kernels() {
//!     let ops = k.ops().unwrap();
//!     assert!(ops.validate_utf8("ünïcödé".as_bytes()));
//! }
//! ```

pub mod scalar;
pub mod tables;
pub mod unsupported;

#[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
pub mod avx2;
#[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
pub mod avx512;
#[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
pub mod neon;
#[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
pub mod sse42;

use core::fmt;

use crate::encoding::{Encoding, EncodingSet};
use crate::error::TranscodeResult;
use crate::isa::{self, IsaFeatures};

macro_rules! kernel_ops {
    ($(
        $(#[$doc:meta])*
        fn $name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;
    )*) => {
        /// Operation table of one kernel.
        ///
        /// Obtained from [`Kernel::ops`]; every method is safe to call.
        #[derive(Clone, Copy)]
        pub struct KernelOps {
            $(pub(crate) $name: unsafe fn($($ty),*) -> $ret,)*
        }

        impl KernelOps {
            $(
                $(#[$doc])*
                #[inline]
                pub fn $name(&self, $($arg: $ty),*) -> $ret {
                    // SAFETY: a `KernelOps` is only reachable through
                    // `Kernel::ops` or the dispatcher, both of which check
                    // that the host supports the kernel's features.
                    unsafe { (self.$name)($($arg),*) }
                }
            )*
        }
    };
}

kernel_ops! {
    /// Returns `true` when every byte is below 0x80.
    fn validate_ascii(input: &[u8]) -> bool;
    /// Position of the first non-ASCII byte, reported as `TooLarge`.
    fn validate_ascii_with_errors(input: &[u8]) -> TranscodeResult;
    fn validate_utf8(input: &[u8]) -> bool;
    fn validate_utf8_with_errors(input: &[u8]) -> TranscodeResult;
    fn validate_utf16le(input: &[u16]) -> bool;
    fn validate_utf16be(input: &[u16]) -> bool;
    fn validate_utf16le_with_errors(input: &[u16]) -> TranscodeResult;
    fn validate_utf16be_with_errors(input: &[u16]) -> TranscodeResult;
    fn validate_utf32(input: &[u32]) -> bool;
    fn validate_utf32_with_errors(input: &[u32]) -> TranscodeResult;

    /// Code points in UTF-8 (non-continuation bytes).
    fn count_utf8(input: &[u8]) -> usize;
    /// Code points in UTF-16LE (units minus high surrogates).
    fn count_utf16le(input: &[u16]) -> usize;
    /// Code points in UTF-16BE (units minus high surrogates).
    fn count_utf16be(input: &[u16]) -> usize;
    fn utf16_length_from_utf8(input: &[u8]) -> usize;
    fn utf32_length_from_utf8(input: &[u8]) -> usize;
    fn utf8_length_from_utf16le(input: &[u16]) -> usize;
    fn utf8_length_from_utf16be(input: &[u16]) -> usize;
    fn utf32_length_from_utf16le(input: &[u16]) -> usize;
    fn utf32_length_from_utf16be(input: &[u16]) -> usize;
    fn utf8_length_from_utf32(input: &[u32]) -> usize;
    fn utf16_length_from_utf32(input: &[u32]) -> usize;

    fn convert_utf8_to_utf16le(input: &[u8], output: &mut [u16]) -> usize;
    fn convert_utf8_to_utf16be(input: &[u8], output: &mut [u16]) -> usize;
    fn convert_utf8_to_utf16le_with_errors(input: &[u8], output: &mut [u16]) -> TranscodeResult;
    fn convert_utf8_to_utf16be_with_errors(input: &[u8], output: &mut [u16]) -> TranscodeResult;
    fn convert_valid_utf8_to_utf16le(input: &[u8], output: &mut [u16]) -> usize;
    fn convert_valid_utf8_to_utf16be(input: &[u8], output: &mut [u16]) -> usize;

    fn convert_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize;
    fn convert_utf8_to_utf32_with_errors(input: &[u8], output: &mut [u32]) -> TranscodeResult;
    fn convert_valid_utf8_to_utf32(input: &[u8], output: &mut [u32]) -> usize;

    fn convert_utf16le_to_utf8(input: &[u16], output: &mut [u8]) -> usize;
    fn convert_utf16be_to_utf8(input: &[u16], output: &mut [u8]) -> usize;
    fn convert_utf16le_to_utf8_with_errors(input: &[u16], output: &mut [u8]) -> TranscodeResult;
    fn convert_utf16be_to_utf8_with_errors(input: &[u16], output: &mut [u8]) -> TranscodeResult;
    fn convert_valid_utf16le_to_utf8(input: &[u16], output: &mut [u8]) -> usize;
    fn convert_valid_utf16be_to_utf8(input: &[u16], output: &mut [u8]) -> usize;

    fn convert_utf16le_to_utf32(input: &[u16], output: &mut [u32]) -> usize;
    fn convert_utf16be_to_utf32(input: &[u16], output: &mut [u32]) -> usize;
    fn convert_utf16le_to_utf32_with_errors(input: &[u16], output: &mut [u32]) -> TranscodeResult;
    fn convert_utf16be_to_utf32_with_errors(input: &[u16], output: &mut [u32]) -> TranscodeResult;
    fn convert_valid_utf16le_to_utf32(input: &[u16], output: &mut [u32]) -> usize;
    fn convert_valid_utf16be_to_utf32(input: &[u16], output: &mut [u32]) -> usize;

    fn convert_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize;
    fn convert_utf32_to_utf8_with_errors(input: &[u32], output: &mut [u8]) -> TranscodeResult;
    fn convert_valid_utf32_to_utf8(input: &[u32], output: &mut [u8]) -> usize;

    fn convert_utf32_to_utf16le(input: &[u32], output: &mut [u16]) -> usize;
    fn convert_utf32_to_utf16be(input: &[u32], output: &mut [u16]) -> usize;
    fn convert_utf32_to_utf16le_with_errors(input: &[u32], output: &mut [u16]) -> TranscodeResult;
    fn convert_utf32_to_utf16be_with_errors(input: &[u32], output: &mut [u16]) -> TranscodeResult;
    fn convert_valid_utf32_to_utf16le(input: &[u32], output: &mut [u16]) -> usize;
    fn convert_valid_utf32_to_utf16be(input: &[u32], output: &mut [u16]) -> usize;

    /// Byte-swap every unit of `input` into `output`.
    fn change_endianness_utf16(input: &[u16], output: &mut [u16]) -> ();

    /// The encoding named by a leading BOM, otherwise every encoding
    /// `input` validates under.
    fn detect_encodings(input: &[u8]) -> EncodingSet;
}

impl KernelOps {
    /// The byte order mark if present, else the preferred detected encoding.
    #[inline]
    pub fn autodetect_encoding(&self, input: &[u8]) -> Encoding {
        self.detect_encodings(input).first()
    }
}

/// A codec implementation targeting one instruction set.
pub struct Kernel {
    name: &'static str,
    description: &'static str,
    required: IsaFeatures,
    ops: KernelOps,
}

impl Kernel {
    pub(crate) const fn new(
        name: &'static str,
        description: &'static str,
        required: IsaFeatures,
        ops: KernelOps,
    ) -> Self {
        Self {
            name,
            description,
            required,
            ops,
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Instruction set families the host must provide.
    #[inline]
    pub const fn required_features(&self) -> IsaFeatures {
        self.required
    }

    /// Whether the running host provides every required feature.
    #[inline]
    pub fn is_supported(&self) -> bool {
        isa::detect().contains(self.required)
    }

    /// The operation table, or `None` if the host cannot run this kernel.
    #[inline]
    pub fn ops(&self) -> Option<&KernelOps> {
        if self.is_supported() {
            Some(&self.ops)
        } else {
            None
        }
    }

    /// The operation table without the host check.
    ///
    /// Callers must have established that the kernel is supported.
    #[inline]
    pub(crate) const fn ops_unchecked(&self) -> &KernelOps {
        &self.ops
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Kernel {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
    }
}

impl Eq for Kernel {}

// =============================================================================
// Registry
// =============================================================================

/// Every kernel compiled into this build, richest first.
static REGISTRY: &[&Kernel] = &[
    #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
    &avx512::KERNEL,
    #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
    &avx2::KERNEL,
    #[cfg(all(target_arch = "x86_64", not(feature = "scalar-only")))]
    &sse42::KERNEL,
    #[cfg(all(target_arch = "aarch64", not(feature = "scalar-only")))]
    &neon::KERNEL,
    &scalar::KERNEL,
];

/// Every kernel compiled into this build, richest first.
pub fn all_kernels() -> &'static [&'static Kernel] {
    REGISTRY
}

/// Kernels the running host can execute, richest first.
pub fn supported_kernels() -> impl Iterator<Item = &'static Kernel> {
    REGISTRY.iter().copied().filter(|k| k.is_supported())
}

/// Look up a compiled kernel by exact (case-sensitive) name.
pub fn kernel_by_name(name: &str) -> Option<&'static Kernel> {
    REGISTRY.iter().copied().find(|k| k.name == name)
}

/// The richest kernel the host supports. The scalar kernel always qualifies.
pub fn best_kernel() -> &'static Kernel {
    supported_kernels().next().unwrap_or(&scalar::KERNEL)
}

//! # Turbo Unicode
//!
//! Validation, length estimation and transcoding between UTF-8, UTF-16
//! (either byte order) and UTF-32, with SIMD kernels picked at runtime.
//!
//! ## Module Organization
//!
//! - [`error`] - Error kinds and the `(kind, count)` result pair
//! - [`encoding`] - Encoding tags, byte order marks and autodetection
//! - [`isa`] - Instruction set feature detection
//! - [`scalar`] - Portable building blocks shared by every kernel
//! - [`kernel`] - Per-ISA kernels and the registry
//! - [`dispatch`] - The process-wide active kernel
//!
//! The free functions at the crate root go through the active kernel.
//!
//! ## Quick Start
//!
//! ```
//! use turbo_unicode::{convert_utf8_to_utf16le, utf16_length_from_utf8, validate_utf8};
//!
//! let text = "Grüß Gott 👋";
//! assert!(validate_utf8(text.as_bytes()));
//!
//! let mut units = vec![0u16; utf16_length_from_utf8(text.as_bytes())];
//! let written = convert_utf8_to_utf16le(text.as_bytes(), &mut units);
//! assert_eq!(written, text.encode_utf16().count());
//! ```
//!
//! ## Features
//!
//! - `std` (default) - Honour the `TURBO_UNICODE_FORCE_IMPLEMENTATION`
//!   environment variable
//! - `scalar-only` - Compile only the scalar kernel (benchmark baseline)
//! - `serde` - Enable serialization of the public value types
//! - `cli` - Build the `turbo-unicode` command line tool

// Use no_std unless std feature is enabled or we're in test mode
#![cfg_attr(not(any(test, feature = "std")), no_std)]

// =============================================================================
// Core modules
// =============================================================================

/// Error kinds and results.
pub mod error;

/// Instruction set feature detection.
pub mod isa;

/// Encoding tags, BOMs and detection.
pub mod encoding;

/// Scalar codec routines.
pub mod scalar;

// =============================================================================
// Kernels and dispatch
// =============================================================================

/// Kernel descriptors, operation tables and the registry.
pub mod kernel;

/// Active-kernel selection.
pub mod dispatch;

mod api;

// =============================================================================
// Public re-exports
// =============================================================================

pub use api::*;

pub use dispatch::{
    active_kernel, get_active_kernel, list_kernels, reset_active_kernel, set_active_kernel,
    FORCE_ENV,
};
pub use encoding::{Encoding, EncodingSet, Endianness};
pub use error::{ErrorKind, TranscodeError, TranscodeResult};
pub use isa::IsaFeatures;
pub use kernel::{Kernel, KernelOps};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_functions_agree_with_active_kernel() {
        let text = "mixed: ascii, ελληνικά, 漢字, 🎉";
        let ops = active_kernel().ops().unwrap();
        assert_eq!(
            validate_utf8(text.as_bytes()),
            ops.validate_utf8(text.as_bytes())
        );
        assert_eq!(count_utf8(text.as_bytes()), text.chars().count());
        assert_eq!(
            utf16_length_from_utf8(text.as_bytes()),
            text.encode_utf16().count()
        );
    }

    #[test]
    fn result_converts_to_std_result() {
        let ok = validate_utf8_with_errors(b"fine").into_result();
        assert_eq!(ok, Ok(4));
        let err = validate_utf8_with_errors(b"\xC0\x80")
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Overlong);
        assert_eq!(err.position, 0);
    }
}

//! Active-kernel selection: lazy resolution, the environment override and
//! programmatic replacement.
//!
//! The active kernel and the environment are process-wide, so every test
//! holds `LOCK` and leaves the selector reset with the variable cleared.

use std::sync::{Mutex, MutexGuard};
use std::thread;

use turbo_unicode::kernel::{best_kernel, supported_kernels};
use turbo_unicode::*;

static LOCK: Mutex<()> = Mutex::new(());

struct Clean {
    _guard: MutexGuard<'static, ()>,
}

impl Drop for Clean {
    fn drop(&mut self) {
        std::env::remove_var(FORCE_ENV);
        reset_active_kernel();
    }
}

fn exclusive() -> Clean {
    let guard = LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    std::env::remove_var(FORCE_ENV);
    reset_active_kernel();
    Clean { _guard: guard }
}

// ============================================================================
// Lazy resolution
// ============================================================================

#[test]
fn test_resolves_to_best_kernel() {
    let _clean = exclusive();
    assert_eq!(get_active_kernel(), best_kernel().name());
    assert!(active_kernel().is_supported());
}

#[test]
fn test_reset_resolves_again() {
    let _clean = exclusive();
    assert!(set_active_kernel("scalar"));
    assert_eq!(get_active_kernel(), "scalar");
    reset_active_kernel();
    assert_eq!(get_active_kernel(), best_kernel().name());
}

// ============================================================================
// Environment override
// ============================================================================

#[test]
fn test_env_selects_named_kernel() {
    let _clean = exclusive();
    std::env::set_var(FORCE_ENV, "scalar");
    assert_eq!(get_active_kernel(), "scalar");
    assert!(validate_utf8("naïve".as_bytes()));
}

#[test]
fn test_env_is_read_once() {
    let _clean = exclusive();
    std::env::set_var(FORCE_ENV, "scalar");
    assert_eq!(get_active_kernel(), "scalar");
    std::env::set_var(FORCE_ENV, "no-such-kernel");
    assert_eq!(get_active_kernel(), "scalar");
}

#[test]
fn test_env_unknown_kernel_installs_failing_stub() {
    let _clean = exclusive();
    std::env::set_var(FORCE_ENV, "no-such-kernel");
    assert_eq!(get_active_kernel(), "unsupported");
    assert!(active_kernel().required_features().is_empty());

    let text = "hello".as_bytes();
    assert!(!validate_ascii(text));
    assert!(!validate_utf8(text));
    assert_eq!(
        validate_utf8_with_errors(text),
        TranscodeResult::err(ErrorKind::Other, 0)
    );
    assert!(!validate_utf32(&[0x41]));
    assert_eq!(count_utf8(text), 0);
    assert_eq!(utf16_length_from_utf8(text), 0);

    let mut out = [0u16; 8];
    assert_eq!(convert_utf8_to_utf16le(text, &mut out), 0);
    assert!(convert_utf8_to_utf16le_with_errors(text, &mut out).is_err());
}

#[test]
fn test_failing_stub_detects_nothing() {
    let _clean = exclusive();
    std::env::set_var(FORCE_ENV, "no-such-kernel");
    assert!(active_kernel().description().contains("unavailable"));

    let inputs: [&[u8]; 3] = [b"\xEF\xBB\xBFhello", b"\xFF\xFE\x41\x00", b"plain ascii"];
    for input in inputs {
        assert!(detect_encodings(input).is_empty());
        assert_eq!(autodetect_encoding(input), Encoding::Unspecified);
    }
}

#[test]
fn test_env_unsupported_kernel_installs_failing_stub() {
    let _clean = exclusive();
    let Some(missing) = list_kernels().find(|k| !k.is_supported()) else {
        // Every compiled kernel runs here
        return;
    };
    std::env::set_var(FORCE_ENV, missing.name());
    assert_eq!(get_active_kernel(), "unsupported");
    assert!(!validate_utf8(b"x"));
}

#[test]
fn test_set_active_kernel_recovers_from_stub() {
    let _clean = exclusive();
    std::env::set_var(FORCE_ENV, "no-such-kernel");
    assert_eq!(get_active_kernel(), "unsupported");
    assert!(set_active_kernel("scalar"));
    assert!(validate_utf8(b"x"));
}

#[test]
fn test_empty_env_is_ignored() {
    let _clean = exclusive();
    std::env::set_var(FORCE_ENV, "");
    assert_eq!(get_active_kernel(), best_kernel().name());
}

// ============================================================================
// Programmatic replacement
// ============================================================================

#[test]
fn test_set_every_supported_kernel() {
    let _clean = exclusive();
    for kernel in supported_kernels() {
        assert!(set_active_kernel(kernel.name()), "{}", kernel.name());
        assert_eq!(get_active_kernel(), kernel.name());
        assert!(validate_utf8("Ωμέγα".as_bytes()), "{}", kernel.name());
    }
}

#[test]
fn test_set_refuses_unknown_and_unsupported() {
    let _clean = exclusive();
    assert!(set_active_kernel("scalar"));
    assert!(!set_active_kernel("no-such-kernel"));
    // Names are case-sensitive
    assert!(!set_active_kernel("SCALAR"));
    if let Some(missing) = list_kernels().find(|k| !k.is_supported()) {
        assert!(!set_active_kernel(missing.name()));
    }
    assert_eq!(get_active_kernel(), "scalar");
}

#[test]
fn test_switching_while_other_threads_convert() {
    let _clean = exclusive();
    let text = "Grüße, 世界! 🌍 ".repeat(50);
    let expected: Vec<u16> = text.encode_utf16().map(u16::to_le).collect();
    let names: Vec<&'static str> = supported_kernels().map(|k| k.name()).collect();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let mut out = vec![0u16; expected.len()];
                    let n = convert_utf8_to_utf16le(text.as_bytes(), &mut out);
                    assert_eq!(n, expected.len());
                    assert_eq!(out, expected);
                }
            });
        }
        scope.spawn(|| {
            for i in 0..400 {
                assert!(set_active_kernel(names[i % names.len()]));
            }
        });
    });
}

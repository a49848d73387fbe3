//! Process-wide active kernel.
//!
//! The active kernel is a single atomic pointer to a static [`Kernel`]. It
//! starts unresolved; the first operation that needs it picks the richest
//! kernel the host supports, unless [`FORCE_ENV`] names another one.
//! Afterwards every call costs one acquire load.
//!
//! Replacing the kernel while other threads are mid-call is fine: kernels
//! are stateless, so a call finishes on whichever kernel it loaded.

use core::ptr;
use core::sync::atomic::{AtomicPtr, Ordering};

use crate::isa;
use crate::kernel::{self, unsupported, Kernel, KernelOps};

/// Environment variable naming a kernel to use instead of the best one.
///
/// Read at first resolution and again after [`reset_active_kernel`]. A name
/// that is unknown or unsupported on this host installs a stub kernel whose
/// every operation fails.
pub const FORCE_ENV: &str = "TURBO_UNICODE_FORCE_IMPLEMENTATION";

static ACTIVE: AtomicPtr<Kernel> = AtomicPtr::new(ptr::null_mut());

#[inline]
fn as_ptr(kernel: &'static Kernel) -> *mut Kernel {
    kernel as *const Kernel as *mut Kernel
}

/// The kernel every free function dispatches to.
#[inline]
pub fn active_kernel() -> &'static Kernel {
    let current = ACTIVE.load(Ordering::Acquire);
    if current.is_null() {
        return resolve_and_install();
    }
    // SAFETY: ACTIVE only ever holds null or a pointer taken from a
    // `&'static Kernel`, and nothing writes through it.
    unsafe { &*current }
}

/// Name of the active kernel, resolving it if needed.
pub fn get_active_kernel() -> &'static str {
    active_kernel().name()
}

/// Operation table of the active kernel.
#[inline]
pub(crate) fn active_ops() -> &'static KernelOps {
    // Only supported kernels (or the stub, which needs nothing) are installed
    active_kernel().ops_unchecked()
}

#[cold]
fn resolve_and_install() -> &'static Kernel {
    let resolved = resolve();
    match ACTIVE.compare_exchange(
        ptr::null_mut(),
        as_ptr(resolved),
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => resolved,
        // Another thread installed a kernel first; use theirs.
        // SAFETY: see `active_kernel`.
        Err(winner) => unsafe { &*winner },
    }
}

fn resolve() -> &'static Kernel {
    #[cfg(feature = "std")]
    if let Some(forced) = forced_kernel() {
        return forced;
    }
    let best = kernel::best_kernel();
    log::debug!(
        "selected kernel {} (detected features: {})",
        best.name(),
        isa::detect()
    );
    best
}

#[cfg(feature = "std")]
fn forced_kernel() -> Option<&'static Kernel> {
    let name = std::env::var(FORCE_ENV).ok().filter(|s| !s.is_empty())?;
    let chosen = match kernel::kernel_by_name(&name) {
        Some(k) if k.is_supported() => {
            log::debug!("{}={} selects kernel {}", FORCE_ENV, name, k.name());
            k
        }
        Some(k) => {
            log::warn!(
                "{}={}: kernel needs {} but host has {}; every operation will fail",
                FORCE_ENV,
                name,
                k.required_features(),
                isa::detect()
            );
            &unsupported::KERNEL
        }
        None => {
            log::warn!(
                "{}={}: no such kernel; every operation will fail",
                FORCE_ENV,
                name
            );
            &unsupported::KERNEL
        }
    };
    Some(chosen)
}

/// Install the kernel called `name`.
///
/// Returns `false` and keeps the current kernel when no compiled kernel has
/// that name or the host cannot run it.
pub fn set_active_kernel(name: &str) -> bool {
    match kernel::kernel_by_name(name) {
        Some(k) if k.is_supported() => {
            ACTIVE.store(as_ptr(k), Ordering::Release);
            log::trace!("active kernel set to {}", k.name());
            true
        }
        Some(_) => {
            log::trace!("refusing kernel {}: not supported on this host", name);
            false
        }
        None => {
            log::trace!("refusing kernel {}: unknown", name);
            false
        }
    }
}

/// Forget the active kernel. The next operation resolves it again,
/// re-reading [`FORCE_ENV`].
pub fn reset_active_kernel() {
    ACTIVE.store(ptr::null_mut(), Ordering::Release);
}

/// Every compiled kernel, richest first, including ones this host cannot run.
pub fn list_kernels() -> impl Iterator<Item = &'static Kernel> {
    kernel::all_kernels().iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests here never leave a kernel installed that differs in behaviour
    // from the default, since other unit tests share the selector.

    #[test]
    fn resolves_to_a_supported_kernel() {
        let k = active_kernel();
        assert!(k.is_supported());
        assert_eq!(get_active_kernel(), k.name());
    }

    #[test]
    fn set_scalar_then_back() {
        assert!(set_active_kernel("scalar"));
        assert_eq!(get_active_kernel(), "scalar");
        assert!(active_ops().validate_utf8("naïve".as_bytes()));
        reset_active_kernel();
        assert!(active_kernel().is_supported());
    }

    #[test]
    fn refuses_unknown_names() {
        assert!(!set_active_kernel("nope"));
        assert!(!set_active_kernel("unsupported"));
        assert!(!set_active_kernel("SCALAR"));
        assert!(active_kernel().is_supported());
    }

    #[test]
    fn refuses_kernels_the_host_lacks() {
        for k in list_kernels().filter(|k| !k.is_supported()) {
            assert!(!set_active_kernel(k.name()), "{}", k.name());
        }
    }

    #[test]
    fn list_matches_registry() {
        let listed: Vec<_> = list_kernels().map(Kernel::name).collect();
        let registry: Vec<_> = kernel::all_kernels().iter().map(|k| k.name()).collect();
        assert_eq!(listed, registry);
        assert_eq!(listed.last(), Some(&"scalar"));
    }
}

//! Portable reference implementations.
//!
//! Every kernel delegates its tails and error reporting to these routines,
//! and the `scalar` kernel is built from nothing else.

pub mod ascii;
pub mod utf16;
pub mod utf32;
pub mod utf8;

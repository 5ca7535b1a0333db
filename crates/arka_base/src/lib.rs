//! Library defining cross library utilities that can be implemented using `#![no_std]`
#![no_std]

// `#[macro_export]` places the macros at the crate root
mod helper_macros;

//! Low level control laws.

pub mod flatness;

mod pid;
pub use pid::Pid3;

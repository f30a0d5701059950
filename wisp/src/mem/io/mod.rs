//! The memory-mapped peripherals that are not big enough to warrant their own module.

mod joypad;
mod timer;

pub use joypad::*;
pub use timer::*;

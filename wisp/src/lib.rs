//! Wisp is the emulation core of the project: a cycle-stepped model of the original monochrome
//! handheld. It contains the CPU, the LCD controller, the timer, the joypad, and the cartridge
//! controllers, all wired together on a shared bus by [`GameBoy`]. Rendering, input, and pacing
//! are left to front ends; the core only hands out finished frames as 2-bit color indices.
//!
//! # Notes
//! All timings are in machine cycles (1 MiHz). A frame is 17,556 of them.

pub mod bits;
pub mod cpu;
mod error;
mod gameboy;
pub mod lcd;
pub mod mem;
pub mod rom;

pub use error::Error;
pub use gameboy::*;

//! Cycle-accurate emulation core for the Nintendo Entertainment System.
//!
//! The crate couples a MOS 6502-compatible CPU with the Ricoh 2C02 PPU
//! through a shared bus, clocked 3 PPU dots per CPU cycle from a single
//! master tick. Cartridges are loaded from iNES v1 images and accessed
//! through pluggable mapper chips.
//!
//! The outer driver owns frame pacing and pixel output: it calls
//! [`NesSystem::clock`] with a [`PixelSink`] until the frame-complete flag
//! is raised, then hands the frame off and keeps going.

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate bitflags;

mod bus;
mod cartridge;
mod cpu;
mod mapper;
mod ppu;

pub use bus::{NesSystem, SystemBus};
pub use cartridge::{CartridgeError, CartridgeNes, Mirroring};
pub use cpu::Cpu6502;
pub use ppu::{Colour, FrameBuffer, PixelSink, Ppu2C02, PpuBus, DISPLAY_PALETTE};

pub const DISPLAY_WIDTH: usize = 256;
pub const DISPLAY_HEIGHT: usize = 240;

// Based on a NTSC system
pub const BASE_CPU_FREQUENCY: f32 = 1_789_773.0;
pub const BASE_PPU_FREQUENCY: f32 = 3.0 * BASE_CPU_FREQUENCY;

pub trait SystemControl {
    fn reset(&mut self);
}

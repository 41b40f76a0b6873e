//! Core traits and types for cycle-accurate emulation.
//!
//! The machine owns the clock; CPU cores are guests. Every memory and port
//! cycle goes through the [`Bus`] hooks, which account the base cycle cost
//! themselves. A core only adds time explicitly, via [`Bus::tick`]. No
//! exceptions.

mod bus;
mod cpu;
mod events;
mod ticks;

pub use bus::Bus;
pub use cpu::Cpu;
pub use events::{
    BREAKPOINT_HIT, CUSTOM_EVENT, END_OF_FRAME, EventsMask, FETCHES_LIMIT_HIT, MACHINE_STOPPED,
    NO_EVENTS, TICKS_LIMIT_HIT,
};
pub use ticks::Ticks;

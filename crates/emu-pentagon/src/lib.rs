//! Cycle-accurate Pentagon 128 emulation engine.
//!
//! The Pentagon is a Soviet-era ZX Spectrum 128 clone built from discrete
//! logic instead of a ULA. That changes two things compared to a Sinclair
//! 128K: there is no memory contention at all, and the frame is longer
//! (71,680 T-states of 224-tick lines). Everything else — $7FFD banking
//! with the one-way lock bit, the shadow screen in page 7, the TR-DOS ROM
//! overlay — works the banked-Spectrum way.
//!
//! The engine owns the clock, memory and raster state but not the CPU:
//! an instruction core implementing [`emu_core::Cpu`] is injected and
//! performs every bus cycle through the [`emu_core::Bus`] hooks, which the
//! engine uses to account time and to keep the screen output exact to the
//! tick. [`script::ScriptedCpu`] drives the machine deterministically where
//! a full instruction core is not wanted.

pub mod bus;
#[cfg(feature = "capture")]
pub mod capture;
mod clock;
mod contention;
mod marks;
mod memory;
mod palette;
mod pentagon;
pub mod script;
mod video;

pub use bus::PentagonBus;
pub use emu_core::{
    BREAKPOINT_HIT, CUSTOM_EVENT, END_OF_FRAME, EventsMask, FETCHES_LIMIT_HIT, MACHINE_STOPPED,
    NO_EVENTS, TICKS_LIMIT_HIT, Ticks,
};
pub use clock::{TICKS_PER_ACTIVE_INT, TICKS_PER_FRAME, TICKS_PER_LINE, TickClock};
pub use contention::{contention_wait, is_contended};
pub use marks::{MARK_BREAKPOINT, MARK_VISITED_INSTR, MemoryMarks};
pub use memory::{
    PAGE_SIZE, PagedMemory, ROM_PAGE_BASIC_48, ROM_PAGE_BASIC_128, ROM_PAGE_TRDOS, RAM_PAGE_COUNT,
    ROM_PAGE_COUNT,
};
pub use palette::{PALETTE, translate_colour};
pub use pentagon::Pentagon;
pub use video::{
    BORDER_WIDTH, BOTTOM_BORDER_HEIGHT, CHUNKS_PER_FRAME_LINE, FRAME_HEIGHT, FRAME_TICK_OFFSET,
    FRAME_WIDTH, PIXELS_PER_CHUNK, RASTER_START_LINE, SCREEN_HEIGHT, SCREEN_WIDTH,
    TOP_BORDER_HEIGHT, TOP_HIDDEN_LINES, Video, colour_attrs_addr, pixel_pattern_addr,
};

//! Pentagon bus: the engine side of every CPU cycle.
//!
//! All timing lives here. Each [`Bus`] hook accounts the base cost of its
//! cycle (4T opcode fetch, 3T memory access, 4T port access), so a CPU
//! core never adds time of its own for the standard part of a cycle —
//! only for the extra ticks of longer machine cycles, via [`Bus::tick`].
//!
//! # Renderer flushes
//!
//! Any cycle whose effect the raster could observe flushes the renderer
//! first: memory writes, and port writes that change the border colour or
//! the banking state. The flush target is the cycle's current tick plus
//! one, approximating the bus sampling the new value on the cycle's
//! second tick.
//!
//! # Contention
//!
//! Pentagon machines apply no contention, but the cycle structure keeps
//! the slots where a Sinclair ULA would insert waits. See the
//! [`contention`](crate::contention) module.

use std::collections::HashMap;

use emu_core::{
    BREAKPOINT_HIT, Bus, EventsMask, FETCHES_LIMIT_HIT, NO_EVENTS, TICKS_LIMIT_HIT, Ticks,
};

use crate::clock::{TICKS_PER_FRAME, TickClock};
use crate::contention::{contention_wait, is_contended};
use crate::marks::MemoryMarks;
use crate::memory::PagedMemory;
use crate::video::Video;

/// The Pentagon bus, implementing [`emu_core::Bus`].
///
/// Owns the memory, renderer, clock, and memory marks. The CPU reaches
/// all of these through the `Bus` hooks; the host reaches them through
/// the public fields, usually via the machine wrapper.
pub struct PentagonBus {
    pub memory: PagedMemory,
    pub video: Video,
    pub clock: TickClock,
    pub marks: MemoryMarks,
    /// Border colour (bits 0-2 of the last port $FE write).
    pub border_colour: u8,
    /// Values returned by input cycles, keyed by full 16-bit port.
    /// Unlisted ports read as $FF, an open bus with pull-ups.
    port_values: HashMap<u16, u8>,
    /// Events raised since the machine last cleared them.
    pub(crate) events: EventsMask,
    /// Remaining opcode fetches before `FETCHES_LIMIT_HIT`; 0 disables.
    fetches_to_stop: u32,
}

impl Default for PentagonBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PentagonBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: PagedMemory::new(),
            video: Video::new(),
            clock: TickClock::new(),
            marks: MemoryMarks::new(),
            border_colour: 0,
            port_values: HashMap::new(),
            events: NO_EVENTS,
            fetches_to_stop: 0,
        }
    }

    /// Set the value an input cycle on `port` returns.
    pub fn set_port_value(&mut self, port: u16, value: u8) {
        self.port_values.insert(port, value);
    }

    /// Events raised since the machine last cleared them.
    #[must_use]
    pub fn events(&self) -> EventsMask {
        self.events
    }

    /// Raise events for the machine to pick up at the next run-loop exit.
    pub fn raise_events(&mut self, events: EventsMask) {
        self.events |= events;
    }

    /// Arm or disarm (0) the opcode fetch budget.
    pub fn set_fetches_to_stop(&mut self, fetches: u32) {
        self.fetches_to_stop = fetches;
    }

    /// Catch the renderer up to `end_tick`.
    pub fn render_to_tick(&mut self, end_tick: Ticks) {
        self.video.render_to_tick(end_tick, &self.memory, self.border_colour);
    }

    /// Render the rest of the current frame.
    pub fn render_screen(&mut self) {
        self.render_to_tick(TICKS_PER_FRAME);
    }

    /// Wrap the clock into the next frame and rewind the renderer.
    ///
    /// The rest of the frame is rendered first: the latch flip-flop and
    /// the chunk buffer need every tick rendered exactly once, whether or
    /// not the host asked for pixels.
    pub fn start_new_frame(&mut self) {
        self.render_screen();
        self.clock.wrap_frame();
        self.video.start_new_frame();
    }

    /// The wait a contended model would insert at the current tick. Zero
    /// on the Pentagon; see the [`contention`](crate::contention) module.
    fn contention(&mut self) {
        let wait = contention_wait(self.clock.ticks());
        if wait > 0 {
            self.tick(wait);
        }
    }

    fn memory_contention(&mut self, addr: u16) {
        if is_contended(addr) {
            self.contention();
        }
    }

    /// The four-tick port cycle, with wait slots where a contended model
    /// would insert them. Even ports are the ones the video logic answers,
    /// so they get a wait slot even from uncontended addresses.
    fn port_contention(&mut self, port: u16) {
        if !is_contended(port) {
            if port & 1 == 0 {
                self.tick(1);
                self.contention();
                self.tick(3);
            } else {
                self.tick(4);
            }
        } else if port & 1 == 0 {
            self.contention();
            self.tick(1);
            self.contention();
            self.tick(3);
        } else {
            for _ in 0..4 {
                self.contention();
                self.tick(1);
            }
        }
    }
}

impl Bus for PentagonBus {
    fn fetch(&mut self, address: u16) -> u8 {
        // The fetch budget counts down before the fetch itself, so the
        // limit event surfaces before the budgeted instruction runs.
        if self.fetches_to_stop > 0 {
            self.fetches_to_stop -= 1;
            if self.fetches_to_stop == 0 {
                self.events |= FETCHES_LIMIT_HIT;
            }
        }

        self.memory_contention(address);
        self.tick(4);
        self.memory.read(address)
    }

    fn read(&mut self, address: u16) -> u8 {
        self.memory_contention(address);
        self.tick(3);
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        // The raster may fetch this byte; catch it up to the write first.
        self.render_to_tick(self.clock.ticks() + 1);

        self.memory_contention(address);
        self.tick(3);
        self.memory.write(address, value);
    }

    fn input(&mut self, port: u16) -> u8 {
        self.port_contention(port);
        self.port_values.get(&port).copied().unwrap_or(0xFF)
    }

    fn output(&mut self, port: u16, value: u8) {
        // Port $7FFD, partial decoding: bits 1 and 15 clear.
        if !self.memory.locked() && port & 0x8002 == 0 {
            self.render_to_tick(self.clock.ticks() + 1);
            self.memory.write_bank_register(value);
        }

        // Port $FE, partial decoding: bit 0 clear.
        if port & 0x0001 == 0 {
            self.render_to_tick(self.clock.ticks() + 1);
            self.border_colour = value & 0x07;
        }

        self.port_contention(port);
    }

    fn tick(&mut self, t: Ticks) {
        if self.clock.advance(t) {
            self.events |= TICKS_LIMIT_HIT;
        }
    }

    fn jump(&mut self, pc: u16) {
        self.memory.note_jump(pc);

        if self.marks.is_breakpoint(pc) {
            self.events |= BREAKPOINT_HIT;
        }
    }
}

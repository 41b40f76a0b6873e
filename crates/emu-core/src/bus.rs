//! Memory and I/O bus interface.

use crate::Ticks;

/// Memory and I/O bus interface, implemented by the machine.
///
/// The machine is the single source of timing truth: each hook applies wait
/// states and advances the clock by the base cost of the cycle it models
/// (4 T-states for an M1 fetch, 3 for a memory access, 4 for port I/O).
/// A CPU core therefore never ticks the clock for bus traffic; it only adds
/// its internal cycles through [`Bus::tick`].
pub trait Bus {
    /// M1 opcode fetch from the given address.
    ///
    /// Applies memory contention, advances the clock 4 ticks and counts the
    /// fetch against any armed fetch budget.
    fn fetch(&mut self, address: u16) -> u8;

    /// Read a byte from the given address. Contention plus 3 ticks.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address. Contention plus 3 ticks.
    ///
    /// The machine brings its raster output up to date before the value
    /// lands, so a write to video memory is visible from exactly the tick
    /// at which it happened.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte from the given I/O port. Port contention, 4 ticks.
    fn input(&mut self, port: u16) -> u8;

    /// Write a byte to the given I/O port. Port contention, 4 ticks.
    fn output(&mut self, port: u16, value: u8);

    /// Advance the clock by the core's internal (non-bus) cycles.
    fn tick(&mut self, t: Ticks);

    /// Notify the machine that the program counter changed.
    ///
    /// Cores call this whenever they update PC: after the natural advance
    /// past an instruction, on jumps and returns, and on interrupt entry.
    /// The machine uses it for ROM overlay traps and breakpoints.
    fn jump(&mut self, pc: u16);
}

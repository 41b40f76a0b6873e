//! CPU core trait.

use crate::Bus;

/// An instruction-stepped CPU core.
///
/// The machine drives the core at instruction granularity: `step` executes
/// one whole instruction, performing every memory and port cycle through the
/// bus hooks. Events (frame end, budgets, breakpoints, stop requests) are
/// observed between instructions, never inside one.
pub trait Cpu {
    /// Execute one instruction.
    fn step<B: Bus>(&mut self, bus: &mut B);

    /// Signal a maskable interrupt. Returns true if the core accepted it.
    ///
    /// An accepting core performs the acknowledge cycle through the bus
    /// (ticks, stack writes, the jump to the handler). A core with
    /// interrupts disabled returns false; the machine re-signals on the
    /// next instruction while the interrupt line is still active.
    fn interrupt<B: Bus>(&mut self, bus: &mut B) -> bool;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Set the program counter.
    ///
    /// This is the raw register write. Hosts should go through the
    /// machine-level setter, which also notifies the bus.
    fn set_pc(&mut self, pc: u16);

    /// Set the stack pointer.
    fn set_sp(&mut self, sp: u16);

    /// Reset the core to its power-on state.
    fn reset(&mut self);
}

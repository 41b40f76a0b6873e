//! Memory contention model.
//!
//! The Pentagon's video logic reads the screen from its own bus cycle slots
//! and never steals cycles from the CPU, so every wait is zero. The
//! contended range and the insertion points are kept anyway: the bus code
//! reads like the Sinclair 128K machines', and the timing stays honest if a
//! contended variant ever fills in [`contention_wait`].

use emu_core::Ticks;

/// Whether the address falls in the contended range (the low RAM quarter,
/// where the screen lives).
#[must_use]
pub fn is_contended(addr: u16) -> bool {
    (0x4000..0x8000).contains(&addr)
}

/// Wait states inserted before a cycle touching contended memory at the
/// given frame tick. Always zero on the Pentagon.
#[must_use]
pub fn contention_wait(_tick: Ticks) -> Ticks {
    0
}

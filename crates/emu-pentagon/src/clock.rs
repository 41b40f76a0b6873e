//! Frame-relative tick clock.
//!
//! The counter measures ticks since the start of the current frame (which
//! is also the start of the interrupt pulse). It only ever moves forward;
//! the scheduler normalizes it modulo the frame length when a new frame
//! begins, so overshoot from an instruction straddling the frame boundary
//! carries over instead of being lost.

use emu_core::Ticks;

/// T-states per frame. Pentagon lines are 224 ticks and a frame has 320
/// of them, which is longer than any Sinclair model.
pub const TICKS_PER_FRAME: Ticks = 71_680;

/// T-states per raster line.
pub const TICKS_PER_LINE: Ticks = 224;

/// Length of the interrupt pulse in ticks, measured from the frame start.
pub const TICKS_PER_ACTIVE_INT: Ticks = 32;

/// Tick counter plus an optional stop budget.
#[derive(Debug, Default)]
pub struct TickClock {
    /// Ticks since the start of the current frame.
    ticks: Ticks,
    /// Remaining tick budget; 0 means no limit.
    ticks_to_stop: Ticks,
}

impl TickClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Position within the current frame.
    #[must_use]
    pub fn ticks(&self) -> Ticks {
        self.ticks
    }

    /// Advance by `t` ticks. Returns true exactly when an armed budget is
    /// exhausted by this call (reaching or overshooting zero).
    pub fn advance(&mut self, t: Ticks) -> bool {
        self.ticks += t;

        if self.ticks_to_stop != 0 {
            if self.ticks_to_stop > t {
                self.ticks_to_stop -= t;
            } else {
                self.ticks_to_stop = 0;
                return true;
            }
        }
        false
    }

    /// Arm a tick budget; 0 disarms.
    pub fn set_ticks_to_stop(&mut self, t: Ticks) {
        self.ticks_to_stop = t;
    }

    /// Remaining budget, 0 when disarmed or exhausted.
    #[must_use]
    pub fn ticks_to_stop(&self) -> Ticks {
        self.ticks_to_stop
    }

    /// Reduce the counter modulo the frame length at a frame boundary.
    pub fn wrap_frame(&mut self) {
        self.ticks %= TICKS_PER_FRAME;
    }
}

//! Events reported by a machine's run loop.

/// Bit-or of the event flags below.
///
/// `run` clears the mask on entry and returns it when the loop stops. More
/// than one flag can be set: a tick budget can run out on the same
/// instruction that finishes the frame.
pub type EventsMask = u32;

/// No event has occurred.
pub const NO_EVENTS: EventsMask = 0;

/// An external stop request was observed.
pub const MACHINE_STOPPED: EventsMask = 1 << 0;

/// The tick counter reached the end of the frame.
pub const END_OF_FRAME: EventsMask = 1 << 1;

/// An armed tick budget was exhausted.
pub const TICKS_LIMIT_HIT: EventsMask = 1 << 2;

/// An armed M1-fetch budget was exhausted.
pub const FETCHES_LIMIT_HIT: EventsMask = 1 << 3;

/// Execution reached an address marked as a breakpoint.
pub const BREAKPOINT_HIT: EventsMask = 1 << 4;

/// Reserved for host-defined conditions.
pub const CUSTOM_EVENT: EventsMask = 1 << 31;

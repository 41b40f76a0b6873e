//! The fundamental unit of time in the emulator.

/// A count of clock ticks (T-states of the ~3.5 MHz crystal).
///
/// Tick arithmetic is pervasive in raster and contention code, so this stays
/// a plain `u32` rather than a newtype. A frame is well under 2^17 ticks and
/// the counter is normalized every frame, so the width is never a concern;
/// the one place that relies on wrap-around (the interrupt window test)
/// does so explicitly.
pub type Ticks = u32;

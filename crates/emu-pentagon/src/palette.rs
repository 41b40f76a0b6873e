//! Frame pixel colours.
//!
//! Frame pixels are 4-bit colour indices in brightness:GRB order: bit 3 is
//! brightness, bit 2 green, bit 1 red, bit 0 blue. Translation to ARGB32 is
//! a pure lookup; a set channel reads 0xFF at full brightness and 0xCC
//! otherwise.

/// ARGB32 values for all 16 colour indices.
pub const PALETTE: [u32; 16] = [
    0xFF00_0000, // 0: black
    0xFF00_00CC, // 1: blue
    0xFFCC_0000, // 2: red
    0xFFCC_00CC, // 3: magenta
    0xFF00_CC00, // 4: green
    0xFF00_CCCC, // 5: cyan
    0xFFCC_CC00, // 6: yellow
    0xFFCC_CCCC, // 7: white
    0xFF00_0000, // 8: bright black
    0xFF00_00FF, // 9: bright blue
    0xFFFF_0000, // 10: bright red
    0xFFFF_00FF, // 11: bright magenta
    0xFF00_FF00, // 12: bright green
    0xFF00_FFFF, // 13: bright cyan
    0xFFFF_FF00, // 14: bright yellow
    0xFFFF_FFFF, // 15: bright white
];

/// Translate a 4-bit colour index to ARGB32. High nibble bits are ignored.
#[must_use]
pub fn translate_colour(index: u8) -> u32 {
    PALETTE[(index & 0x0F) as usize]
}

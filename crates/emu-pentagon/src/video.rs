//! Catch-up raster renderer.
//!
//! The renderer follows the beam one tick (two pixels) at a time, but only
//! when asked: the bus calls [`Video::render_to_tick`] right before any
//! state a raster fetch could observe changes (video RAM writes, border and
//! banking writes), and at the end of the frame. Between those points the
//! beam has nothing new to see, so catching up lazily produces the same
//! output as running the beam every tick.
//!
//! # Geometry
//!
//! A frame is 320 lines of 224 ticks. The visible window is 352×280: 48
//! border pixels around a 256×192 screen, with 40 lines of bottom border.
//! The first 32 lines are vertical retrace and never drawn. The tick
//! counter starts at the interrupt pulse, which leads the beam's top-left
//! frame corner by 43 ticks ([`FRAME_TICK_OFFSET`]).
//!
//! # Latch pipeline
//!
//! Like the real video circuit, screen output goes through two stages of
//! latches. While the beam is inside a line's fetch window the renderer
//! alternates pattern and attribute fetches (one per tick, pattern first)
//! for the 8-pixel group one group ahead of the beam. When the beam enters
//! a group, the fetch latches are copied to a second pair that feeds the
//! pixel output. A CPU write therefore becomes visible no earlier than the
//! next group boundary, exactly one fetch window late — and since the bus
//! flushes the renderer before every write lands, never any earlier than
//! the write's own tick.
//!
//! Output pixels are 4-bit colour indices packed eight to a `u32` chunk,
//! most significant nibble leftmost. [`Video::translate_frame`] expands
//! them to ARGB32 through the palette.

use emu_core::Ticks;

use crate::clock::TICKS_PER_LINE;
use crate::memory::PagedMemory;
use crate::palette::translate_colour;

/// Horizontal pixels in the screen (paper) area.
pub const SCREEN_WIDTH: u32 = 256;

/// Vertical lines in the screen area.
pub const SCREEN_HEIGHT: u32 = 192;

/// Border pixels on each side of the screen area.
pub const BORDER_WIDTH: u32 = 48;

/// Visible border lines above the screen area.
pub const TOP_BORDER_HEIGHT: u32 = 48;

/// Visible border lines below the screen area.
pub const BOTTOM_BORDER_HEIGHT: u32 = 40;

/// Frame line where the screen area begins.
pub const RASTER_START_LINE: u32 = 80;

/// Frame lines hidden in vertical retrace before the border becomes
/// visible.
pub const TOP_HIDDEN_LINES: u32 = RASTER_START_LINE - TOP_BORDER_HEIGHT;

/// Beam position relative to the tick counter: the interrupt pulse leads
/// the beam's pass over the frame's top-left corner by 43 ticks.
pub const FRAME_TICK_OFFSET: i32 = BORDER_WIDTH as i32 / 2 - 4 - 63;

/// Total visible frame width in pixels.
pub const FRAME_WIDTH: u32 = BORDER_WIDTH + SCREEN_WIDTH + BORDER_WIDTH;

/// Total visible frame height in lines.
pub const FRAME_HEIGHT: u32 = TOP_BORDER_HEIGHT + SCREEN_HEIGHT + BOTTOM_BORDER_HEIGHT;

/// Frame pixels per packed output chunk.
pub const PIXELS_PER_CHUNK: u32 = 8;

/// Packed chunks per visible frame line.
pub const CHUNKS_PER_FRAME_LINE: u32 = FRAME_WIDTH / PIXELS_PER_CHUNK;

/// Bitmap address of the byte covering the given beam position.
///
/// The layout is the standard Spectrum interleave at $4000: the screen
/// splits into three 64-line thirds of $800 bytes, with the pixel row
/// bits folded between the character row and column.
///
/// # Panics
///
/// Panics if the position is outside the screen area.
#[must_use]
pub fn pixel_pattern_addr(frame_line: u32, pixel_in_line: u32) -> u16 {
    assert!((RASTER_START_LINE..RASTER_START_LINE + SCREEN_HEIGHT).contains(&frame_line));
    assert!((BORDER_WIDTH..BORDER_WIDTH + SCREEN_WIDTH).contains(&pixel_in_line));

    let mut addr = 0x4000;
    let mut line = frame_line - RASTER_START_LINE;

    // Third of the screen.
    addr += 0x800 * (line / 64);
    line %= 64;

    // Character row within the third.
    addr += 0x20 * (line / 8);
    line %= 8;

    // Pixel row within the character row.
    addr += 0x100 * line;

    // Column.
    addr += (pixel_in_line - BORDER_WIDTH) / 8;

    addr as u16
}

/// Attribute address of the cell covering the given beam position: a flat
/// 32×24 grid at $5800.
///
/// # Panics
///
/// Panics if the position is outside the screen area.
#[must_use]
pub fn colour_attrs_addr(frame_line: u32, pixel_in_line: u32) -> u16 {
    assert!((RASTER_START_LINE..RASTER_START_LINE + SCREEN_HEIGHT).contains(&frame_line));
    assert!((BORDER_WIDTH..BORDER_WIDTH + SCREEN_WIDTH).contains(&pixel_in_line));

    let line = frame_line - RASTER_START_LINE;
    let addr = 0x5800 + 0x20 * (line / 8) + (pixel_in_line - BORDER_WIDTH) / 8;

    addr as u16
}

/// Screen renderer state.
pub struct Video {
    /// How far into the frame the output has been rendered.
    render_tick: Ticks,
    /// Completed frame count, for flash phase.
    frame_counter: u32,
    /// 0x0000 or 0xFFFF; XORed into the pattern of flashing cells.
    flash_mask: u16,
    /// Fetch-stage latches, filled one group ahead of the beam.
    latched_pattern: u8,
    latched_attrs: u8,
    /// Display-stage latches, copied from the fetch stage at group starts.
    shadow_pattern: u8,
    shadow_attrs: u8,
    /// Alternates pattern/attribute fetches; starts on pattern and keeps
    /// its phase across frames (the per-line fetch count is even).
    latch_flipflop: bool,
    /// Border colour as sampled at the last border tick drawn.
    latched_border: u8,
    /// Packed 4-bit pixels, [`CHUNKS_PER_FRAME_LINE`] chunks per visible
    /// line.
    chunks: Vec<u32>,
    /// ARGB32 output of [`Video::translate_frame`].
    pixels: Vec<u32>,
}

impl Default for Video {
    fn default() -> Self {
        Self::new()
    }
}

impl Video {
    #[must_use]
    pub fn new() -> Self {
        Self {
            render_tick: 0,
            frame_counter: 0,
            flash_mask: 0,
            latched_pattern: 0,
            latched_attrs: 0,
            shadow_pattern: 0,
            shadow_attrs: 0,
            latch_flipflop: true,
            latched_border: 0,
            chunks: vec![0; (FRAME_HEIGHT * CHUNKS_PER_FRAME_LINE) as usize],
            pixels: vec![0; (FRAME_HEIGHT * FRAME_WIDTH) as usize],
        }
    }

    /// Begin a new frame: rewind the render cursor and advance the flash
    /// phase. The chunk buffer is not cleared; the next frame overwrites
    /// every visible pixel.
    pub fn start_new_frame(&mut self) {
        self.render_tick = 0;
        self.frame_counter += 1;
        if self.frame_counter % 16 == 0 {
            self.flash_mask ^= 0xFFFF;
        }
    }

    /// Render up to, but not including, `end_tick`. Append-only: ticks at
    /// or past the cursor render once, anything before it is already done.
    pub fn render_to_tick(&mut self, end_tick: Ticks, memory: &PagedMemory, border_colour: u8) {
        while self.render_tick < end_tick {
            // Beam position relative to the frame's top-left corner. The
            // first ticks of the frame precede it.
            let Some(frame_tick) = self.render_tick.checked_add_signed(FRAME_TICK_OFFSET) else {
                self.render_tick += 1;
                continue;
            };

            let frame_line = frame_tick / TICKS_PER_LINE;
            let pixel_in_line = (frame_tick % TICKS_PER_LINE) * 2;

            let in_screen_lines =
                (RASTER_START_LINE..RASTER_START_LINE + SCREEN_HEIGHT).contains(&frame_line);
            let in_latch_window = in_screen_lines
                && (BORDER_WIDTH - 8..BORDER_WIDTH + SCREEN_WIDTH - 8).contains(&pixel_in_line);
            let in_screen_area = in_screen_lines
                && (BORDER_WIDTH..BORDER_WIDTH + SCREEN_WIDTH).contains(&pixel_in_line);

            // At each group start the fetch latches move to the display
            // stage, before this tick's fetch can overwrite them.
            if in_screen_area && (pixel_in_line - BORDER_WIDTH) % PIXELS_PER_CHUNK == 0 {
                self.shadow_pattern = self.latched_pattern;
                self.shadow_attrs = self.latched_attrs;
            }

            // Fetch for the group one ahead of the beam. The first fetches
            // of each line happen while the beam is still in the border.
            if in_latch_window {
                if self.latch_flipflop {
                    let addr = pixel_pattern_addr(frame_line, pixel_in_line + 8);
                    self.latched_pattern = memory.vram_peek(addr);
                } else {
                    let addr = colour_attrs_addr(frame_line, pixel_in_line + 8);
                    self.latched_attrs = memory.vram_peek(addr);
                }
                self.latch_flipflop = !self.latch_flipflop;
            }

            if in_screen_area {
                let attr = self.shadow_attrs;
                let brightness = (attr >> 3) & 0x08;
                let ink = u32::from((attr & 0x07) | brightness);
                let paper = u32::from(((attr >> 3) & 0x07) | brightness);

                let mut pattern = u16::from(self.shadow_pattern);
                if attr & 0x80 != 0 {
                    pattern ^= self.flash_mask;
                }

                let pixel_in_group = (pixel_in_line - BORDER_WIDTH) % PIXELS_PER_CHUNK;
                let first = if pattern & (0x80 >> pixel_in_group) != 0 { ink } else { paper };
                let second = if pattern & (0x40 >> pixel_in_group) != 0 { ink } else { paper };

                let pixel_in_chunk = pixel_in_line % PIXELS_PER_CHUNK;
                let pixels_value = ((first << 28) | (second << 24)) >> (pixel_in_chunk * 4);
                let pixels_mask = 0xFF00_0000u32 >> (pixel_in_chunk * 4);

                let screen_line = frame_line - TOP_HIDDEN_LINES;
                let chunk_index = pixel_in_line / PIXELS_PER_CHUNK;
                let chunk = &mut self.chunks
                    [(screen_line * CHUNKS_PER_FRAME_LINE + chunk_index) as usize];
                *chunk = (*chunk & !pixels_mask) | pixels_value;

                self.render_tick += 1;
                continue;
            }

            // Border, wherever the beam is visible outside the screen area.
            let in_visible_area = (TOP_HIDDEN_LINES
                ..RASTER_START_LINE + SCREEN_HEIGHT + BOTTOM_BORDER_HEIGHT)
                .contains(&frame_line)
                && pixel_in_line < FRAME_WIDTH;

            if in_visible_area {
                // Pentagon border output is not aligned to 4-tick slots;
                // the register is sampled every tick.
                self.latched_border = border_colour;

                let pixel_in_chunk = pixel_in_line % PIXELS_PER_CHUNK;
                let pixels_value =
                    (0x1100_0000 * u32::from(self.latched_border)) >> (pixel_in_chunk * 4);
                let pixels_mask = 0xFF00_0000u32 >> (pixel_in_chunk * 4);

                let screen_line = frame_line - TOP_HIDDEN_LINES;
                let chunk_index = pixel_in_line / PIXELS_PER_CHUNK;
                let chunk = &mut self.chunks
                    [(screen_line * CHUNKS_PER_FRAME_LINE + chunk_index) as usize];
                *chunk = (*chunk & !pixels_mask) | pixels_value;
            }

            self.render_tick += 1;
        }
    }

    /// Expand the chunk buffer to ARGB32 and return it, row-major,
    /// [`FRAME_WIDTH`]×[`FRAME_HEIGHT`].
    pub fn translate_frame(&mut self) -> &[u32] {
        let mut p = 0;
        for &chunk in &self.chunks {
            for nibble in (0..PIXELS_PER_CHUNK).rev() {
                self.pixels[p] = translate_colour(((chunk >> (nibble * 4)) & 0x0F) as u8);
                p += 1;
            }
        }
        &self.pixels
    }

    /// Packed pixel chunks, [`CHUNKS_PER_FRAME_LINE`] per visible line.
    #[must_use]
    pub fn chunks(&self) -> &[u32] {
        &self.chunks
    }

    /// Current render cursor position within the frame.
    #[must_use]
    pub fn render_tick(&self) -> Ticks {
        self.render_tick
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter
    }

    /// Current flash mask (0x0000 or 0xFFFF).
    #[must_use]
    pub fn flash_mask(&self) -> u16 {
        self.flash_mask
    }
}

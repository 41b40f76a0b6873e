//! Headless capture: PNG screenshots and frame sequences.

use std::error::Error;
use std::fs;
use std::path::Path;

use emu_core::{Cpu, END_OF_FRAME};

use crate::pentagon::Pentagon;
use crate::video::{FRAME_HEIGHT, FRAME_WIDTH};

/// Finish rendering the current frame and save it as a PNG file.
///
/// The frame is ARGB32 (`u32` array). This converts to RGBA bytes for
/// the PNG encoder.
pub fn save_screenshot<C: Cpu>(
    machine: &mut Pentagon<C>,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let pixels = machine.frame_pixels();

    let file = fs::File::create(path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, FRAME_WIDTH, FRAME_HEIGHT);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    // Convert ARGB32 → RGBA bytes
    let mut rgba = Vec::with_capacity((FRAME_WIDTH * FRAME_HEIGHT * 4) as usize);
    for &pixel in pixels {
        rgba.push(((pixel >> 16) & 0xFF) as u8);
        rgba.push(((pixel >> 8) & 0xFF) as u8);
        rgba.push((pixel & 0xFF) as u8);
        rgba.push(0xFF); // Alpha
    }

    writer.write_image_data(&rgba)?;
    Ok(())
}

/// Run the machine until the current frame is complete.
pub fn run_to_frame_end<C: Cpu>(machine: &mut Pentagon<C>) {
    while machine.run() & END_OF_FRAME == 0 {}
}

/// Save a sequence of frames as numbered PNGs in a directory.
///
/// Creates `dir/000001.png`, `dir/000002.png`, etc.
pub fn save_frame_sequence<C: Cpu>(
    machine: &mut Pentagon<C>,
    dir: &Path,
    num_frames: u32,
) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;

    for i in 1..=num_frames {
        run_to_frame_end(machine);
        let filename = dir.join(format!("{i:06}.png"));
        save_screenshot(machine, &filename)?;
    }

    Ok(())
}

//! Minimal runner for the Pentagon machine core.
//!
//! The engine ships no ROM images and no instruction core, so the runner
//! drives a built-in raster demo: a scripted driver repaints the border in
//! bands, flips to the shadow screen at mid-frame, and the screen pages
//! hold colour test patterns with bright and flashing regions. Either runs
//! a windowed frontend or captures PNG frames in headless mode.

use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};

use emu_pentagon::script::{ScriptOp, ScriptedCpu};
use emu_pentagon::{
    BORDER_WIDTH, FRAME_HEIGHT, FRAME_WIDTH, Pentagon, RASTER_START_LINE, TICKS_PER_FRAME, capture,
    colour_attrs_addr, pixel_pattern_addr,
};
use pixels::{Pixels, SurfaceTexture};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

const SCALE: u32 = 3;
const FRAME_DURATION: Duration = Duration::from_millis(20); // ~50 Hz

/// Where the demo script executes from.
const DEMO_BASE: u16 = 0x8000;

/// Border bands per frame; one frame is exactly eight bands.
const BAND_TICKS: u32 = TICKS_PER_FRAME / 8;

struct CliArgs {
    headless: bool,
    frames: u32,
    screenshot_path: Option<PathBuf>,
    frame_dir: Option<PathBuf>,
}

fn print_usage_and_exit(code: i32) -> ! {
    eprintln!("Usage: pentagon-runner [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --headless     Run without a window");
    eprintln!("  --frames <n>   Frames to run in headless mode [default: 100]");
    eprintln!("  --screenshot <file.png>  Save the final frame (headless)");
    eprintln!("  --frame-dir <dir>  Save every frame as numbered PNGs (headless)");
    eprintln!("  -h, --help     Show this help");
    process::exit(code);
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut headless = false;
    let mut frames = 100;
    let mut screenshot_path: Option<PathBuf> = None;
    let mut frame_dir: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--headless" => {
                headless = true;
            }
            "--frames" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    frames = value.parse().unwrap_or(100);
                }
            }
            "--screenshot" => {
                i += 1;
                screenshot_path = args.get(i).map(PathBuf::from);
            }
            "--frame-dir" => {
                i += 1;
                frame_dir = args.get(i).map(PathBuf::from);
            }
            "-h" | "--help" => print_usage_and_exit(0),
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage_and_exit(1);
            }
        }
        i += 1;
    }

    if screenshot_path.is_some() || frame_dir.is_some() {
        headless = true;
    }

    CliArgs {
        headless,
        frames,
        screenshot_path,
        frame_dir,
    }
}

/// One frame of scripted bus traffic: eight border bands, the normal
/// screen for the top half and the shadow screen for the bottom half.
/// The ops add up to exactly one frame, so the loop stays locked to the
/// raster.
fn demo_script() -> Vec<ScriptOp> {
    let mut script = Vec::new();
    for band in 0..8u8 {
        // Each op costs its 4-tick opcode fetch on top of the cycle.
        script.push(ScriptOp::Out { port: 0x00FE, value: band });
        let mut used = 8;

        match band {
            0 => {
                script.push(ScriptOp::Out { port: 0x7FFD, value: 0x10 });
                used += 8;
            }
            4 => {
                script.push(ScriptOp::Out { port: 0x7FFD, value: 0x18 });
                used += 8;
            }
            _ => {}
        }

        if band == 7 {
            // Leave room for the closing jump back to the base address.
            script.push(ScriptOp::Idle { ticks: BAND_TICKS - used - 8 });
            script.push(ScriptOp::Jump { addr: DEMO_BASE });
        } else {
            script.push(ScriptOp::Idle { ticks: BAND_TICKS - used - 4 });
        }
    }
    script
}

/// Paint test patterns into both screen pages.
///
/// Page 5 (normal): paper bars, bright paper bars, fine ink stripes, and
/// a flashing strip. Page 7 (shadow): the same bars rotated, so the
/// mid-frame page flip is obvious.
fn fill_demo_screens(machine: &mut Pentagon<ScriptedCpu>) {
    for row in 0..24u16 {
        for col in 0..32u16 {
            let frame_line = RASTER_START_LINE + u32::from(row) * 8;
            let pixel = BORDER_WIDTH + u32::from(col) * 8;
            let attr_addr = colour_attrs_addr(frame_line, pixel);

            let bar = (col / 4) as u8;
            let (attr, pattern) = match row {
                0..=7 => (bar << 3, 0x00),
                8..=15 => (0x40 | (bar << 3), 0x00),
                16..=19 => (bar | 0x38, 0xAA),
                _ => (0x80 | 0x07 | (bar << 3), 0x0F),
            };

            let shadow_bar = (bar + 4) & 7;
            let shadow_attr = (attr & 0xC7) | (shadow_bar << 3);

            let memory = &mut machine.bus_mut().memory;
            memory.set_ram_page_byte(5, attr_addr, attr);
            memory.set_ram_page_byte(7, attr_addr, shadow_attr);
            for pixel_row in 0..8 {
                let pattern_addr = pixel_pattern_addr(frame_line + pixel_row, pixel);
                memory.set_ram_page_byte(5, pattern_addr, pattern);
                memory.set_ram_page_byte(7, pattern_addr, pattern);
            }
        }
    }
}

fn make_machine() -> Pentagon<ScriptedCpu> {
    let mut cpu = ScriptedCpu::new(demo_script());
    cpu.set_looping(true);

    let mut machine = Pentagon::new(cpu);
    machine.set_pc(DEMO_BASE);
    fill_demo_screens(&mut machine);
    machine
}

fn run_headless(cli: &CliArgs) {
    let mut machine = make_machine();

    if let Some(dir) = &cli.frame_dir {
        if let Err(e) = capture::save_frame_sequence(&mut machine, dir, cli.frames) {
            eprintln!("Failed to save frames to {}: {e}", dir.display());
            process::exit(1);
        }
        eprintln!("Saved {} frames to {}", cli.frames, dir.display());
    } else {
        for _ in 0..cli.frames {
            capture::run_to_frame_end(&mut machine);
        }
        eprintln!("Ran {} frames", cli.frames);
    }

    if let Some(path) = &cli.screenshot_path {
        if let Err(e) = capture::save_screenshot(&mut machine, path) {
            eprintln!("Failed to save screenshot {}: {e}", path.display());
            process::exit(1);
        }
        eprintln!("Screenshot saved to {}", path.display());
    }
}

struct App {
    machine: Pentagon<ScriptedCpu>,
    window: Option<&'static Window>,
    pixels: Option<Pixels<'static>>,
    last_frame_time: Instant,
}

impl App {
    fn new(machine: Pentagon<ScriptedCpu>) -> Self {
        Self {
            machine,
            window: None,
            pixels: None,
            last_frame_time: Instant::now(),
        }
    }

    fn update_pixels(&mut self) {
        let Some(pixels) = self.pixels.as_mut() else {
            return;
        };

        let frame = pixels.frame_mut();
        for (i, &argb) in self.machine.frame_pixels().iter().enumerate() {
            let o = i * 4;
            frame[o] = ((argb >> 16) & 0xFF) as u8; // R
            frame[o + 1] = ((argb >> 8) & 0xFF) as u8; // G
            frame[o + 2] = (argb & 0xFF) as u8; // B
            frame[o + 3] = ((argb >> 24) & 0xFF) as u8; // A
        }
    }

    fn handle_keyboard_input(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        if code == KeyCode::Escape && event.state == ElementState::Pressed {
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = winit::dpi::LogicalSize::new(FRAME_WIDTH * SCALE, FRAME_HEIGHT * SCALE);
        let attrs = WindowAttributes::default()
            .with_title("Pentagon 128")
            .with_inner_size(size)
            .with_resizable(false);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                let window: &'static Window = Box::leak(Box::new(window));
                let inner = window.inner_size();
                let surface = SurfaceTexture::new(inner.width, inner.height, window);
                let pixels = match Pixels::new(FRAME_WIDTH, FRAME_HEIGHT, surface) {
                    Ok(pixels) => pixels,
                    Err(e) => {
                        eprintln!("Failed to create pixels surface: {e}");
                        event_loop.exit();
                        return;
                    }
                };

                self.pixels = Some(pixels);
                self.window = Some(window);
            }
            Err(e) => {
                eprintln!("Failed to create window: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_keyboard_input(event_loop, &event);
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if now.duration_since(self.last_frame_time) >= FRAME_DURATION {
                    capture::run_to_frame_end(&mut self.machine);
                    self.update_pixels();
                    self.last_frame_time = now;
                }

                if let Some(pixels) = self.pixels.as_ref()
                    && let Err(e) = pixels.render()
                {
                    eprintln!("Render error: {e}");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    let cli = parse_args();

    if cli.headless {
        run_headless(&cli);
        return;
    }

    let mut app = App::new(make_machine());

    let event_loop = match EventLoop::new() {
        Ok(loop_) => loop_,
        Err(e) => {
            eprintln!("Failed to create event loop: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = event_loop.run_app(&mut app) {
        eprintln!("Event loop error: {e}");
        process::exit(1);
    }
}

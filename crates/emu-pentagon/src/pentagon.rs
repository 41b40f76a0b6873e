//! Top-level Pentagon machine.
//!
//! [`Pentagon`] pairs an injected CPU core with the [`PentagonBus`] and
//! drives the frame loop. The machine does not ship a core of its own:
//! anything implementing [`emu_core::Cpu`] fits, from a full instruction
//! set emulator down to the scripted drivers in [`crate::script`].
//!
//! # Frame loop
//!
//! [`Pentagon::run`] executes instructions until an event stops it or the
//! frame's 71,680 ticks are spent, signalling `END_OF_FRAME` in the latter
//! case. The interrupt line is held active for the first 32 ticks of each
//! frame; ~INT is sampled during the last tick of the previous
//! instruction, so the core is offered the interrupt when that tick, not
//! the current one, falls inside the window.

use emu_core::{Bus, Cpu, END_OF_FRAME, EventsMask, MACHINE_STOPPED, NO_EVENTS, Ticks};

use crate::bus::PentagonBus;
use crate::clock::{TICKS_PER_ACTIVE_INT, TICKS_PER_FRAME};

/// Pentagon 128 machine: an injected CPU core plus the engine bus.
pub struct Pentagon<C: Cpu> {
    cpu: C,
    bus: PentagonBus,
    /// True if interrupts are not signalled at the start of frames.
    int_suppressed: bool,
}

impl<C: Cpu> Pentagon<C> {
    #[must_use]
    pub fn new(cpu: C) -> Self {
        Self {
            cpu,
            bus: PentagonBus::new(),
            int_suppressed: false,
        }
    }

    /// Execute instructions until an event is raised or the frame ends.
    ///
    /// Clears pending events first, then steps the core. Returns the
    /// events that stopped the loop; `END_OF_FRAME` is included whenever
    /// the frame's tick budget is spent, and the next call starts the new
    /// frame.
    pub fn run(&mut self) -> EventsMask {
        // Normalize the tick counter left over from the previous frame.
        if self.bus.clock.ticks() >= TICKS_PER_FRAME {
            self.bus.start_new_frame();
        }

        self.bus.events = NO_EVENTS;

        while self.bus.events == NO_EVENTS && self.bus.clock.ticks() < TICKS_PER_FRAME {
            if !self.int_suppressed {
                // ~INT is sampled during the last tick of the previous
                // instruction, so look at that tick, not the current one.
                // At tick 0 there is no previous tick yet.
                let previous_tick = self.bus.clock.ticks().wrapping_sub(1);
                if previous_tick < TICKS_PER_ACTIVE_INT {
                    self.cpu.interrupt(&mut self.bus);
                }
            }

            self.cpu.step(&mut self.bus);
        }

        if self.bus.clock.ticks() >= TICKS_PER_FRAME {
            self.bus.events |= END_OF_FRAME;
        }

        self.bus.events
    }

    /// Request the run loop to exit with `MACHINE_STOPPED`.
    pub fn stop(&mut self) {
        self.bus.events |= MACHINE_STOPPED;
    }

    /// Events raised since the current run-loop pass started.
    #[must_use]
    pub fn events(&self) -> EventsMask {
        self.bus.events()
    }

    /// Reset the CPU core and the memory system. The clock and the
    /// renderer keep their position in the frame.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.memory.reset();
    }

    /// Suppress or restore the start-of-frame interrupt.
    pub fn set_int_suppressed(&mut self, suppressed: bool) {
        self.int_suppressed = suppressed;
    }

    /// Arm or disarm (0) the tick budget ending `run` with
    /// `TICKS_LIMIT_HIT`.
    pub fn set_ticks_to_stop(&mut self, ticks: Ticks) {
        self.bus.clock.set_ticks_to_stop(ticks);
    }

    /// Arm or disarm (0) the opcode fetch budget ending `run` with
    /// `FETCHES_LIMIT_HIT`.
    pub fn set_fetches_to_stop(&mut self, fetches: u32) {
        self.bus.set_fetches_to_stop(fetches);
    }

    /// Ticks since the start of the current frame.
    #[must_use]
    pub fn ticks(&self) -> Ticks {
        self.bus.clock.ticks()
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_counter(&self) -> u32 {
        self.bus.video.frame_counter()
    }

    /// Current program counter of the core.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    /// Move the program counter, driving the bus jump hook so the TR-DOS
    /// overlay and breakpoints see the change.
    pub fn set_pc(&mut self, pc: u16) {
        self.bus.jump(pc);
        self.cpu.set_pc(pc);
    }

    /// Set the core's stack pointer.
    pub fn set_sp(&mut self, sp: u16) {
        self.cpu.set_sp(sp);
    }

    /// Write a byte through the slot table. ROM-immune, no bus time.
    pub fn set_memory_byte(&mut self, addr: u16, value: u8) {
        self.bus.memory.write(addr, value);
    }

    /// Write consecutive bytes through the slot table.
    pub fn write_ram(&mut self, addr: u16, data: &[u8]) {
        for (i, &value) in data.iter().enumerate() {
            self.bus.memory.write(addr.wrapping_add(i as u16), value);
        }
    }

    /// Load a ROM page's contents from the start (up to 16K).
    pub fn write_rom_page(&mut self, page: u8, data: &[u8]) {
        self.bus.memory.write_rom_page(page, data);
    }

    /// Load a RAM page's contents from the start (up to 16K).
    pub fn write_ram_page(&mut self, page: u8, data: &[u8]) {
        self.bus.memory.write_ram_page(page, data);
    }

    /// Read a byte of a RAM page directly.
    #[must_use]
    pub fn read_page(&self, page: u8, addr: u16) -> u8 {
        self.bus.memory.read_page(page, addr)
    }

    /// Set the value an input cycle on `port` returns.
    pub fn set_port_value(&mut self, port: u16, value: u8) {
        self.bus.set_port_value(port, value);
    }

    /// Mark an address (breakpoints and similar).
    pub fn mark_addr(&mut self, addr: u16, marks: u8) {
        self.bus.marks.mark_addr(addr, marks);
    }

    /// Mark a run of addresses.
    pub fn mark_addrs(&mut self, addr: u16, len: u16, marks: u8) {
        self.bus.marks.mark_addrs(addr, len, marks);
    }

    /// Clear marks on a run of addresses.
    pub fn unmark_addrs(&mut self, addr: u16, len: u16, marks: u8) {
        self.bus.marks.unmark_addrs(addr, len, marks);
    }

    /// Marks recorded at an address.
    #[must_use]
    pub fn marks_at(&self, addr: u16) -> u8 {
        self.bus.marks.at(addr)
    }

    /// Render the rest of the current frame.
    pub fn render_screen(&mut self) {
        self.bus.render_screen();
    }

    /// Finish rendering the frame and translate it to ARGB32 pixels,
    /// row-major, `FRAME_WIDTH`×`FRAME_HEIGHT`.
    pub fn frame_pixels(&mut self) -> &[u32] {
        self.bus.render_screen();
        self.bus.video.translate_frame()
    }

    /// Reference to the CPU core.
    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    /// Mutable reference to the CPU core.
    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &PentagonBus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut PentagonBus {
        &mut self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::{BREAKPOINT_HIT, FETCHES_LIMIT_HIT, TICKS_LIMIT_HIT};

    use crate::marks::MARK_BREAKPOINT;
    use crate::script::{IdleCpu, InterruptResponse, ScriptOp, ScriptedCpu};
    use crate::video::{FRAME_HEIGHT, FRAME_WIDTH};

    #[test]
    fn run_ends_the_frame_exactly() {
        let mut machine = Pentagon::new(IdleCpu::new());
        let events = machine.run();
        assert_eq!(events, END_OF_FRAME);
        // 4-tick fetches divide the frame length evenly.
        assert_eq!(machine.ticks(), TICKS_PER_FRAME);
    }

    #[test]
    fn next_run_starts_a_new_frame() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.run();
        assert_eq!(machine.frame_counter(), 0);

        machine.run();
        assert_eq!(machine.frame_counter(), 1);
        assert_eq!(machine.ticks(), TICKS_PER_FRAME, "second frame complete");
    }

    #[test]
    fn interrupt_accepted_once_per_window() {
        let mut cpu = ScriptedCpu::new(vec![]);
        cpu.set_interrupt_response(InterruptResponse::Accept { handler: 0x0038 });
        let mut machine = Pentagon::new(cpu);
        machine.set_pc(0x9000);
        machine.set_sp(0xC000);

        let events = machine.run();
        assert_eq!(events, END_OF_FRAME);
        assert_eq!(machine.cpu().accepted_interrupts(), 1);
        assert_eq!(machine.pc(), 0x0038);

        // The return address on the stack is the PC at acceptance.
        assert_eq!(machine.read_page(2, 0x3FFF), 0x90);
        assert_eq!(machine.read_page(2, 0x3FFE), 0x00);
    }

    #[test]
    fn no_interrupt_on_the_very_first_tick() {
        // The line is sampled during the previous instruction's last
        // tick; at tick 0 there has been none, so the first chance to
        // accept comes after the first instruction.
        let mut cpu = ScriptedCpu::new(vec![]);
        cpu.set_interrupt_response(InterruptResponse::Accept { handler: 0x0038 });
        let mut machine = Pentagon::new(cpu);
        machine.set_sp(0xC000);
        machine.set_ticks_to_stop(4);

        let events = machine.run();
        assert_eq!(events, TICKS_LIMIT_HIT);
        assert_eq!(machine.cpu().accepted_interrupts(), 0, "only one fetch ran");
        assert_eq!(machine.ticks(), 4);
    }

    #[test]
    fn suppressed_interrupt_never_fires() {
        let mut cpu = ScriptedCpu::new(vec![]);
        cpu.set_interrupt_response(InterruptResponse::Accept { handler: 0x0038 });
        let mut machine = Pentagon::new(cpu);
        machine.set_sp(0xC000);
        machine.set_int_suppressed(true);

        machine.run();
        assert_eq!(machine.cpu().accepted_interrupts(), 0);
    }

    #[test]
    fn interrupt_fires_again_next_frame_when_armed() {
        let mut cpu = ScriptedCpu::new(vec![]);
        cpu.set_interrupt_response(InterruptResponse::Accept { handler: 0x0038 });
        let mut machine = Pentagon::new(cpu);
        machine.set_sp(0xC000);

        machine.run();
        machine.cpu_mut().arm_interrupt();
        machine.run();
        assert_eq!(machine.cpu().accepted_interrupts(), 2);
    }

    #[test]
    fn tick_budget_stops_the_run() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.set_ticks_to_stop(100);

        let events = machine.run();
        assert_eq!(events, TICKS_LIMIT_HIT);
        assert_eq!(machine.ticks(), 100, "4-tick steps land exactly");

        // Disarmed after firing; the frame finishes on the next run.
        let events = machine.run();
        assert_eq!(events, END_OF_FRAME);
    }

    #[test]
    fn fetch_budget_stops_the_run() {
        let mut machine = Pentagon::new(ScriptedCpu::new(vec![]));
        machine.set_fetches_to_stop(3);

        let events = machine.run();
        assert_eq!(events, FETCHES_LIMIT_HIT);
        assert_eq!(machine.ticks(), 12, "the budgeted fetch completes");
    }

    #[test]
    fn breakpoint_stops_the_run() {
        let script = vec![ScriptOp::Idle { ticks: 0 }; 4];
        let mut machine = Pentagon::new(ScriptedCpu::new(script));
        machine.mark_addr(0x0002, MARK_BREAKPOINT);

        let events = machine.run();
        assert_eq!(events, BREAKPOINT_HIT);
        assert_eq!(machine.pc(), 0x0002, "stopped on arrival, before executing");
        assert_eq!(machine.marks_at(0x0002), MARK_BREAKPOINT);
    }

    #[test]
    fn stop_raises_machine_stopped() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.stop();
        assert_eq!(machine.events(), MACHINE_STOPPED);
    }

    #[test]
    fn banking_output_reaches_memory() {
        let script = vec![
            ScriptOp::Out { port: 0x7FFD, value: 0x17 }, // page 7 + ROM 48
            ScriptOp::Halt,
        ];
        let mut machine = Pentagon::new(ScriptedCpu::new(script));
        machine.set_ticks_to_stop(50);
        machine.run();

        assert_eq!(machine.bus().memory.slots(), [1, 5, 2, 7]);
    }

    #[test]
    fn reset_restores_banking_but_not_the_clock() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.bus_mut().memory.write_bank_register(0x27); // page 7 + lock
        machine.set_ticks_to_stop(100);
        machine.run();
        assert!(machine.bus().memory.locked());

        let ticks_before = machine.ticks();
        machine.reset();
        assert_eq!(machine.bus().memory.slots(), [1, 5, 2, 0]);
        assert!(!machine.bus().memory.locked());
        assert_eq!(machine.pc(), 0);
        assert_eq!(machine.ticks(), ticks_before, "clock keeps its position");
    }

    #[test]
    fn set_pc_drives_the_overlay() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.set_pc(0x3D2F);
        assert!(machine.bus().memory.dos_active());
        machine.set_pc(0x8000);
        assert!(!machine.bus().memory.dos_active());
    }

    #[test]
    fn memory_helpers_are_rom_immune() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.set_memory_byte(0x0000, 0xFF);
        assert_eq!(machine.bus().memory.read(0x0000), 0x00);

        machine.write_ram(0x7FFF, &[0xAA, 0xBB]);
        assert_eq!(machine.read_page(5, 0x3FFF), 0xAA);
        assert_eq!(machine.read_page(2, 0x0000), 0xBB, "crosses the slot edge");
    }

    #[test]
    fn frame_pixels_covers_the_visible_frame() {
        let mut machine = Pentagon::new(IdleCpu::new());
        machine.bus_mut().border_colour = 2;

        let pixels = machine.frame_pixels();
        assert_eq!(pixels.len(), (FRAME_WIDTH * FRAME_HEIGHT) as usize);
        assert_eq!(pixels[0], 0xFFCC_0000, "red border corner");
    }

    #[test]
    fn port_reads_reach_the_core() {
        let script = vec![ScriptOp::In { port: 0xFEFE }, ScriptOp::Halt];
        let mut machine = Pentagon::new(ScriptedCpu::new(script));
        machine.set_port_value(0xFEFE, 0xBE);
        machine.set_fetches_to_stop(2);
        machine.run();
        // The scripted core discards the value; what matters is the
        // cycle's cost reaching the clock: fetch 4 + port 4 + fetch 4.
        assert_eq!(machine.ticks(), 12);
    }
}

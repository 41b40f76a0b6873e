//! Scripted bus drivers.
//!
//! [`ScriptedCpu`] is a [`Cpu`] that plays a fixed list of bus operations
//! instead of decoding instructions. It keeps the shape of real execution
//! — every step starts with an opcode fetch, the program counter advances,
//! the jump hook fires on every PC change — so the engine's timing,
//! banking and raster behaviour can be pinned down deterministically
//! without an instruction set emulator in the loop. [`IdleCpu`] is the
//! degenerate case: it just burns fetch cycles.

use emu_core::{Bus, Cpu, Ticks};

/// One scripted pseudo-instruction. Each costs an opcode fetch (4 ticks)
/// plus whatever bus traffic the operation itself drives.
#[derive(Clone, Copy, Debug)]
pub enum ScriptOp {
    /// Write a byte through a memory write cycle.
    Write { addr: u16, value: u8 },
    /// Drive a memory read cycle; the value is discarded.
    Read { addr: u16 },
    /// Drive an output cycle.
    Out { port: u16, value: u8 },
    /// Drive an input cycle; the value is discarded.
    In { port: u16 },
    /// Burn extra execution ticks, as a longer instruction would.
    Idle { ticks: Ticks },
    /// Transfer control to `addr`.
    Jump { addr: u16 },
    /// Stop executing; every later step only fetches at the current PC.
    Halt,
}

/// How the scripted core answers the interrupt line.
#[derive(Clone, Copy, Debug)]
pub enum InterruptResponse {
    /// Never accept (interrupts disabled).
    Ignore,
    /// Accept with IM 1 timing — 7 ticks of acknowledge, push the return
    /// address, continue at `handler`.
    Accept { handler: u16 },
}

/// A CPU core that plays a fixed script of bus operations.
///
/// Out of script (or after [`ScriptOp::Halt`]), the core keeps fetching
/// at the current PC like a halted Z80, unless looping is enabled.
///
/// An accepted interrupt disarms the line, as acknowledging one clears
/// IFF1 on a real core; re-arm with [`ScriptedCpu::arm_interrupt`].
pub struct ScriptedCpu {
    script: Vec<ScriptOp>,
    cursor: usize,
    looping: bool,
    pc: u16,
    sp: u16,
    halted: bool,
    interrupt_response: InterruptResponse,
    int_armed: bool,
    accepted_interrupts: u32,
}

impl ScriptedCpu {
    #[must_use]
    pub fn new(script: Vec<ScriptOp>) -> Self {
        Self {
            script,
            cursor: 0,
            looping: false,
            pc: 0,
            sp: 0,
            halted: false,
            interrupt_response: InterruptResponse::Ignore,
            int_armed: true,
            accepted_interrupts: 0,
        }
    }

    /// Restart the script from the beginning once it runs out.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_interrupt_response(&mut self, response: InterruptResponse) {
        self.interrupt_response = response;
    }

    /// Re-arm the interrupt line after an acceptance, like EI would.
    pub fn arm_interrupt(&mut self) {
        self.int_armed = true;
    }

    /// Number of interrupts accepted so far.
    #[must_use]
    pub fn accepted_interrupts(&self) -> u32 {
        self.accepted_interrupts
    }

    /// Whether the core has stopped executing script operations.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl Cpu for ScriptedCpu {
    fn step<B: Bus>(&mut self, bus: &mut B) {
        bus.fetch(self.pc);

        if !self.halted && self.cursor >= self.script.len() {
            if self.looping && !self.script.is_empty() {
                self.cursor = 0;
            } else {
                self.halted = true;
            }
        }
        if self.halted {
            return;
        }

        let op = self.script[self.cursor];
        self.cursor += 1;

        match op {
            ScriptOp::Write { addr, value } => bus.write(addr, value),
            ScriptOp::Read { addr } => {
                bus.read(addr);
            }
            ScriptOp::Out { port, value } => bus.output(port, value),
            ScriptOp::In { port } => {
                bus.input(port);
            }
            ScriptOp::Idle { ticks } => bus.tick(ticks),
            ScriptOp::Jump { addr } => {
                self.pc = addr;
                bus.jump(self.pc);
                return;
            }
            ScriptOp::Halt => {
                self.halted = true;
                return;
            }
        }

        self.pc = self.pc.wrapping_add(1);
        bus.jump(self.pc);
    }

    fn interrupt<B: Bus>(&mut self, bus: &mut B) -> bool {
        let InterruptResponse::Accept { handler } = self.interrupt_response else {
            return false;
        };
        if !self.int_armed {
            return false;
        }

        self.int_armed = false;
        self.halted = false;
        self.accepted_interrupts += 1;

        // IM 1: 7-tick acknowledge, then push the return address.
        bus.tick(7);
        let ret = self.pc;
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (ret >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (ret & 0xFF) as u8);

        self.pc = handler;
        bus.jump(self.pc);
        true
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    fn set_sp(&mut self, sp: u16) {
        self.sp = sp;
    }

    fn reset(&mut self) {
        self.pc = 0;
        self.sp = 0;
        self.cursor = 0;
        self.halted = false;
        self.int_armed = true;
    }
}

/// A core that fetches at a fixed address forever and ignores interrupts.
pub struct IdleCpu {
    pc: u16,
}

impl Default for IdleCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl IdleCpu {
    #[must_use]
    pub fn new() -> Self {
        Self { pc: 0 }
    }
}

impl Cpu for IdleCpu {
    fn step<B: Bus>(&mut self, bus: &mut B) {
        bus.fetch(self.pc);
    }

    fn interrupt<B: Bus>(&mut self, _bus: &mut B) -> bool {
        false
    }

    fn pc(&self) -> u16 {
        self.pc
    }

    fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    fn set_sp(&mut self, _sp: u16) {}

    fn reset(&mut self) {
        self.pc = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::PentagonBus;

    #[test]
    fn ops_advance_pc_and_account_time() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![
            ScriptOp::Write { addr: 0x8000, value: 0x42 },
            ScriptOp::Idle { ticks: 5 },
        ]);

        cpu.step(&mut bus); // fetch 4 + write 3
        assert_eq!(cpu.pc(), 1);
        assert_eq!(bus.clock.ticks(), 7);
        assert_eq!(bus.memory.read_page(2, 0x0000), 0x42);

        cpu.step(&mut bus); // fetch 4 + idle 5
        assert_eq!(cpu.pc(), 2);
        assert_eq!(bus.clock.ticks(), 16);
    }

    #[test]
    fn out_of_script_keeps_fetching_in_place() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![ScriptOp::Idle { ticks: 0 }]);

        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 1);
        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 1, "pc frozen after the script");
        assert!(cpu.is_halted());
        assert_eq!(bus.clock.ticks(), 12, "still an opcode fetch per step");
    }

    #[test]
    fn halt_op_freezes_execution() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![
            ScriptOp::Halt,
            ScriptOp::Write { addr: 0x8000, value: 0xFF },
        ]);

        cpu.step(&mut bus);
        cpu.step(&mut bus);
        assert!(cpu.is_halted());
        assert_eq!(bus.memory.read_page(2, 0x0000), 0x00, "write never executed");
    }

    #[test]
    fn looping_script_restarts() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![
            ScriptOp::Out { port: 0x00FE, value: 0x01 },
            ScriptOp::Out { port: 0x00FE, value: 0x02 },
        ]);
        cpu.set_looping(true);

        for _ in 0..5 {
            cpu.step(&mut bus);
        }
        assert!(!cpu.is_halted());
        assert_eq!(bus.border_colour, 1, "fifth step replays the first op");
    }

    #[test]
    fn jump_op_moves_pc_without_advance() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![
            ScriptOp::Jump { addr: 0x3D00 },
            ScriptOp::Idle { ticks: 0 },
        ]);

        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x3D00);
        assert!(bus.memory.dos_active(), "jump drove the overlay trap");

        // The next op executes from the new location.
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), 0x3D01);
    }

    #[test]
    fn accepted_interrupt_pushes_and_redirects() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![]);
        cpu.set_interrupt_response(InterruptResponse::Accept { handler: 0x0038 });
        cpu.set_pc(0x9A12);
        cpu.set_sp(0xC000);

        assert!(cpu.interrupt(&mut bus));
        assert_eq!(cpu.pc(), 0x0038);
        assert_eq!(bus.clock.ticks(), 13);
        assert_eq!(bus.memory.read_page(2, 0x3FFF), 0x9A, "return address high");
        assert_eq!(bus.memory.read_page(2, 0x3FFE), 0x12, "return address low");
        assert_eq!(cpu.accepted_interrupts(), 1);

        // Disarmed until re-armed.
        assert!(!cpu.interrupt(&mut bus));
        cpu.arm_interrupt();
        assert!(cpu.interrupt(&mut bus));
    }

    #[test]
    fn ignored_interrupt_is_free() {
        let mut bus = PentagonBus::new();
        let mut cpu = ScriptedCpu::new(vec![]);
        assert!(!cpu.interrupt(&mut bus));
        assert_eq!(bus.clock.ticks(), 0);
    }
}

//! Per-address memory marks.
//!
//! One mark byte per address of the 64K space. The scheduler consumes the
//! breakpoint bit; the visited bit is bookkeeping for debuggers and
//! disassemblers and has no effect on execution.

/// Address is a breakpoint; reaching it raises [`emu_core::BREAKPOINT_HIT`].
pub const MARK_BREAKPOINT: u8 = 1 << 0;

/// Address has been executed at least once.
pub const MARK_VISITED_INSTR: u8 = 1 << 7;

/// Mark table covering the full address space.
pub struct MemoryMarks {
    marks: Vec<u8>,
}

impl Default for MemoryMarks {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMarks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            marks: vec![0; 0x1_0000],
        }
    }

    /// Set mark bits on one address.
    pub fn mark_addr(&mut self, addr: u16, marks: u8) {
        self.marks[addr as usize] |= marks;
    }

    /// Set mark bits on a range of addresses, wrapping at the top of the
    /// address space.
    pub fn mark_addrs(&mut self, addr: u16, len: u16, marks: u8) {
        for i in 0..len {
            self.mark_addr(addr.wrapping_add(i), marks);
        }
    }

    /// Clear mark bits on a range of addresses.
    pub fn unmark_addrs(&mut self, addr: u16, len: u16, marks: u8) {
        for i in 0..len {
            self.marks[addr.wrapping_add(i) as usize] &= !marks;
        }
    }

    /// Mark bits set on an address.
    #[must_use]
    pub fn at(&self, addr: u16) -> u8 {
        self.marks[addr as usize]
    }

    /// Whether any of the given bits are set on an address.
    #[must_use]
    pub fn is_marked(&self, addr: u16, marks: u8) -> bool {
        self.at(addr) & marks != 0
    }

    /// Whether the address carries the breakpoint mark.
    #[must_use]
    pub fn is_breakpoint(&self, addr: u16) -> bool {
        self.is_marked(addr, MARK_BREAKPOINT)
    }
}

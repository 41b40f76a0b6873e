//! Pentagon banked memory subsystem.
//!
//! Address space layout, one 16K page per slot:
//!
//! ```text
//! $0000-$3FFF: slot 0 — ROM page ($7FFD bit 4, TR-DOS overlay may override)
//! $4000-$7FFF: slot 1 — always RAM page 5 (normal screen)
//! $8000-$BFFF: slot 2 — always RAM page 2
//! $C000-$FFFF: slot 3 — switchable RAM page 0-7 ($7FFD bits 0-2)
//! ```
//!
//! Bit 3 of $7FFD selects the shadow screen (page 7 instead of page 5) for
//! the raster, without changing the CPU mapping. Bit 5 locks the register
//! until the next reset.
//!
//! The TR-DOS overlay is address-triggered: jumping into the $3Dxx entry
//! page while the 48 BASIC ROM is selected pages the TR-DOS ROM in, and
//! execution leaving ROM space pages it back out.

/// Bytes per memory page.
pub const PAGE_SIZE: usize = 0x4000;

/// Number of 16K RAM pages (128K total).
pub const RAM_PAGE_COUNT: usize = 8;

/// Number of 16K ROM pages.
pub const ROM_PAGE_COUNT: usize = 4;

/// ROM page holding the 128K editor/menu.
pub const ROM_PAGE_BASIC_128: u8 = 0;

/// ROM page holding 48 BASIC.
pub const ROM_PAGE_BASIC_48: u8 = 1;

/// ROM page holding TR-DOS, visible only through the overlay.
pub const ROM_PAGE_TRDOS: u8 = 2;

/// Banked Pentagon memory: 4 ROM pages, 8 RAM pages, and the $7FFD state.
pub struct PagedMemory {
    rom_pages: [[u8; PAGE_SIZE]; ROM_PAGE_COUNT],
    ram_pages: [Box<[u8; PAGE_SIZE]>; RAM_PAGE_COUNT],
    /// One page index per 16K slot; slot 0 indexes ROM pages, slots 1-3 RAM
    /// pages.
    slots: [u8; 4],
    /// Last value written to $7FFD.
    bank_register: u8,
    /// Once $7FFD bit 5 is seen, further banking writes are ignored.
    locked: bool,
    /// TR-DOS ROM overlay engaged.
    dos_active: bool,
    /// RAM page the raster reads from (5 or 7).
    screen_page: u8,
}

impl Default for PagedMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl PagedMemory {
    /// Create a memory system in its reset state with blank ROM pages.
    ///
    /// ROM contents are loaded separately via [`PagedMemory::write_rom_page`];
    /// the engine ships no ROM images.
    #[must_use]
    pub fn new() -> Self {
        let mut memory = Self {
            rom_pages: [[0; PAGE_SIZE]; ROM_PAGE_COUNT],
            ram_pages: std::array::from_fn(|_| Box::new([0u8; PAGE_SIZE])),
            slots: [0, 5, 2, 0],
            bank_register: 0,
            locked: false,
            dos_active: false,
            screen_page: 5,
        };
        memory.reset();
        memory
    }

    /// Reset the banking state: 48 BASIC ROM, page 0 at $C000, normal
    /// screen, lock and overlay cleared, RAM zero-filled. ROM contents are
    /// preserved.
    pub fn reset(&mut self) {
        for page in &mut self.ram_pages {
            page.fill(0);
        }
        self.slots[1] = 5;
        self.slots[2] = 2;
        self.locked = false;
        self.dos_active = false;
        self.bank_register = 0b1_0000;
        self.update_memory_map();
    }

    /// Recompute the slot table and screen page from the banking register
    /// and the overlay flag. Engages the lock when bit 5 is set.
    fn update_memory_map(&mut self) {
        // ROM 0 = BASIC 128, 1 = BASIC 48, 2 = TR-DOS
        let mut rom_page = (self.bank_register >> 4) & 1;
        if self.dos_active && rom_page == ROM_PAGE_BASIC_48 {
            rom_page = ROM_PAGE_TRDOS;
        }
        self.slots[0] = rom_page;
        self.slots[3] = self.bank_register & 0x07;
        self.screen_page = if self.bank_register & 0x08 == 0 { 5 } else { 7 };
        if self.bank_register & 0x20 != 0 {
            self.locked = true;
        }
    }

    /// Write the $7FFD banking register. No-op while locked.
    pub fn write_bank_register(&mut self, value: u8) {
        if self.locked {
            return;
        }
        self.bank_register = value;
        self.update_memory_map();
    }

    /// Whether the given address is in the TR-DOS entry page ($3D00-$3DFF).
    #[must_use]
    pub fn is_overlay_trap_address(addr: u16) -> bool {
        addr & 0xFF00 == 0x3D00
    }

    /// Track a program counter change for the TR-DOS overlay.
    ///
    /// Execution reaching the trap page engages the overlay; execution
    /// leaving ROM space disengages it. Either transition remaps slot 0
    /// immediately, so the following opcode fetch already sees the right
    /// ROM.
    pub fn note_jump(&mut self, pc: u16) {
        if self.dos_active && pc > 0x3FFF {
            self.dos_active = false;
            self.update_memory_map();
        } else if !self.dos_active && Self::is_overlay_trap_address(pc) {
            self.dos_active = true;
            self.update_memory_map();
        }
    }

    /// CPU-visible read through the slot table.
    #[must_use]
    pub fn read(&self, addr: u16) -> u8 {
        let slot = (addr >> 14) as usize;
        let offset = (addr & 0x3FFF) as usize;
        if slot == 0 {
            self.rom_pages[self.slots[0] as usize][offset]
        } else {
            self.ram_pages[self.slots[slot] as usize][offset]
        }
    }

    /// CPU-visible write through the slot table. ROM writes are silently
    /// dropped.
    pub fn write(&mut self, addr: u16, value: u8) {
        let slot = (addr >> 14) as usize;
        if slot == 0 {
            return;
        }
        self.ram_pages[self.slots[slot] as usize][(addr & 0x3FFF) as usize] = value;
    }

    /// Read a byte of a RAM page directly.
    ///
    /// # Panics
    ///
    /// Panics if `page` is out of range.
    #[must_use]
    pub fn read_page(&self, page: u8, addr: u16) -> u8 {
        assert!((page as usize) < RAM_PAGE_COUNT, "RAM page {page} out of range");
        self.ram_pages[page as usize][(addr & 0x3FFF) as usize]
    }

    /// Read from the visible screen page, for raster fetches.
    #[must_use]
    pub fn vram_peek(&self, addr: u16) -> u8 {
        self.ram_pages[self.screen_page as usize][(addr & 0x3FFF) as usize]
    }

    /// Poke a byte of a RAM page directly, bypassing the slot table.
    pub fn set_ram_page_byte(&mut self, page: u8, addr: u16, value: u8) {
        self.ram_pages[(page & 7) as usize][(addr & 0x3FFF) as usize] = value;
    }

    /// Poke a byte of a ROM page directly.
    pub fn set_rom_page_byte(&mut self, page: u8, addr: u16, value: u8) {
        self.rom_pages[(page & 3) as usize][(addr & 0x3FFF) as usize] = value;
    }

    /// Load a ROM page's contents from the start (up to 16K).
    pub fn write_rom_page(&mut self, page: u8, data: &[u8]) {
        let len = data.len().min(PAGE_SIZE);
        self.rom_pages[(page & 3) as usize][..len].copy_from_slice(&data[..len]);
    }

    /// Load a RAM page's contents from the start (up to 16K).
    pub fn write_ram_page(&mut self, page: u8, data: &[u8]) {
        let len = data.len().min(PAGE_SIZE);
        self.ram_pages[(page & 7) as usize][..len].copy_from_slice(&data[..len]);
    }

    /// Direct RAM page read for observation.
    #[must_use]
    pub fn ram_page_slice(&self, page: u8, offset: usize, len: usize) -> &[u8] {
        &self.ram_pages[(page & 7) as usize][offset..offset + len]
    }

    /// RAM page the raster reads from (5 or 7).
    #[must_use]
    pub fn screen_page(&self) -> u8 {
        self.screen_page
    }

    /// Whether the banking register is locked.
    #[must_use]
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Whether the TR-DOS overlay is engaged.
    #[must_use]
    pub fn dos_active(&self) -> bool {
        self.dos_active
    }

    /// Last value written to $7FFD.
    #[must_use]
    pub fn bank_register(&self) -> u8 {
        self.bank_register
    }

    /// Current slot table (page index per 16K slot).
    #[must_use]
    pub fn slots(&self) -> [u8; 4] {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_memory() -> PagedMemory {
        let mut memory = PagedMemory::new();
        // One identifying byte per ROM page.
        memory.write_rom_page(ROM_PAGE_BASIC_128, &[0xA0]);
        memory.write_rom_page(ROM_PAGE_BASIC_48, &[0xA1]);
        memory.write_rom_page(ROM_PAGE_TRDOS, &[0xA2]);
        memory
    }

    #[test]
    fn reset_state() {
        let memory = make_memory();
        assert_eq!(memory.slots(), [1, 5, 2, 0]);
        assert_eq!(memory.bank_register(), 0b1_0000);
        assert_eq!(memory.screen_page(), 5);
        assert!(!memory.locked());
        assert!(!memory.dos_active());
    }

    #[test]
    fn reset_selects_basic_48() {
        let memory = make_memory();
        assert_eq!(memory.read(0x0000), 0xA1);
    }

    #[test]
    fn rom_switching() {
        let mut memory = make_memory();
        memory.write_bank_register(0x00);
        assert_eq!(memory.read(0x0000), 0xA0);
        memory.write_bank_register(0x10);
        assert_eq!(memory.read(0x0000), 0xA1);
    }

    #[test]
    fn rom_writes_dropped() {
        let mut memory = make_memory();
        memory.write(0x0000, 0xFF);
        memory.write(0x3FFF, 0xFF);
        assert_eq!(memory.read(0x0000), 0xA1);
        assert_eq!(memory.read(0x3FFF), 0x00);
    }

    #[test]
    fn fixed_slots() {
        let mut memory = make_memory();
        memory.write(0x4000, 0x55);
        memory.write(0x8000, 0x22);

        // Bank switching leaves slots 1 and 2 alone.
        memory.write_bank_register(0x07);
        assert_eq!(memory.read(0x4000), 0x55);
        assert_eq!(memory.read(0x8000), 0x22);
        assert_eq!(memory.read_page(5, 0x0000), 0x55);
        assert_eq!(memory.read_page(2, 0x0000), 0x22);
    }

    #[test]
    fn bank_isolation_at_c000() {
        let mut memory = make_memory();
        memory.write(0xC000, 0x11); // page 0

        memory.write_bank_register(0x13); // page 3
        assert_eq!(memory.read(0xC000), 0x00, "page 3 is fresh");
        memory.write(0xC000, 0x33);

        memory.write_bank_register(0x10); // back to page 0
        assert_eq!(memory.read(0xC000), 0x11, "page 0 data preserved");
        assert_eq!(memory.read_page(3, 0x0000), 0x33);
    }

    #[test]
    fn aliased_page_5_via_c000() {
        let mut memory = make_memory();
        memory.write_bank_register(0x15); // page 5 at $C000
        memory.write(0xC000, 0x99);
        assert_eq!(memory.read(0x4000), 0x99, "same page, two windows");
    }

    #[test]
    fn lock_is_one_way_until_reset() {
        let mut memory = make_memory();
        memory.write_bank_register(0x23); // page 3 + lock
        assert!(memory.locked());
        assert_eq!(memory.slots()[3], 3);

        // Further writes change nothing, including ones clearing bit 5.
        memory.write_bank_register(0x00);
        memory.write_bank_register(0x05);
        assert_eq!(memory.slots()[3], 3);
        assert_eq!(memory.bank_register(), 0x23);
        assert!(memory.locked());

        memory.reset();
        assert!(!memory.locked());
        assert_eq!(memory.slots()[3], 0);
    }

    #[test]
    fn shadow_screen_select() {
        let mut memory = make_memory();
        memory.set_ram_page_byte(5, 0x0000, 0x55);
        memory.set_ram_page_byte(7, 0x0000, 0x77);

        assert_eq!(memory.screen_page(), 5);
        assert_eq!(memory.vram_peek(0x4000), 0x55);

        memory.write_bank_register(0x08);
        assert_eq!(memory.screen_page(), 7);
        assert_eq!(memory.vram_peek(0x4000), 0x77);

        // CPU still sees page 5 at $4000 either way.
        assert_eq!(memory.read(0x4000), 0x55);
    }

    #[test]
    fn overlay_trap_address_range() {
        assert!(!PagedMemory::is_overlay_trap_address(0x3CFF));
        assert!(PagedMemory::is_overlay_trap_address(0x3D00));
        assert!(PagedMemory::is_overlay_trap_address(0x3D6A));
        assert!(PagedMemory::is_overlay_trap_address(0x3DFF));
        assert!(!PagedMemory::is_overlay_trap_address(0x3E00));
    }

    #[test]
    fn overlay_engages_and_disengages() {
        let mut memory = make_memory();
        // 48 BASIC selected at reset; entering $3Dxx pages TR-DOS in.
        memory.note_jump(0x3D00);
        assert!(memory.dos_active());
        assert_eq!(memory.read(0x0000), 0xA2);

        // Still in ROM space: overlay stays.
        memory.note_jump(0x0066);
        assert!(memory.dos_active());
        assert_eq!(memory.read(0x0000), 0xA2);

        // Leaving ROM space pages it back out.
        memory.note_jump(0x4000);
        assert!(!memory.dos_active());
        assert_eq!(memory.read(0x0000), 0xA1);
    }

    #[test]
    fn overlay_only_overrides_basic_48() {
        let mut memory = make_memory();
        memory.write_bank_register(0x00); // BASIC 128
        memory.note_jump(0x3D00);
        assert!(memory.dos_active());
        assert_eq!(memory.read(0x0000), 0xA0, "ROM 0 is not overridden");

        // Selecting 48 BASIC while the overlay is engaged shows TR-DOS.
        memory.write_bank_register(0x10);
        assert_eq!(memory.read(0x0000), 0xA2);
    }

    #[test]
    fn write_ram_page_bulk() {
        let mut memory = make_memory();
        memory.write_ram_page(3, &[0x11, 0x22, 0x33]);
        assert_eq!(memory.ram_page_slice(3, 0, 3), &[0x11, 0x22, 0x33]);
    }

    #[test]
    fn reset_zeroes_ram_but_not_rom() {
        let mut memory = make_memory();
        memory.write(0x4000, 0xAB);
        memory.reset();
        assert_eq!(memory.read(0x4000), 0x00);
        assert_eq!(memory.read(0x0000), 0xA1);
    }

    #[test]
    #[should_panic(expected = "RAM page 8 out of range")]
    fn read_page_out_of_range_panics() {
        let memory = make_memory();
        let _ = memory.read_page(8, 0x0000);
    }
}

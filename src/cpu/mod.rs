mod opcode;

pub use self::opcode::{AddrMode, Instr, Opcode, OPCODE_TABLE};

use crate::bus::SystemBus;

enum Flag { C, Z, I, D, B, U, V, N }

impl Flag {
    pub fn mask(&self) -> u8 {
        match self {
            Flag::C => 0b00000001,
            Flag::Z => 0b00000010,
            Flag::I => 0b00000100,
            Flag::D => 0b00001000,
            Flag::B => 0b00010000,
            Flag::U => 0b00100000,
            Flag::V => 0b01000000,
            Flag::N => 0b10000000,
        }
    }
}

const STACK_START: u16 = 0x0100;

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

const RESET_CYCLES: u32 = 8;
const IRQ_CYCLES: u32 = 7;
const NMI_CYCLES: u32 = 8;

/// The MOS 6502 core of the 2A03. One `clock` call is one CPU cycle; a
/// whole instruction executes on the cycle that fetches it and the
/// remaining cycles of its budget are burned as a countdown.
pub struct Cpu6502 {
    pub accumulator: u8,
    pub x_index_reg: u8,
    pub y_index_reg: u8,
    pub stack_pointer: u8,
    pub processor_status: u8,
    pub program_counter: u16,

    // per-instruction scratch
    opcode: u8,
    addr_mode: AddrMode,
    fetched: u8,
    abs_addr: u16,
    rel_addr: u16,
    page_crossed: bool,

    cycles_remaining: u32,
    pub total_cycles: u64,
}

impl Cpu6502 {
    pub fn new() -> Self {
        Self {
            accumulator: 0,
            x_index_reg: 0,
            y_index_reg: 0,
            stack_pointer: 0xFD,
            processor_status: Flag::U.mask(),
            program_counter: 0,

            opcode: 0,
            addr_mode: AddrMode::IMP,
            fetched: 0,
            abs_addr: 0,
            rel_addr: 0,
            page_crossed: false,

            cycles_remaining: 0,
            total_cycles: 0,
        }
    }

    /// Reset protocol: registers cleared, stack pointer to 0xFD, PC loaded
    /// from the little-endian vector at 0xFFFC, 8 cycles consumed.
    pub fn reset(&mut self, bus: &mut SystemBus) {
        self.accumulator = 0;
        self.x_index_reg = 0;
        self.y_index_reg = 0;
        self.stack_pointer = 0xFD;
        self.processor_status = Flag::U.mask();
        self.program_counter = self.read_word(bus, RESET_VECTOR);

        self.opcode = 0;
        self.addr_mode = AddrMode::IMP;
        self.fetched = 0;
        self.abs_addr = 0;
        self.rel_addr = 0;
        self.page_crossed = false;

        self.cycles_remaining = RESET_CYCLES;
        self.total_cycles = 0;
    }

    /// Maskable interrupt; ignored while the I flag is set.
    pub fn irq(&mut self, bus: &mut SystemBus) {
        if self.get_flag(Flag::I) {
            return;
        }

        self.interrupt(bus, IRQ_VECTOR, IRQ_CYCLES);
    }

    /// Non-maskable interrupt, raised by the PPU at the start of VBlank.
    pub fn nmi(&mut self, bus: &mut SystemBus) {
        self.interrupt(bus, NMI_VECTOR, NMI_CYCLES);
    }

    // Shared IRQ/NMI entry. The pushed status keeps the pre-interrupt I
    // flag; B is clear and U is set on the stack copy.
    fn interrupt(&mut self, bus: &mut SystemBus, vector: u16, cycles: u32) {
        self.push_word_to_stack(bus, self.program_counter);

        self.set_flag(Flag::B, false);
        self.set_flag(Flag::U, true);
        self.push_byte_to_stack(bus, self.processor_status);
        self.set_flag(Flag::I, true);

        self.program_counter = self.read_word(bus, vector);
        self.cycles_remaining = cycles;
    }

    /// Advance one CPU cycle. At an instruction boundary this fetches,
    /// decodes and executes the whole instruction, then charges its cycle
    /// budget; every call burns exactly one cycle.
    pub fn clock(&mut self, bus: &mut SystemBus) {
        if self.cycles_remaining == 0 {
            self.opcode = self.advance_pc(bus);
            let op = OPCODE_TABLE[self.opcode as usize];

            self.addr_mode = op.addr_mode;
            self.page_crossed = false;
            self.run_addr_mode(op.addr_mode, bus);
            let extra_cycles = self.run_instr(op.instr, bus);

            self.cycles_remaining = op.cycles + extra_cycles;
        }

        self.cycles_remaining -= 1;
        self.total_cycles += 1;
    }

    fn run_addr_mode(&mut self, addr_mode: AddrMode, bus: &mut SystemBus) {
        match addr_mode {
            AddrMode::IMP => self.imp_addressing(),
            AddrMode::ACC => self.acc_addressing(),
            AddrMode::IMM => self.imm_addressing(bus),
            AddrMode::ZP0 => self.zp0_addressing(bus),
            AddrMode::ZPX => self.zpx_addressing(bus),
            AddrMode::ZPY => self.zpy_addressing(bus),
            AddrMode::REL => self.rel_addressing(bus),
            AddrMode::ABS => self.abs_addressing(bus),
            AddrMode::ABX => self.abx_addressing(bus),
            AddrMode::ABY => self.aby_addressing(bus),
            AddrMode::IND => self.ind_addressing(bus),
            AddrMode::IZX => self.izx_addressing(bus),
            AddrMode::IZY => self.izy_addressing(bus),
        }
    }

    fn run_instr(&mut self, instr: Instr, bus: &mut SystemBus) -> u32 {
        match instr {
            Instr::ADC => self.add_with_carry(bus),
            Instr::AND => self.and_accumulator(bus),
            Instr::ASL => self.arithmetic_shift_left(bus),
            Instr::BCC => self.branch_if_carry_clear(),
            Instr::BCS => self.branch_if_carry_set(),
            Instr::BEQ => self.branch_if_equal(),
            Instr::BIT => self.bit_test(bus),
            Instr::BMI => self.branch_if_minus(),
            Instr::BNE => self.branch_if_not_equal(),
            Instr::BPL => self.branch_if_positive(),
            Instr::BRK => self.force_interrupt(bus),
            Instr::BVC => self.branch_if_overflow_clear(),
            Instr::BVS => self.branch_if_overflow_set(),
            Instr::CLC => self.set_flag_op(Flag::C, false),
            Instr::CLD => self.set_flag_op(Flag::D, false),
            Instr::CLI => self.set_flag_op(Flag::I, false),
            Instr::CLV => self.set_flag_op(Flag::V, false),
            Instr::CMP => self.compare_accumulator(bus),
            Instr::CPX => self.compare_x_reg(bus),
            Instr::CPY => self.compare_y_reg(bus),
            Instr::DEC => self.decrement_memory(bus),
            Instr::DEX => self.decrement_x_reg(),
            Instr::DEY => self.decrement_y_reg(),
            Instr::EOR => self.exclusive_or_accumulator(bus),
            Instr::INC => self.increment_memory(bus),
            Instr::INX => self.increment_x_reg(),
            Instr::INY => self.increment_y_reg(),
            Instr::JMP => self.jump(),
            Instr::JSR => self.jump_to_subroutine(bus),
            Instr::LDA => self.load_accumulator(bus),
            Instr::LDX => self.load_x_reg(bus),
            Instr::LDY => self.load_y_reg(bus),
            Instr::LSR => self.logical_shift_right(bus),
            Instr::NOP => 0,
            Instr::ORA => self.or_accumulator(bus),
            Instr::PHA => self.push_accumulator(bus),
            Instr::PHP => self.push_processor_status(bus),
            Instr::PLA => self.pull_accumulator(bus),
            Instr::PLP => self.pull_processor_status(bus),
            Instr::ROL => self.rotate_left(bus),
            Instr::ROR => self.rotate_right(bus),
            Instr::RTI => self.return_from_interrupt(bus),
            Instr::RTS => self.return_from_subroutine(bus),
            Instr::SBC => self.subtract_with_carry(bus),
            Instr::SEC => self.set_flag_op(Flag::C, true),
            Instr::SED => self.set_flag_op(Flag::D, true),
            Instr::SEI => self.set_flag_op(Flag::I, true),
            Instr::STA => self.store_accumulator(bus),
            Instr::STX => self.store_x_reg(bus),
            Instr::STY => self.store_y_reg(bus),
            Instr::TAX => self.transfer_accumulator_to_x(),
            Instr::TAY => self.transfer_accumulator_to_y(),
            Instr::TSX => self.transfer_stack_pointer_to_x(),
            Instr::TXA => self.transfer_x_to_accumulator(),
            Instr::TXS => self.transfer_x_to_stack_pointer(),
            Instr::TYA => self.transfer_y_to_accumulator(),
            Instr::XXX => self.unofficial_opcode(),
        }
    }

    // --- operations ---

    pub(super) fn add_with_carry(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        self.add_to_accumulator(data);

        self.page_crossed as u32
    }

    pub(super) fn subtract_with_carry(&mut self, bus: &mut SystemBus) -> u32 {
        // SBC is ADC with the operand one's-complemented
        let data = self.fetch(bus) ^ 0xFF;
        self.add_to_accumulator(data);

        self.page_crossed as u32
    }

    fn add_to_accumulator(&mut self, data: u8) {
        let sum = self.accumulator as u16 + data as u16 + self.get_flag(Flag::C) as u16;
        let result = sum as u8;

        self.set_flag(Flag::C, sum > 0xFF);
        self.set_flag(
            Flag::V,
            (!(self.accumulator ^ data) & (self.accumulator ^ result)) & 0x80 != 0,
        );
        self.set_zn(result);

        self.accumulator = result;
    }

    pub(super) fn and_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.accumulator &= self.fetch(bus);
        self.set_zn(self.accumulator);

        self.page_crossed as u32
    }

    pub(super) fn or_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.accumulator |= self.fetch(bus);
        self.set_zn(self.accumulator);

        self.page_crossed as u32
    }

    pub(super) fn exclusive_or_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.accumulator ^= self.fetch(bus);
        self.set_zn(self.accumulator);

        self.page_crossed as u32
    }

    pub(super) fn bit_test(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);

        self.set_flag(Flag::Z, self.accumulator & data == 0);
        self.set_flag(Flag::V, data & 0b01000000 != 0);
        self.set_flag(Flag::N, data & 0b10000000 != 0);

        0
    }

    pub(super) fn compare_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        self.compare(self.accumulator, data);

        self.page_crossed as u32
    }

    pub(super) fn compare_x_reg(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        self.compare(self.x_index_reg, data);

        0
    }

    pub(super) fn compare_y_reg(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        self.compare(self.y_index_reg, data);

        0
    }

    fn compare(&mut self, reg: u8, data: u8) {
        self.set_flag(Flag::C, reg >= data);
        self.set_flag(Flag::Z, reg == data);
        self.set_flag(Flag::N, reg.wrapping_sub(data) & 0x80 != 0);
    }

    pub(super) fn arithmetic_shift_left(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        let result = data << 1;

        self.set_flag(Flag::C, data & 0x80 != 0);
        self.set_zn(result);
        self.write_to_operand(bus, result);

        0
    }

    pub(super) fn logical_shift_right(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        let result = data >> 1;

        self.set_flag(Flag::C, data & 0x01 != 0);
        self.set_zn(result);
        self.write_to_operand(bus, result);

        0
    }

    pub(super) fn rotate_left(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        let result = (data << 1) | self.get_flag(Flag::C) as u8;

        self.set_flag(Flag::C, data & 0x80 != 0);
        self.set_zn(result);
        self.write_to_operand(bus, result);

        0
    }

    pub(super) fn rotate_right(&mut self, bus: &mut SystemBus) -> u32 {
        let data = self.fetch(bus);
        let result = (data >> 1) | ((self.get_flag(Flag::C) as u8) << 7);

        self.set_flag(Flag::C, data & 0x01 != 0);
        self.set_zn(result);
        self.write_to_operand(bus, result);

        0
    }

    pub(super) fn load_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.accumulator = self.fetch(bus);
        self.set_zn(self.accumulator);

        self.page_crossed as u32
    }

    pub(super) fn load_x_reg(&mut self, bus: &mut SystemBus) -> u32 {
        self.x_index_reg = self.fetch(bus);
        self.set_zn(self.x_index_reg);

        self.page_crossed as u32
    }

    pub(super) fn load_y_reg(&mut self, bus: &mut SystemBus) -> u32 {
        self.y_index_reg = self.fetch(bus);
        self.set_zn(self.y_index_reg);

        self.page_crossed as u32
    }

    pub(super) fn store_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.write_to_operand(bus, self.accumulator);

        0
    }

    pub(super) fn store_x_reg(&mut self, bus: &mut SystemBus) -> u32 {
        self.write_to_operand(bus, self.x_index_reg);

        0
    }

    pub(super) fn store_y_reg(&mut self, bus: &mut SystemBus) -> u32 {
        self.write_to_operand(bus, self.y_index_reg);

        0
    }

    pub(super) fn increment_memory(&mut self, bus: &mut SystemBus) -> u32 {
        let result = self.fetch(bus).wrapping_add(1);

        self.write_to_operand(bus, result);
        self.set_zn(result);

        0
    }

    pub(super) fn decrement_memory(&mut self, bus: &mut SystemBus) -> u32 {
        let result = self.fetch(bus).wrapping_sub(1);

        self.write_to_operand(bus, result);
        self.set_zn(result);

        0
    }

    pub(super) fn increment_x_reg(&mut self) -> u32 {
        self.x_index_reg = self.x_index_reg.wrapping_add(1);
        self.set_zn(self.x_index_reg);

        0
    }

    pub(super) fn decrement_x_reg(&mut self) -> u32 {
        self.x_index_reg = self.x_index_reg.wrapping_sub(1);
        self.set_zn(self.x_index_reg);

        0
    }

    pub(super) fn increment_y_reg(&mut self) -> u32 {
        self.y_index_reg = self.y_index_reg.wrapping_add(1);
        self.set_zn(self.y_index_reg);

        0
    }

    pub(super) fn decrement_y_reg(&mut self) -> u32 {
        self.y_index_reg = self.y_index_reg.wrapping_sub(1);
        self.set_zn(self.y_index_reg);

        0
    }

    pub(super) fn branch_if_carry_clear(&mut self) -> u32 {
        if !self.get_flag(Flag::C) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_carry_set(&mut self) -> u32 {
        if self.get_flag(Flag::C) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_equal(&mut self) -> u32 {
        if self.get_flag(Flag::Z) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_not_equal(&mut self) -> u32 {
        if !self.get_flag(Flag::Z) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_minus(&mut self) -> u32 {
        if self.get_flag(Flag::N) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_positive(&mut self) -> u32 {
        if !self.get_flag(Flag::N) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_overflow_set(&mut self) -> u32 {
        if self.get_flag(Flag::V) { self.take_branch() } else { 0 }
    }

    pub(super) fn branch_if_overflow_clear(&mut self) -> u32 {
        if !self.get_flag(Flag::V) { self.take_branch() } else { 0 }
    }

    // One extra cycle for taking the branch, another when the target sits
    // on a different page than the updated PC.
    fn take_branch(&mut self) -> u32 {
        let target = self.program_counter.wrapping_add(self.rel_addr);
        let page_crossed = (target ^ self.program_counter) & 0xFF00 != 0;

        self.program_counter = target;

        1 + page_crossed as u32
    }

    pub(super) fn jump(&mut self) -> u32 {
        self.program_counter = self.abs_addr;

        0
    }

    pub(super) fn jump_to_subroutine(&mut self, bus: &mut SystemBus) -> u32 {
        self.push_word_to_stack(bus, self.program_counter.wrapping_sub(1));
        self.program_counter = self.abs_addr;

        0
    }

    pub(super) fn return_from_subroutine(&mut self, bus: &mut SystemBus) -> u32 {
        self.program_counter = self.pop_word_from_stack(bus).wrapping_add(1);

        0
    }

    pub(super) fn return_from_interrupt(&mut self, bus: &mut SystemBus) -> u32 {
        self.processor_status = self.pop_byte_from_stack(bus);
        self.processor_status &= !Flag::B.mask();
        self.processor_status |= Flag::U.mask();

        self.program_counter = self.pop_word_from_stack(bus);

        0
    }

    pub(super) fn force_interrupt(&mut self, bus: &mut SystemBus) -> u32 {
        // the byte after BRK is padding
        self.program_counter = self.program_counter.wrapping_add(1);

        self.set_flag(Flag::I, true);
        self.push_word_to_stack(bus, self.program_counter);
        self.push_byte_to_stack(
            bus,
            self.processor_status | Flag::B.mask() | Flag::U.mask(),
        );
        self.set_flag(Flag::B, false);

        self.program_counter = self.read_word(bus, IRQ_VECTOR);

        0
    }

    pub(super) fn push_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.push_byte_to_stack(bus, self.accumulator);

        0
    }

    pub(super) fn push_processor_status(&mut self, bus: &mut SystemBus) -> u32 {
        self.push_byte_to_stack(
            bus,
            self.processor_status | Flag::B.mask() | Flag::U.mask(),
        );

        0
    }

    pub(super) fn pull_accumulator(&mut self, bus: &mut SystemBus) -> u32 {
        self.accumulator = self.pop_byte_from_stack(bus);
        self.set_zn(self.accumulator);

        0
    }

    pub(super) fn pull_processor_status(&mut self, bus: &mut SystemBus) -> u32 {
        self.processor_status = self.pop_byte_from_stack(bus);
        self.processor_status &= !Flag::B.mask();
        self.processor_status |= Flag::U.mask();

        0
    }

    fn set_flag_op(&mut self, flag: Flag, value: bool) -> u32 {
        self.set_flag(flag, value);

        0
    }

    pub(super) fn transfer_accumulator_to_x(&mut self) -> u32 {
        self.x_index_reg = self.accumulator;
        self.set_zn(self.x_index_reg);

        0
    }

    pub(super) fn transfer_accumulator_to_y(&mut self) -> u32 {
        self.y_index_reg = self.accumulator;
        self.set_zn(self.y_index_reg);

        0
    }

    pub(super) fn transfer_stack_pointer_to_x(&mut self) -> u32 {
        self.x_index_reg = self.stack_pointer;
        self.set_zn(self.x_index_reg);

        0
    }

    pub(super) fn transfer_x_to_accumulator(&mut self) -> u32 {
        self.accumulator = self.x_index_reg;
        self.set_zn(self.accumulator);

        0
    }

    pub(super) fn transfer_y_to_accumulator(&mut self) -> u32 {
        self.accumulator = self.y_index_reg;
        self.set_zn(self.accumulator);

        0
    }

    pub(super) fn transfer_x_to_stack_pointer(&mut self) -> u32 {
        self.stack_pointer = self.x_index_reg;

        0
    }

    fn unofficial_opcode(&mut self) -> u32 {
        log::warn!(
            "unofficial opcode {:02X} at {:04X} treated as a no-op",
            self.opcode,
            self.program_counter.wrapping_sub(1)
        );

        0
    }

    // --- addressing modes ---

    #[inline]
    fn imp_addressing(&mut self) {
        self.fetched = self.accumulator;
    }

    #[inline]
    fn acc_addressing(&mut self) {
        self.fetched = self.accumulator;
    }

    #[inline]
    fn imm_addressing(&mut self, bus: &mut SystemBus) {
        self.fetched = self.advance_pc(bus);
    }

    #[inline]
    fn zp0_addressing(&mut self, bus: &mut SystemBus) {
        self.abs_addr = self.advance_pc(bus) as u16;
    }

    #[inline]
    fn zpx_addressing(&mut self, bus: &mut SystemBus) {
        self.abs_addr = self.advance_pc(bus).wrapping_add(self.x_index_reg) as u16;
    }

    #[inline]
    fn zpy_addressing(&mut self, bus: &mut SystemBus) {
        self.abs_addr = self.advance_pc(bus).wrapping_add(self.y_index_reg) as u16;
    }

    #[inline]
    fn rel_addressing(&mut self, bus: &mut SystemBus) {
        // sign-extended so a wrapping add walks backwards too
        self.rel_addr = (self.advance_pc(bus) as i8) as u16;
    }

    #[inline]
    fn abs_addressing(&mut self, bus: &mut SystemBus) {
        self.abs_addr = self.fetch_abs_address(bus);
    }

    #[inline]
    fn abx_addressing(&mut self, bus: &mut SystemBus) {
        let base = self.fetch_abs_address(bus);

        self.abs_addr = base.wrapping_add(self.x_index_reg as u16);
        self.page_crossed = (self.abs_addr ^ base) & 0xFF00 != 0;
    }

    #[inline]
    fn aby_addressing(&mut self, bus: &mut SystemBus) {
        let base = self.fetch_abs_address(bus);

        self.abs_addr = base.wrapping_add(self.y_index_reg as u16);
        self.page_crossed = (self.abs_addr ^ base) & 0xFF00 != 0;
    }

    #[inline]
    fn ind_addressing(&mut self, bus: &mut SystemBus) {
        let ptr = self.fetch_abs_address(bus);

        let lo = self.read_byte(bus, ptr) as u16;
        let hi = if ptr & 0x00FF == 0x00FF {
            // hardware bug: the high byte is fetched from the same page
            self.read_byte(bus, ptr & 0xFF00)
        } else {
            self.read_byte(bus, ptr.wrapping_add(1))
        } as u16;

        self.abs_addr = (hi << 8) | lo;
    }

    #[inline]
    fn izx_addressing(&mut self, bus: &mut SystemBus) {
        let ptr = self.advance_pc(bus).wrapping_add(self.x_index_reg);

        let lo = self.read_byte(bus, ptr as u16) as u16;
        let hi = self.read_byte(bus, ptr.wrapping_add(1) as u16) as u16;

        self.abs_addr = (hi << 8) | lo;
    }

    #[inline]
    fn izy_addressing(&mut self, bus: &mut SystemBus) {
        let ptr = self.advance_pc(bus);

        let lo = self.read_byte(bus, ptr as u16) as u16;
        let hi = self.read_byte(bus, ptr.wrapping_add(1) as u16) as u16;

        let base = (hi << 8) | lo;

        self.abs_addr = base.wrapping_add(self.y_index_reg as u16);
        self.page_crossed = (self.abs_addr ^ base) & 0xFF00 != 0;
    }

    // --- helpers ---

    /// Operand fetch. IMP/ACC/IMM placed the operand in `fetched` during
    /// addressing; every other mode reads it from the effective address.
    #[inline]
    fn fetch(&mut self, bus: &mut SystemBus) -> u8 {
        match self.addr_mode {
            AddrMode::IMP | AddrMode::ACC | AddrMode::IMM => {}
            _ => self.fetched = self.read_byte(bus, self.abs_addr),
        }

        self.fetched
    }

    #[inline]
    fn write_to_operand(&mut self, bus: &mut SystemBus, byte: u8) {
        match self.addr_mode {
            AddrMode::ACC => self.accumulator = byte,
            _ => self.write_byte(bus, self.abs_addr, byte),
        }
    }

    #[inline]
    fn fetch_abs_address(&mut self, bus: &mut SystemBus) -> u16 {
        let lo = self.advance_pc(bus) as u16;
        let hi = self.advance_pc(bus) as u16;

        (hi << 8) | lo
    }

    #[inline]
    fn advance_pc(&mut self, bus: &mut SystemBus) -> u8 {
        let byte = self.read_byte(bus, self.program_counter);
        self.program_counter = self.program_counter.wrapping_add(1);

        byte
    }

    #[inline]
    fn read_word(&mut self, bus: &mut SystemBus, addr: u16) -> u16 {
        let lo = self.read_byte(bus, addr) as u16;
        let hi = self.read_byte(bus, addr.wrapping_add(1)) as u16;

        (hi << 8) | lo
    }

    #[inline]
    fn push_word_to_stack(&mut self, bus: &mut SystemBus, word: u16) {
        self.push_byte_to_stack(bus, (word >> 8) as u8);
        self.push_byte_to_stack(bus, word as u8);
    }

    #[inline]
    fn pop_word_from_stack(&mut self, bus: &mut SystemBus) -> u16 {
        let lo = self.pop_byte_from_stack(bus) as u16;
        let hi = self.pop_byte_from_stack(bus) as u16;

        (hi << 8) | lo
    }

    #[inline]
    fn push_byte_to_stack(&mut self, bus: &mut SystemBus, byte: u8) {
        self.write_byte(bus, STACK_START | self.stack_pointer as u16, byte);
        self.stack_pointer = self.stack_pointer.wrapping_sub(1);
    }

    #[inline]
    fn pop_byte_from_stack(&mut self, bus: &mut SystemBus) -> u8 {
        self.stack_pointer = self.stack_pointer.wrapping_add(1);
        self.read_byte(bus, STACK_START | self.stack_pointer as u16)
    }

    #[inline]
    fn set_zn(&mut self, result: u8) {
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::N, result & 0x80 != 0);
    }

    #[inline]
    fn set_flag(&mut self, flag: Flag, value: bool) {
        let mask = flag.mask();
        if value {
            self.processor_status |= mask;
        } else {
            self.processor_status &= !mask;
        }
    }

    #[inline]
    fn get_flag(&self, flag: Flag) -> bool {
        (self.processor_status & flag.mask()) != 0
    }

    #[inline]
    fn read_byte(&mut self, bus: &mut SystemBus, addr: u16) -> u8 {
        bus.cpu_read(addr)
    }

    #[inline]
    fn write_byte(&mut self, bus: &mut SystemBus, addr: u16, byte: u8) {
        bus.cpu_write(addr, byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_system() -> (Cpu6502, SystemBus) {
        (Cpu6502::new(), SystemBus::test_new())
    }

    /// Runs whole instructions starting at `start`, with the program bytes
    /// loaded into RAM at that address.
    fn load_program(bus: &mut SystemBus, start: u16, program: &[u8]) {
        for (i, &byte) in program.iter().enumerate() {
            bus.cpu_write(start + i as u16, byte);
        }
    }

    fn step_instruction(cpu: &mut Cpu6502, bus: &mut SystemBus) -> u32 {
        let mut ticks = 0;
        loop {
            cpu.clock(bus);
            ticks += 1;
            if cpu.cycles_remaining == 0 {
                return ticks;
            }
        }
    }

    #[test]
    fn lda_immediate_sets_zero_flag() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xA9, 0x00]);
        cpu.program_counter = 0x0200;

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.accumulator, 0x00);
        assert!(cpu.get_flag(Flag::Z));
        assert!(!cpu.get_flag(Flag::N));
    }

    #[test]
    fn lda_immediate_sets_negative_flag() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xA9, 0x80]);
        cpu.program_counter = 0x0200;

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.accumulator, 0x80);
        assert!(!cpu.get_flag(Flag::Z));
        assert!(cpu.get_flag(Flag::N));
    }

    #[test]
    fn lda_addressing_modes() {
        let (mut cpu, mut bus) = test_system();
        load_program(
            &mut bus,
            0x0200,
            &[
                0xA9, 0x11, // LDA #$11
                0xA5, 0xFE, // LDA $FE
                0xB5, 0xFC, // LDA $FC,X (X=2)
                0xAD, 0x34, 0x12, // LDA $1234
                0xBD, 0x34, 0x12, // LDA $1234,X
                0xB9, 0x34, 0x12, // LDA $1234,Y (Y=3)
            ],
        );
        cpu.program_counter = 0x0200;
        cpu.x_index_reg = 2;
        cpu.y_index_reg = 3;
        bus.cpu_write(0x00FE, 0x22);
        bus.cpu_write(0x1234, 0x33);
        bus.cpu_write(0x1236, 0x44);
        bus.cpu_write(0x1237, 0x55);

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.accumulator, 0x11, "imm");

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.accumulator, 0x22, "zp0");

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.accumulator, 0x22, "zpx");

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.accumulator, 0x33, "abs");

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.accumulator, 0x44, "abx");

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.accumulator, 0x55, "aby");
    }

    #[test]
    fn indexed_indirect_wraps_in_the_zero_page() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xA1, 0xFE]); // LDA ($FE,X), X=3 -> pointer at $01/$02
        cpu.program_counter = 0x0200;
        cpu.x_index_reg = 0x03;
        bus.cpu_write(0x0001, 0x78);
        bus.cpu_write(0x0002, 0x06);
        bus.cpu_write(0x0678, 0x5A);

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.accumulator, 0x5A);
    }

    fn check_adc(a: u8, m: u8, result: u8, overflow: bool, carry: bool) {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x69, m]);
        cpu.program_counter = 0x0200;
        cpu.accumulator = a;

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.accumulator, result, "ADC {:02X}+{:02X} result", a, m);
        assert_eq!(cpu.get_flag(Flag::C), carry, "ADC {:02X}+{:02X} carry", a, m);
        assert_eq!(cpu.get_flag(Flag::V), overflow, "ADC {:02X}+{:02X} overflow", a, m);
    }

    fn check_sbc(a: u8, m: u8, result: u8, overflow: bool, carry: bool) {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xE9, m]);
        cpu.program_counter = 0x0200;
        cpu.accumulator = a;
        cpu.set_flag(Flag::C, true);

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.accumulator, result, "SBC {:02X}-{:02X} result", a, m);
        assert_eq!(cpu.get_flag(Flag::C), carry, "SBC {:02X}-{:02X} carry", a, m);
        assert_eq!(cpu.get_flag(Flag::V), overflow, "SBC {:02X}-{:02X} overflow", a, m);
    }

    #[test]
    fn adc_flag_arithmetic() {
        check_adc(1, 1, 2, false, false);
        check_adc(0x7F, 0x7F, 0xFE, true, false);
        check_adc(50, 25, 75, false, false);
        check_adc(0x80, 0x80, 0x00, true, true);
        check_adc(0x7F, 0x02, 0x81, true, false);
        check_adc(0xFF, 0x01, 0x00, false, true);
    }

    #[test]
    fn sbc_flag_arithmetic() {
        check_sbc(3, 1, 2, false, true);
        check_sbc(100, 50, 50, false, true);
        check_sbc(0x80, 0x01, 0x7F, true, true);
        check_sbc(0, 1, 0xFF, false, false);
    }

    #[test]
    fn stack_round_trip_restores_the_pointer() {
        let (mut cpu, mut bus) = test_system();
        let initial = cpu.stack_pointer;

        cpu.push_word_to_stack(&mut bus, 0x1234);
        cpu.push_word_to_stack(&mut bus, 0xABCD);

        assert_eq!(cpu.pop_word_from_stack(&mut bus), 0xABCD);
        assert_eq!(cpu.pop_word_from_stack(&mut bus), 0x1234);
        assert_eq!(cpu.stack_pointer, initial);
    }

    #[test]
    fn stack_pointer_wraps_in_eight_bits() {
        let (mut cpu, mut bus) = test_system();
        cpu.stack_pointer = 0x00;

        cpu.push_byte_to_stack(&mut bus, 0x42);

        assert_eq!(cpu.stack_pointer, 0xFF);
        assert_eq!(cpu.pop_byte_from_stack(&mut bus), 0x42);
        assert_eq!(cpu.stack_pointer, 0x00);
    }

    #[test]
    fn php_pushes_status_with_break_and_unused_set() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x08]); // PHP
        cpu.program_counter = 0x0200;
        cpu.processor_status = Flag::U.mask() | Flag::C.mask();

        step_instruction(&mut cpu, &mut bus);

        let pushed = bus.cpu_read(STACK_START | 0xFD);
        assert_eq!(pushed, Flag::U.mask() | Flag::C.mask() | Flag::B.mask());
        assert_eq!(cpu.stack_pointer, 0xFC);
    }

    #[test]
    fn plp_clears_break_and_forces_unused() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x28]); // PLP
        cpu.program_counter = 0x0200;
        cpu.stack_pointer = 0xFC;
        bus.cpu_write(STACK_START | 0xFD, 0xFF);

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.processor_status, 0xFF & !Flag::B.mask());
        assert!(cpu.processor_status & Flag::U.mask() != 0);
    }

    #[test]
    fn reset_loads_the_vector_and_stalls_eight_cycles() {
        let (mut cpu, mut bus) = test_system();
        bus.cpu_write(0xFFFC, 0x00);
        bus.cpu_write(0xFFFD, 0x80);
        bus.cpu_write(0x8000, 0xEA); // NOP

        cpu.reset(&mut bus);
        assert_eq!(cpu.program_counter, 0x8000);
        assert_eq!(cpu.cycles_remaining, 8);

        for _ in 0..8 {
            cpu.clock(&mut bus);
        }
        assert_eq!(cpu.cycles_remaining, 0);
        assert_eq!(cpu.program_counter, 0x8000);

        // the ninth tick fetches the NOP, the tenth finishes it
        cpu.clock(&mut bus);
        assert_eq!(cpu.program_counter, 0x8001);
        assert_eq!(cpu.cycles_remaining, 1);

        cpu.clock(&mut bus);
        assert_eq!(cpu.cycles_remaining, 0);
    }

    #[test]
    fn branch_taken_across_a_page_costs_four_cycles() {
        let (mut cpu, mut bus) = test_system();
        // BEQ +127 from $02C0: PC is $02C2 after the operand, target $0341
        load_program(&mut bus, 0x02C0, &[0xF0, 0x7F]);
        cpu.program_counter = 0x02C0;
        cpu.set_flag(Flag::Z, true);

        let ticks = step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.program_counter, 0x0341);
        assert_eq!(ticks, 4); // base 2 + taken 1 + page cross 1
    }

    #[test]
    fn branch_taken_in_page_costs_three_cycles() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xF0, 0x10]);
        cpu.program_counter = 0x0200;
        cpu.set_flag(Flag::Z, true);

        let ticks = step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.program_counter, 0x0212);
        assert_eq!(ticks, 3);
    }

    #[test]
    fn branch_not_taken_costs_two_cycles() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xF0, 0x10]);
        cpu.program_counter = 0x0200;
        cpu.set_flag(Flag::Z, false);

        let ticks = step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.program_counter, 0x0202);
        assert_eq!(ticks, 2);
    }

    #[test]
    fn jmp_indirect_wraps_within_the_pointer_page() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0400, &[0x6C, 0xFF, 0x02]); // JMP ($02FF)
        cpu.program_counter = 0x0400;
        bus.cpu_write(0x02FF, 0x80);
        bus.cpu_write(0x0300, 0x10); // must NOT be used for the high byte
        bus.cpu_write(0x0200, 0x50);

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.program_counter, 0x5080);
    }

    #[test]
    fn absolute_indexed_page_cross_adds_a_cycle_for_loads_only() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xBD, 0xFF, 0x02]); // LDA $02FF,X
        cpu.program_counter = 0x0200;
        cpu.x_index_reg = 0x01;

        let ticks = step_instruction(&mut cpu, &mut bus);
        assert_eq!(ticks, 5); // 4 + page cross

        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x9D, 0xFF, 0x02]); // STA $02FF,X
        cpu.program_counter = 0x0200;
        cpu.x_index_reg = 0x01;

        let ticks = step_instruction(&mut cpu, &mut bus);
        assert_eq!(ticks, 5); // fixed cost, no penalty on top
    }

    #[test]
    fn jsr_and_rts_round_trip() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x20, 0x00, 0x03]); // JSR $0300
        load_program(&mut bus, 0x0300, &[0x60]); // RTS
        cpu.program_counter = 0x0200;
        let initial_sp = cpu.stack_pointer;

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.program_counter, 0x0300);

        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.program_counter, 0x0203);
        assert_eq!(cpu.stack_pointer, initial_sp);
    }

    #[test]
    fn brk_and_rti_round_trip() {
        let (mut cpu, mut bus) = test_system();
        bus.cpu_write(0xFFFE, 0x00);
        bus.cpu_write(0xFFFF, 0x90);
        load_program(&mut bus, 0x0200, &[0x00]); // BRK
        cpu.program_counter = 0x0200;
        cpu.set_flag(Flag::C, true);

        step_instruction(&mut cpu, &mut bus);

        assert_eq!(cpu.program_counter, 0x9000);
        assert!(cpu.get_flag(Flag::I));
        // pushed status carries B and U
        let pushed = bus.cpu_read(STACK_START | 0xFB);
        assert!(pushed & Flag::B.mask() != 0);
        assert!(pushed & Flag::U.mask() != 0);
        assert!(pushed & Flag::C.mask() != 0);

        // RTI comes back to the byte after the BRK padding
        bus.cpu_write(0x9000, 0x40);
        step_instruction(&mut cpu, &mut bus);
        assert_eq!(cpu.program_counter, 0x0202);
        assert!(cpu.get_flag(Flag::C));
    }

    #[test]
    fn nmi_pushes_pc_high_byte_correctly() {
        let (mut cpu, mut bus) = test_system();
        bus.cpu_write(0xFFFA, 0x00);
        bus.cpu_write(0xFFFB, 0x95);
        cpu.program_counter = 0xC123;

        cpu.nmi(&mut bus);

        assert_eq!(cpu.program_counter, 0x9500);
        assert_eq!(bus.cpu_read(STACK_START | 0xFD), 0xC1);
        assert_eq!(bus.cpu_read(STACK_START | 0xFC), 0x23);

        let pushed_status = bus.cpu_read(STACK_START | 0xFB);
        assert!(pushed_status & Flag::U.mask() != 0);
        assert!(pushed_status & Flag::B.mask() == 0);
        assert!(cpu.get_flag(Flag::I));
    }

    #[test]
    fn irq_is_masked_by_the_interrupt_flag() {
        let (mut cpu, mut bus) = test_system();
        bus.cpu_write(0xFFFE, 0x00);
        bus.cpu_write(0xFFFF, 0x95);
        cpu.program_counter = 0xC000;

        cpu.set_flag(Flag::I, true);
        cpu.irq(&mut bus);
        assert_eq!(cpu.program_counter, 0xC000);

        cpu.set_flag(Flag::I, false);
        cpu.irq(&mut bus);
        assert_eq!(cpu.program_counter, 0x9500);
        assert_eq!(cpu.cycles_remaining, 7);
    }

    #[test]
    fn pushed_interrupt_status_keeps_the_old_interrupt_flag() {
        let (mut cpu, mut bus) = test_system();
        bus.cpu_write(0xFFFA, 0x00);
        bus.cpu_write(0xFFFB, 0x95);
        cpu.program_counter = 0xC000;
        cpu.set_flag(Flag::I, false);

        cpu.nmi(&mut bus);

        let pushed_status = bus.cpu_read(STACK_START | 0xFB);
        assert!(pushed_status & Flag::I.mask() == 0);
        assert!(cpu.get_flag(Flag::I));
    }

    #[test]
    fn shifts_and_rotates_move_the_carry() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x0A, 0x2A, 0x4A, 0x6A]);
        cpu.program_counter = 0x0200;
        cpu.accumulator = 0x81;

        step_instruction(&mut cpu, &mut bus); // ASL
        assert_eq!(cpu.accumulator, 0x02);
        assert!(cpu.get_flag(Flag::C));

        step_instruction(&mut cpu, &mut bus); // ROL feeds carry back in
        assert_eq!(cpu.accumulator, 0x05);
        assert!(!cpu.get_flag(Flag::C));

        step_instruction(&mut cpu, &mut bus); // LSR
        assert_eq!(cpu.accumulator, 0x02);
        assert!(cpu.get_flag(Flag::C));

        step_instruction(&mut cpu, &mut bus); // ROR feeds carry into bit 7
        assert_eq!(cpu.accumulator, 0x81);
        assert!(!cpu.get_flag(Flag::C));
    }

    #[test]
    fn rmw_instructions_write_memory_and_flags() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0xE6, 0x10, 0xC6, 0x10, 0xC6, 0x10]);
        cpu.program_counter = 0x0200;
        bus.cpu_write(0x0010, 0xFF);

        step_instruction(&mut cpu, &mut bus); // INC -> 0x00
        assert_eq!(bus.cpu_read(0x0010), 0x00);
        assert!(cpu.get_flag(Flag::Z));

        step_instruction(&mut cpu, &mut bus); // DEC -> 0xFF
        assert_eq!(bus.cpu_read(0x0010), 0xFF);
        assert!(cpu.get_flag(Flag::N));

        step_instruction(&mut cpu, &mut bus); // DEC -> 0xFE
        assert_eq!(bus.cpu_read(0x0010), 0xFE);
    }

    #[test]
    fn unofficial_opcodes_consume_six_cycles() {
        let (mut cpu, mut bus) = test_system();
        load_program(&mut bus, 0x0200, &[0x02]);
        cpu.program_counter = 0x0200;

        let ticks = step_instruction(&mut cpu, &mut bus);

        assert_eq!(ticks, 6);
        assert_eq!(cpu.program_counter, 0x0201);
    }

    #[test]
    fn every_opcode_settles_to_zero_cycles() {
        for code in 0..=255u8 {
            let (mut cpu, mut bus) = test_system();
            // vectors point somewhere harmless for BRK
            bus.cpu_write(0xFFFE, 0x00);
            bus.cpu_write(0xFFFF, 0x90);
            load_program(&mut bus, 0x0200, &[code, 0x10, 0x02]);
            cpu.program_counter = 0x0200;

            let op = OPCODE_TABLE[code as usize];
            let ticks = step_instruction(&mut cpu, &mut bus);

            assert!(
                ticks >= op.cycles && ticks <= op.cycles + 2,
                "opcode {:02X} took {} ticks against a base of {}",
                code,
                ticks,
                op.cycles
            );
        }
    }
}

//! The 6502 instruction table: 256 rows of plain data. Dispatch happens in
//! the CPU by matching on the tags, never through function pointers.

/// Addressing mode tag. Determines how the operand's effective address (or
/// the operand itself, for IMP/ACC/IMM) is produced before an operation
/// runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    IMP, ACC, IMM,
    ZP0, ZPX, ZPY,
    REL, ABS, ABX,
    ABY, IND, IZX, IZY,
}

/// Operation tag. `XXX` stands in for every opcode this core does not
/// model; it burns its table cycles and does nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    ADC, AND, ASL, BCC, BCS, BEQ, BIT, BMI, BNE, BPL, BRK, BVC, BVS, CLC,
    CLD, CLI, CLV, CMP, CPX, CPY, DEC, DEX, DEY, EOR, INC, INX, INY, JMP,
    JSR, LDA, LDX, LDY, LSR, NOP, ORA, PHA, PHP, PLA, PLP, ROL, ROR, RTI,
    RTS, SBC, SEC, SED, SEI, STA, STX, STY, TAX, TAY, TSX, TXA, TXS, TYA,

    XXX,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub instr: Instr,
    pub addr_mode: AddrMode,
    pub cycles: u32,
}

impl Opcode {
    const fn new(instr: Instr, addr_mode: AddrMode, cycles: u32) -> Self {
        Self {
            instr,
            addr_mode,
            cycles,
        }
    }
}

const PLACEHOLDER: Opcode = Opcode::new(Instr::XXX, AddrMode::IMP, 6);

lazy_static! {
    /// Dense table indexed directly by the opcode byte. Rows not listed in
    /// `ENTRIES` keep the placeholder.
    pub static ref OPCODE_TABLE: [Opcode; 256] = {
        let mut table = [PLACEHOLDER; 256];

        for &(code, instr, addr_mode, cycles) in ENTRIES {
            table[code as usize] = Opcode::new(instr, addr_mode, cycles);
        }

        table
    };
}

#[rustfmt::skip]
const ENTRIES: &[(u8, Instr, AddrMode, u32)] = &[
    (0x69, Instr::ADC, AddrMode::IMM, 2),
    (0x65, Instr::ADC, AddrMode::ZP0, 3),
    (0x75, Instr::ADC, AddrMode::ZPX, 4),
    (0x6D, Instr::ADC, AddrMode::ABS, 4),
    (0x7D, Instr::ADC, AddrMode::ABX, 4),
    (0x79, Instr::ADC, AddrMode::ABY, 4),
    (0x61, Instr::ADC, AddrMode::IZX, 6),
    (0x71, Instr::ADC, AddrMode::IZY, 5),

    (0x29, Instr::AND, AddrMode::IMM, 2),
    (0x25, Instr::AND, AddrMode::ZP0, 3),
    (0x35, Instr::AND, AddrMode::ZPX, 4),
    (0x2D, Instr::AND, AddrMode::ABS, 4),
    (0x3D, Instr::AND, AddrMode::ABX, 4),
    (0x39, Instr::AND, AddrMode::ABY, 4),
    (0x21, Instr::AND, AddrMode::IZX, 6),
    (0x31, Instr::AND, AddrMode::IZY, 5),

    (0x0A, Instr::ASL, AddrMode::ACC, 2),
    (0x06, Instr::ASL, AddrMode::ZP0, 5),
    (0x16, Instr::ASL, AddrMode::ZPX, 6),
    (0x0E, Instr::ASL, AddrMode::ABS, 6),
    (0x1E, Instr::ASL, AddrMode::ABX, 7),

    (0x90, Instr::BCC, AddrMode::REL, 2),
    (0xB0, Instr::BCS, AddrMode::REL, 2),
    (0xF0, Instr::BEQ, AddrMode::REL, 2),

    (0x24, Instr::BIT, AddrMode::ZP0, 3),
    (0x2C, Instr::BIT, AddrMode::ABS, 4),

    (0x30, Instr::BMI, AddrMode::REL, 2),
    (0xD0, Instr::BNE, AddrMode::REL, 2),
    (0x10, Instr::BPL, AddrMode::REL, 2),

    (0x00, Instr::BRK, AddrMode::IMP, 7),

    (0x50, Instr::BVC, AddrMode::REL, 2),
    (0x70, Instr::BVS, AddrMode::REL, 2),

    (0x18, Instr::CLC, AddrMode::IMP, 2),
    (0xD8, Instr::CLD, AddrMode::IMP, 2),
    (0x58, Instr::CLI, AddrMode::IMP, 2),
    (0xB8, Instr::CLV, AddrMode::IMP, 2),

    (0xC9, Instr::CMP, AddrMode::IMM, 2),
    (0xC5, Instr::CMP, AddrMode::ZP0, 3),
    (0xD5, Instr::CMP, AddrMode::ZPX, 4),
    (0xCD, Instr::CMP, AddrMode::ABS, 4),
    (0xDD, Instr::CMP, AddrMode::ABX, 4),
    (0xD9, Instr::CMP, AddrMode::ABY, 4),
    (0xC1, Instr::CMP, AddrMode::IZX, 6),
    (0xD1, Instr::CMP, AddrMode::IZY, 5),

    (0xE0, Instr::CPX, AddrMode::IMM, 2),
    (0xE4, Instr::CPX, AddrMode::ZP0, 3),
    (0xEC, Instr::CPX, AddrMode::ABS, 4),

    (0xC0, Instr::CPY, AddrMode::IMM, 2),
    (0xC4, Instr::CPY, AddrMode::ZP0, 3),
    (0xCC, Instr::CPY, AddrMode::ABS, 4),

    (0xC6, Instr::DEC, AddrMode::ZP0, 5),
    (0xD6, Instr::DEC, AddrMode::ZPX, 6),
    (0xCE, Instr::DEC, AddrMode::ABS, 6),
    (0xDE, Instr::DEC, AddrMode::ABX, 7),

    (0xCA, Instr::DEX, AddrMode::IMP, 2),
    (0x88, Instr::DEY, AddrMode::IMP, 2),

    (0x49, Instr::EOR, AddrMode::IMM, 2),
    (0x45, Instr::EOR, AddrMode::ZP0, 3),
    (0x55, Instr::EOR, AddrMode::ZPX, 4),
    (0x4D, Instr::EOR, AddrMode::ABS, 4),
    (0x5D, Instr::EOR, AddrMode::ABX, 4),
    (0x59, Instr::EOR, AddrMode::ABY, 4),
    (0x41, Instr::EOR, AddrMode::IZX, 6),
    (0x51, Instr::EOR, AddrMode::IZY, 5),

    (0xE6, Instr::INC, AddrMode::ZP0, 5),
    (0xF6, Instr::INC, AddrMode::ZPX, 6),
    (0xEE, Instr::INC, AddrMode::ABS, 6),
    (0xFE, Instr::INC, AddrMode::ABX, 7),

    (0xE8, Instr::INX, AddrMode::IMP, 2),
    (0xC8, Instr::INY, AddrMode::IMP, 2),

    (0x4C, Instr::JMP, AddrMode::ABS, 3),
    (0x6C, Instr::JMP, AddrMode::IND, 5),

    (0x20, Instr::JSR, AddrMode::ABS, 6),

    (0xA9, Instr::LDA, AddrMode::IMM, 2),
    (0xA5, Instr::LDA, AddrMode::ZP0, 3),
    (0xB5, Instr::LDA, AddrMode::ZPX, 4),
    (0xAD, Instr::LDA, AddrMode::ABS, 4),
    (0xBD, Instr::LDA, AddrMode::ABX, 4),
    (0xB9, Instr::LDA, AddrMode::ABY, 4),
    (0xA1, Instr::LDA, AddrMode::IZX, 6),
    (0xB1, Instr::LDA, AddrMode::IZY, 5),

    (0xA2, Instr::LDX, AddrMode::IMM, 2),
    (0xA6, Instr::LDX, AddrMode::ZP0, 3),
    (0xB6, Instr::LDX, AddrMode::ZPY, 4),
    (0xAE, Instr::LDX, AddrMode::ABS, 4),
    (0xBE, Instr::LDX, AddrMode::ABY, 4),

    (0xA0, Instr::LDY, AddrMode::IMM, 2),
    (0xA4, Instr::LDY, AddrMode::ZP0, 3),
    (0xB4, Instr::LDY, AddrMode::ZPX, 4),
    (0xAC, Instr::LDY, AddrMode::ABS, 4),
    (0xBC, Instr::LDY, AddrMode::ABX, 4),

    (0x4A, Instr::LSR, AddrMode::ACC, 2),
    (0x46, Instr::LSR, AddrMode::ZP0, 5),
    (0x56, Instr::LSR, AddrMode::ZPX, 6),
    (0x4E, Instr::LSR, AddrMode::ABS, 6),
    (0x5E, Instr::LSR, AddrMode::ABX, 7),

    (0xEA, Instr::NOP, AddrMode::IMP, 2),

    (0x09, Instr::ORA, AddrMode::IMM, 2),
    (0x05, Instr::ORA, AddrMode::ZP0, 3),
    (0x15, Instr::ORA, AddrMode::ZPX, 4),
    (0x0D, Instr::ORA, AddrMode::ABS, 4),
    (0x1D, Instr::ORA, AddrMode::ABX, 4),
    (0x19, Instr::ORA, AddrMode::ABY, 4),
    (0x01, Instr::ORA, AddrMode::IZX, 6),
    (0x11, Instr::ORA, AddrMode::IZY, 5),

    (0x48, Instr::PHA, AddrMode::IMP, 3),
    (0x08, Instr::PHP, AddrMode::IMP, 3),
    (0x68, Instr::PLA, AddrMode::IMP, 4),
    (0x28, Instr::PLP, AddrMode::IMP, 4),

    (0x2A, Instr::ROL, AddrMode::ACC, 2),
    (0x26, Instr::ROL, AddrMode::ZP0, 5),
    (0x36, Instr::ROL, AddrMode::ZPX, 6),
    (0x2E, Instr::ROL, AddrMode::ABS, 6),
    (0x3E, Instr::ROL, AddrMode::ABX, 7),

    (0x6A, Instr::ROR, AddrMode::ACC, 2),
    (0x66, Instr::ROR, AddrMode::ZP0, 5),
    (0x76, Instr::ROR, AddrMode::ZPX, 6),
    (0x6E, Instr::ROR, AddrMode::ABS, 6),
    (0x7E, Instr::ROR, AddrMode::ABX, 7),

    (0x40, Instr::RTI, AddrMode::IMP, 6),
    (0x60, Instr::RTS, AddrMode::IMP, 6),

    (0xE9, Instr::SBC, AddrMode::IMM, 2),
    (0xE5, Instr::SBC, AddrMode::ZP0, 3),
    (0xF5, Instr::SBC, AddrMode::ZPX, 4),
    (0xED, Instr::SBC, AddrMode::ABS, 4),
    (0xFD, Instr::SBC, AddrMode::ABX, 4),
    (0xF9, Instr::SBC, AddrMode::ABY, 4),
    (0xE1, Instr::SBC, AddrMode::IZX, 6),
    (0xF1, Instr::SBC, AddrMode::IZY, 5),

    (0x38, Instr::SEC, AddrMode::IMP, 2),
    (0xF8, Instr::SED, AddrMode::IMP, 2),
    (0x78, Instr::SEI, AddrMode::IMP, 2),

    (0x85, Instr::STA, AddrMode::ZP0, 3),
    (0x95, Instr::STA, AddrMode::ZPX, 4),
    (0x8D, Instr::STA, AddrMode::ABS, 4),
    (0x9D, Instr::STA, AddrMode::ABX, 5),
    (0x99, Instr::STA, AddrMode::ABY, 5),
    (0x81, Instr::STA, AddrMode::IZX, 6),
    (0x91, Instr::STA, AddrMode::IZY, 6),

    (0x86, Instr::STX, AddrMode::ZP0, 3),
    (0x96, Instr::STX, AddrMode::ZPY, 4),
    (0x8E, Instr::STX, AddrMode::ABS, 4),

    (0x84, Instr::STY, AddrMode::ZP0, 3),
    (0x94, Instr::STY, AddrMode::ZPX, 4),
    (0x8C, Instr::STY, AddrMode::ABS, 4),

    (0xAA, Instr::TAX, AddrMode::IMP, 2),
    (0xA8, Instr::TAY, AddrMode::IMP, 2),
    (0xBA, Instr::TSX, AddrMode::IMP, 2),
    (0x8A, Instr::TXA, AddrMode::IMP, 2),
    (0x9A, Instr::TXS, AddrMode::IMP, 2),
    (0x98, Instr::TYA, AddrMode::IMP, 2),
];

use crate::addr::Addr;

/// Addressing modes of the 65816, named after the operand syntax they render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Absolute, `$hhll`
    A,
    /// Absolute Indexed Indirect, `($hhll,X)`
    Axi,
    /// Absolute Indexed, X
    Ax,
    /// Absolute Indexed, Y
    Ay,
    /// Absolute Indirect, `($hhll)`
    Ai,
    /// Absolute Indirect Long, `[$hhll]`
    Ail,
    /// Absolute Long
    Al,
    /// Absolute Long Indexed, X
    Alx,
    /// Accumulator
    Acc,
    /// Block Move, `$src,$dst`
    Move,
    /// Direct Page
    D,
    /// Direct Page Indexed Indirect, X
    Dxi,
    /// Direct Indexed, X
    Dx,
    /// Direct Indexed, Y
    Dy,
    /// Direct Page Indirect
    Di,
    /// Direct Page Indirect Indexed, Y
    Diy,
    /// Direct Page Indirect Long
    Dil,
    /// Direct Page Indirect Long Indexed, Y
    Dily,
    /// Immediate, always one byte (REP/SEP)
    Imm8,
    /// Immediate, sized by the accumulator width
    ImmM,
    /// Immediate, sized by the index register width
    ImmX,
    /// Implied
    Imp,
    /// Program Counter Relative
    Near,
    /// Program Counter Relative Long
    Rel,
    /// Stack Relative Indirect Indexed, Y
    Siy,
    /// Stack Relative
    S,
}

impl Mode {
    pub const fn operand_size(self, acc16: bool, idx16: bool) -> u8 {
        use Mode::*;
        match self {
            Acc | Imp => 0,
            D | Dxi | Dx | Dy | Di | Diy | Dil | Dily | Imm8 | Near | Siy | S => 1,
            A | Axi | Ax | Ay | Ai | Ail | Move | Rel => 2,
            Al | Alx => 3,
            ImmM => 1 + acc16 as u8,
            ImmX => 1 + idx16 as u8,
        }
    }

    pub const fn is_relative(self) -> bool {
        matches!(self, Mode::Near | Mode::Rel)
    }
}

use Mode::*;

static OPCODES: [(&str, Mode); 256] = [
    // 0x00
    ("BRK", D), ("ORA", Dxi), ("COP", D), ("ORA", S),
    ("TSB", D), ("ORA", D), ("ASL", D), ("ORA", Dil),
    ("PHP", Imp), ("ORA", ImmM), ("ASL", Acc), ("PHD", Imp),
    ("TSB", A), ("ORA", A), ("ASL", A), ("ORA", Al),
    // 0x10
    ("BPL", Near), ("ORA", Diy), ("ORA", Di), ("ORA", Siy),
    ("TRB", D), ("ORA", Dx), ("ASL", Dx), ("ORA", Dily),
    ("CLC", Imp), ("ORA", Ay), ("INC", Acc), ("TCS", Imp),
    ("TRB", A), ("ORA", Ax), ("ASL", Ax), ("ORA", Alx),
    // 0x20
    ("JSR", A), ("AND", Dxi), ("JSL", Al), ("AND", S),
    ("BIT", D), ("AND", D), ("ROL", D), ("AND", Dil),
    ("PLP", Imp), ("AND", ImmM), ("ROL", Acc), ("PLD", Imp),
    ("BIT", A), ("AND", A), ("ROL", A), ("AND", Al),
    // 0x30
    ("BMI", Near), ("AND", Diy), ("AND", Di), ("AND", Siy),
    ("BIT", Dx), ("AND", Dx), ("ROL", Dx), ("AND", Dily),
    ("SEC", Imp), ("AND", Ay), ("DEC", Acc), ("TSC", Imp),
    ("BIT", Ax), ("AND", Ax), ("ROL", Ax), ("AND", Alx),
    // 0x40
    ("RTI", Imp), ("EOR", Dxi), ("WDM", D), ("EOR", S),
    ("MVP", Move), ("EOR", D), ("LSR", D), ("EOR", Dil),
    ("PHA", Imp), ("EOR", ImmM), ("LSR", Acc), ("PHK", Imp),
    ("JMP", A), ("EOR", A), ("LSR", A), ("EOR", Al),
    // 0x50
    ("BVC", Near), ("EOR", Diy), ("EOR", Di), ("EOR", Siy),
    ("MVN", Move), ("EOR", Dx), ("LSR", Dx), ("EOR", Dily),
    ("CLI", Imp), ("EOR", Ay), ("PHY", Imp), ("TCD", Imp),
    ("JML", Al), ("EOR", Ax), ("LSR", Ax), ("EOR", Alx),
    // 0x60
    ("RTS", Imp), ("ADC", Dxi), ("PER", Rel), ("ADC", S),
    ("STZ", D), ("ADC", D), ("ROR", D), ("ADC", Dil),
    ("PLA", Imp), ("ADC", ImmM), ("ROR", Acc), ("RTL", Imp),
    ("JMP", Ai), ("ADC", A), ("ROR", A), ("ADC", Al),
    // 0x70
    ("BVS", Near), ("ADC", Diy), ("ADC", Di), ("ADC", Siy),
    ("STZ", Dx), ("ADC", Dx), ("ROR", Dx), ("ADC", Dily),
    ("SEI", Imp), ("ADC", Ay), ("PLY", Imp), ("TDC", Imp),
    ("JMP", Axi), ("ADC", Ax), ("ROR", Ax), ("ADC", Alx),
    // 0x80
    ("BRA", Near), ("STA", Dxi), ("BRL", Rel), ("STA", S),
    ("STY", D), ("STA", D), ("STX", D), ("STA", Dil),
    ("DEY", Imp), ("BIT", ImmM), ("TXA", Imp), ("PHB", Imp),
    ("STY", A), ("STA", A), ("STX", A), ("STA", Al),
    // 0x90
    ("BCC", Near), ("STA", Diy), ("STA", Di), ("STA", Siy),
    ("STY", Dx), ("STA", Dx), ("STX", Dy), ("STA", Dily),
    ("TYA", Imp), ("STA", Ay), ("TXS", Imp), ("TXY", Imp),
    ("STZ", A), ("STA", Ax), ("STZ", Ax), ("STA", Alx),
    // 0xA0
    ("LDY", ImmX), ("LDA", Dxi), ("LDX", ImmX), ("LDA", S),
    ("LDY", D), ("LDA", D), ("LDX", D), ("LDA", Dil),
    ("TAY", Imp), ("LDA", ImmM), ("TAX", Imp), ("PLB", Imp),
    ("LDY", A), ("LDA", A), ("LDX", A), ("LDA", Al),
    // 0xB0
    ("BCS", Near), ("LDA", Diy), ("LDA", Di), ("LDA", Siy),
    ("LDY", Dx), ("LDA", Dx), ("LDX", Dy), ("LDA", Dily),
    ("CLV", Imp), ("LDA", Ay), ("TSX", Imp), ("TYX", Imp),
    ("LDY", Ax), ("LDA", Ax), ("LDX", Ay), ("LDA", Alx),
    // 0xC0
    ("CPY", ImmX), ("CMP", Dxi), ("REP", Imm8), ("CMP", S),
    ("CPY", D), ("CMP", D), ("DEC", D), ("CMP", Dil),
    ("INY", Imp), ("CMP", ImmM), ("DEX", Imp), ("WAI", Imp),
    ("CPY", A), ("CMP", A), ("DEC", A), ("CMP", Al),
    // 0xD0
    ("BNE", Near), ("CMP", Diy), ("CMP", Di), ("CMP", Siy),
    ("PEI", Di), ("CMP", Dx), ("DEC", Dx), ("CMP", Dily),
    ("CLD", Imp), ("CMP", Ay), ("PHX", Imp), ("STP", Imp),
    ("JML", Ail), ("CMP", Ax), ("DEC", Ax), ("CMP", Alx),
    // 0xE0
    ("CPX", ImmX), ("SBC", Dxi), ("SEP", Imm8), ("SBC", S),
    ("CPX", D), ("SBC", D), ("INC", D), ("SBC", Dil),
    ("INX", Imp), ("SBC", ImmM), ("NOP", Imp), ("XBA", Imp),
    ("CPX", A), ("SBC", A), ("INC", A), ("SBC", Al),
    // 0xF0
    ("BEQ", Near), ("SBC", Diy), ("SBC", Di), ("SBC", Siy),
    ("PEA", A), ("SBC", Dx), ("INC", Dx), ("SBC", Dily),
    ("SED", Imp), ("SBC", Ay), ("PLX", Imp), ("XCE", Imp),
    ("JSR", Axi), ("SBC", Ax), ("INC", Ax), ("SBC", Alx),
];

const BRANCHES: [u8; 10] = [0x10, 0x30, 0x50, 0x70, 0x80, 0x82, 0x90, 0xb0, 0xd0, 0xf0];
const JUMPS: [u8; 5] = [0x4c, 0x5c, 0x6c, 0x7c, 0xdc];
const CALLS: [u8; 3] = [0x20, 0x22, 0xfc];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct OpCode(pub u8);

impl OpCode {
    pub const JSR: Self = Self(0x20);
    pub const JSL: Self = Self(0x22);
    pub const JMP: Self = Self(0x4c);
    pub const JML: Self = Self(0x5c);

    pub const fn name(self) -> &'static str {
        OPCODES[self.0 as usize].0
    }

    pub const fn mode(self) -> Mode {
        OPCODES[self.0 as usize].1
    }

    /// Conditional and unconditional relative branches.
    pub fn is_branch(self) -> bool {
        BRANCHES.contains(&self.0)
    }

    pub fn is_jump(self) -> bool {
        JUMPS.contains(&self.0)
    }

    pub fn is_call(self) -> bool {
        CALLS.contains(&self.0)
    }

    /// Whether the instruction transfers control somewhere a static pass may have recorded.
    pub fn transfers_control(self) -> bool {
        self.is_branch() || self.is_jump() || self.is_call()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub pc: u32,
    pub opcode: OpCode,
    /// Rendered operand, empty for implied instructions.
    pub operand: String,
    /// Raw little-endian operand value.
    pub value: u32,
    pub len: u8,
    /// Destination of a relative branch, inside the bank of `pc`.
    pub target: Option<u32>,
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        self.opcode.name()
    }
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:06X} {}", self.pc, self.mnemonic())?;
        if !self.operand.is_empty() {
            write!(f, " {}", self.operand)?;
        }
        Ok(())
    }
}

/// Copies up to four bytes of `bytes` into a zero-filled decode window.
pub fn window(bytes: &[u8]) -> Option<[u8; 4]> {
    if bytes.is_empty() {
        return None;
    }
    let mut window = [0; 4];
    let n = bytes.len().min(4);
    window[..n].copy_from_slice(&bytes[..n]);
    Some(window)
}

/// Decodes the instruction at `pc`.
///
/// The accumulator and index widths come from the code map; they are never
/// guessed from the byte stream.
pub fn decode(pc: u32, acc16: bool, idx16: bool, window: [u8; 4]) -> Instruction {
    let opcode = OpCode(window[0]);
    let mode = opcode.mode();
    let size = mode.operand_size(acc16, idx16);
    let [_, b1, b2, b3] = window;
    let value = match size {
        0 => 0,
        1 => b1 as u32,
        2 => u16::from_le_bytes([b1, b2]) as u32,
        _ => u32::from_le_bytes([b1, b2, b3, 0]),
    };
    let here = Addr::from_u32(pc);
    let target = match mode {
        Near => Some(here.near_branch(b1).to_u32()),
        Rel => Some(here.long_branch(value as u16).to_u32()),
        _ => None,
    };
    let operand = match mode {
        A => format!("${value:04X}"),
        Axi => format!("(${value:04X},X)"),
        Ax => format!("${value:04X},X"),
        Ay => format!("${value:04X},Y"),
        Ai => format!("(${value:04X})"),
        Ail => format!("[${value:04X}]"),
        Al => format!("${value:06X}"),
        Alx => format!("${value:06X},X"),
        Acc => "A".to_string(),
        Move => format!("${b2:02X},${b1:02X}"),
        D => format!("${b1:02X}"),
        Dxi => format!("(${b1:02X},X)"),
        Dx => format!("${b1:02X},X"),
        Dy => format!("${b1:02X},Y"),
        Di => format!("(${b1:02X})"),
        Diy => format!("(${b1:02X}),Y"),
        Dil => format!("[${b1:02X}]"),
        Dily => format!("[${b1:02X}],Y"),
        Imm8 => format!("#${b1:02X}"),
        ImmM | ImmX if size == 2 => format!("#${value:04X}"),
        ImmM | ImmX => format!("#${value:02X}"),
        Imp => String::new(),
        Near | Rel => format!("${:04X}", target.unwrap_or_default() & 0xffff),
        Siy => format!("(${b1:02X},S),Y"),
        S => format!("${b1:02X},S"),
    };
    Instruction {
        pc,
        opcode,
        operand,
        value,
        len: 1 + size,
        target,
    }
}

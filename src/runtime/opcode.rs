//! Bytecode instruction set for compiled stories.

/// One VM instruction.
///
/// Operands follow the opcode byte inline: `Const`, `Load`, `Store`,
/// `LoadGlobal`, `StoreGlobal`, `Call`, and `Divert` take a one-byte
/// constant-pool or stack-slot index; the jump family takes a big-endian
/// two-byte forward offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Exit,
    Ret,
    Pop,
    True,
    False,
    Const,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Not,
    CmpEq,
    CmpLt,
    CmpGt,
    CmpLte,
    CmpGte,
    Jmp,
    JmpT,
    JmpF,
    Call,
    Divert,
    Load,
    Store,
    LoadGlobal,
    StoreGlobal,
    LoadChoiceId,
    ContentPush,
    Line,
    Glue,
    ChoicePush,
    Flush,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Exit => "exit",
            Opcode::Ret => "ret",
            Opcode::Pop => "pop",
            Opcode::True => "true",
            Opcode::False => "false",
            Opcode::Const => "const",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mod => "mod",
            Opcode::Neg => "neg",
            Opcode::Not => "not",
            Opcode::CmpEq => "cmp_eq",
            Opcode::CmpLt => "cmp_lt",
            Opcode::CmpGt => "cmp_gt",
            Opcode::CmpLte => "cmp_lte",
            Opcode::CmpGte => "cmp_gte",
            Opcode::Jmp => "jmp",
            Opcode::JmpT => "jmp_t",
            Opcode::JmpF => "jmp_f",
            Opcode::Call => "call",
            Opcode::Divert => "divert",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::LoadGlobal => "load_global",
            Opcode::StoreGlobal => "store_global",
            Opcode::LoadChoiceId => "load_choice_id",
            Opcode::ContentPush => "content_push",
            Opcode::Line => "line",
            Opcode::Glue => "glue",
            Opcode::ChoicePush => "choice_push",
            Opcode::Flush => "flush",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        const TABLE: &[Opcode] = &[
            Opcode::Exit,
            Opcode::Ret,
            Opcode::Pop,
            Opcode::True,
            Opcode::False,
            Opcode::Const,
            Opcode::Add,
            Opcode::Sub,
            Opcode::Mul,
            Opcode::Div,
            Opcode::Mod,
            Opcode::Neg,
            Opcode::Not,
            Opcode::CmpEq,
            Opcode::CmpLt,
            Opcode::CmpGt,
            Opcode::CmpLte,
            Opcode::CmpGte,
            Opcode::Jmp,
            Opcode::JmpT,
            Opcode::JmpF,
            Opcode::Call,
            Opcode::Divert,
            Opcode::Load,
            Opcode::Store,
            Opcode::LoadGlobal,
            Opcode::StoreGlobal,
            Opcode::LoadChoiceId,
            Opcode::ContentPush,
            Opcode::Line,
            Opcode::Glue,
            Opcode::ChoicePush,
            Opcode::Flush,
        ];
        TABLE.get(byte as usize).copied().ok_or(byte)
    }
}

//! Opcode definitions
//!
//! Operation identifiers carried in byte 1 of every packet header.

/// Binary protocol opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Get = 0x00,
    Set = 0x01,
    Add = 0x02,
    Replace = 0x03,
    Delete = 0x04,
    Increment = 0x05,
    Decrement = 0x06,
    Quit = 0x07,
    Flush = 0x08,
    GetQ = 0x09,
    Noop = 0x0a,
    Version = 0x0b,
    GetK = 0x0c,
    GetKQ = 0x0d,
    Append = 0x0e,
    Prepend = 0x0f,
    Stat = 0x10,
    SetQ = 0x11,
    AddQ = 0x12,
    ReplaceQ = 0x13,
    DeleteQ = 0x14,
    IncrementQ = 0x15,
    DecrementQ = 0x16,
    QuitQ = 0x17,
    FlushQ = 0x18,
    AppendQ = 0x19,
    PrependQ = 0x1a,
    Touch = 0x1c,
    Gat = 0x1d,
    GatQ = 0x1e,
    GatK = 0x23,
    GatKQ = 0x24,
}

impl Opcode {
    /// Map a wire byte to an opcode, `None` for codes outside the table
    pub fn from_u8(value: u8) -> Option<Self> {
        let opcode = match value {
            0x00 => Opcode::Get,
            0x01 => Opcode::Set,
            0x02 => Opcode::Add,
            0x03 => Opcode::Replace,
            0x04 => Opcode::Delete,
            0x05 => Opcode::Increment,
            0x06 => Opcode::Decrement,
            0x07 => Opcode::Quit,
            0x08 => Opcode::Flush,
            0x09 => Opcode::GetQ,
            0x0a => Opcode::Noop,
            0x0b => Opcode::Version,
            0x0c => Opcode::GetK,
            0x0d => Opcode::GetKQ,
            0x0e => Opcode::Append,
            0x0f => Opcode::Prepend,
            0x10 => Opcode::Stat,
            0x11 => Opcode::SetQ,
            0x12 => Opcode::AddQ,
            0x13 => Opcode::ReplaceQ,
            0x14 => Opcode::DeleteQ,
            0x15 => Opcode::IncrementQ,
            0x16 => Opcode::DecrementQ,
            0x17 => Opcode::QuitQ,
            0x18 => Opcode::FlushQ,
            0x19 => Opcode::AppendQ,
            0x1a => Opcode::PrependQ,
            0x1c => Opcode::Touch,
            0x1d => Opcode::Gat,
            0x1e => Opcode::GatQ,
            0x23 => Opcode::GatK,
            0x24 => Opcode::GatKQ,
            _ => return None,
        };
        Some(opcode)
    }

    /// Quiet opcodes get no response on success; [`Connection`] refuses
    /// to send them
    ///
    /// [`Connection`]: crate::network::Connection
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            Opcode::GetQ
                | Opcode::GetKQ
                | Opcode::SetQ
                | Opcode::AddQ
                | Opcode::ReplaceQ
                | Opcode::DeleteQ
                | Opcode::IncrementQ
                | Opcode::DecrementQ
                | Opcode::QuitQ
                | Opcode::FlushQ
                | Opcode::AppendQ
                | Opcode::PrependQ
                | Opcode::GatQ
                | Opcode::GatKQ
        )
    }

    /// Short upper-case name, used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Get => "GET",
            Opcode::Set => "SET",
            Opcode::Add => "ADD",
            Opcode::Replace => "REPLACE",
            Opcode::Delete => "DELETE",
            Opcode::Increment => "INCREMENT",
            Opcode::Decrement => "DECREMENT",
            Opcode::Quit => "QUIT",
            Opcode::Flush => "FLUSH",
            Opcode::GetQ => "GETQ",
            Opcode::Noop => "NOOP",
            Opcode::Version => "VERSION",
            Opcode::GetK => "GETK",
            Opcode::GetKQ => "GETKQ",
            Opcode::Append => "APPEND",
            Opcode::Prepend => "PREPEND",
            Opcode::Stat => "STAT",
            Opcode::SetQ => "SETQ",
            Opcode::AddQ => "ADDQ",
            Opcode::ReplaceQ => "REPLACEQ",
            Opcode::DeleteQ => "DELETEQ",
            Opcode::IncrementQ => "INCREMENTQ",
            Opcode::DecrementQ => "DECREMENTQ",
            Opcode::QuitQ => "QUITQ",
            Opcode::FlushQ => "FLUSHQ",
            Opcode::AppendQ => "APPENDQ",
            Opcode::PrependQ => "PREPENDQ",
            Opcode::Touch => "TOUCH",
            Opcode::Gat => "GAT",
            Opcode::GatQ => "GATQ",
            Opcode::GatK => "GATK",
            Opcode::GatKQ => "GATKQ",
        }
    }
}

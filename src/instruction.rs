// instruction.rs
//
// Immutable decoded instruction record. The simulator recognizes six
// opcodes: one load, one store, and four FP arithmetic operations.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Ld,
    Sd,
    Addd,
    Subd,
    Multd,
    Divd,
}

impl Opcode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LD" => Some(Opcode::Ld),
            "SD" => Some(Opcode::Sd),
            "ADDD" => Some(Opcode::Addd),
            "SUBD" => Some(Opcode::Subd),
            "MULTD" => Some(Opcode::Multd),
            "DIVD" => Some(Opcode::Divd),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Ld => "LD",
            Opcode::Sd => "SD",
            Opcode::Addd => "ADDD",
            Opcode::Subd => "SUBD",
            Opcode::Multd => "MULTD",
            Opcode::Divd => "DIVD",
        }
    }

    pub fn is_store(self) -> bool {
        matches!(self, Opcode::Sd)
    }

    pub fn is_load(self) -> bool {
        matches!(self, Opcode::Ld)
    }

    /// The arithmetic infix symbol used when formatting a functional unit's result.
    pub fn infix(self) -> &'static str {
        match self {
            Opcode::Addd => "+",
            Opcode::Subd => "-",
            Opcode::Multd => "*",
            Opcode::Divd => "/",
            Opcode::Ld | Opcode::Sd => "",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `<OPCODE> <DEST> <SRC1> <SRC2>` as parsed from the assembly listing.
///
/// For SD, `destination` holds the store-source register (the value being
/// stored), not a destination in the write-back sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub destination: String,
    pub src1: String,
    pub src2: String,
}

impl Instruction {
    pub fn new(opcode: Opcode, destination: String, src1: String, src2: String) -> Self {
        Self { opcode, destination, src1, src2 }
    }

    /// Render in RISC-V FP assembly syntax for the trace's ROB entry column.
    pub fn to_riscv(&self) -> String {
        match self.opcode {
            Opcode::Ld => format!("fld {} {}({})", self.destination, self.src1, self.src2),
            Opcode::Sd => format!("fsd {} {}({})", self.destination, self.src1, self.src2),
            Opcode::Addd => format!("fadd.d {},{},{}", self.destination, self.src1, self.src2),
            Opcode::Subd => format!("fsub.d {},{},{}", self.destination, self.src1, self.src2),
            Opcode::Multd => format!("fmul.d {},{},{}", self.destination, self.src1, self.src2),
            Opcode::Divd => format!("fdiv.d {},{},{}", self.destination, self.src1, self.src2),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.opcode, self.destination, self.src1, self.src2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn riscv_rendering_matches_reference_forms() {
        let ld = Instruction::new(Opcode::Ld, "F6".into(), "34".into(), "R2".into());
        assert_eq!(ld.to_riscv(), "fld F6 34(R2)");

        let add = Instruction::new(Opcode::Addd, "F0".into(), "F6".into(), "F4".into());
        assert_eq!(add.to_riscv(), "fadd.d F0,F6,F4");

        let div = Instruction::new(Opcode::Divd, "F10".into(), "F0".into(), "F6".into());
        assert_eq!(div.to_riscv(), "fdiv.d F10,F0,F6");
    }

    #[test]
    fn opcode_round_trips_through_str() {
        for op in [Opcode::Ld, Opcode::Sd, Opcode::Addd, Opcode::Subd, Opcode::Multd, Opcode::Divd] {
            assert_eq!(Opcode::from_str(op.as_str()), Some(op));
        }
        assert_eq!(Opcode::from_str("NOPE"), None);
    }
}

// operand.rs
//
// Tagged replacement for the source's "either a register index or a
// string starting with #" operand slot (see SPEC_FULL.md §9). A resolved
// `vj`/`vk` is either a raw FP register index awaiting formatting, or a
// value already forwarded from the CDB under a given ROB tag.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceValue {
    /// An FP register index whose value is available in the register file
    /// (or, for load addresses, a base/address register index).
    Reg(u32),
    /// A value forwarded from the CDB, tagged by the producing ROB index.
    /// Rendered as `#<tag>` per the source's convention.
    Forwarded(u32),
}

impl SourceValue {
    /// Render as an arithmetic operand: `Reg[F<i>]` for an unresolved
    /// register operand, `#<tag>` for a forwarded one.
    pub fn render_fp(self) -> String {
        match self {
            SourceValue::Reg(i) => format!("Reg[F{}]", i),
            SourceValue::Forwarded(tag) => format!("#{}", tag),
        }
    }

    /// Render as a base-register operand for load effective-address
    /// formatting: `Regs[R<i>]` for an unresolved register, `#<tag>`
    /// otherwise.
    pub fn render_base(self) -> String {
        match self {
            SourceValue::Reg(i) => format!("Regs[R{}]", i),
            SourceValue::Forwarded(tag) => format!("#{}", tag),
        }
    }

    /// Bare textual form used when printing reservation-station vj/vk
    /// columns in the trace (e.g. `12` or `#3`).
    pub fn render_bare(self) -> String {
        match self {
            SourceValue::Reg(i) => i.to_string(),
            SourceValue::Forwarded(tag) => format!("#{}", tag),
        }
    }

    /// Render a reservation-station vj/vk column: an unresolved register is
    /// wrapped `Regs[R<i>]` for a load station, `Regs[F<i>]` otherwise; a
    /// forwarded value stays bare (`#<tag>`).
    pub fn render_station_operand(self, is_load: bool) -> String {
        match self {
            SourceValue::Reg(i) if is_load => format!("Regs[R{}]", i),
            SourceValue::Reg(i) => format!("Regs[F{}]", i),
            SourceValue::Forwarded(tag) => format!("#{}", tag),
        }
    }
}

impl fmt::Display for SourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_bare())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_register_and_forwarded_operands_distinctly() {
        assert_eq!(SourceValue::Reg(6).render_fp(), "Reg[F6]");
        assert_eq!(SourceValue::Forwarded(3).render_fp(), "#3");
        assert_eq!(SourceValue::Reg(2).render_base(), "Regs[R2]");
        assert_eq!(SourceValue::Forwarded(5).render_base(), "#5");
    }

    #[test]
    fn station_operand_wraps_by_load_vs_arithmetic() {
        assert_eq!(SourceValue::Reg(2).render_station_operand(true), "Regs[R2]");
        assert_eq!(SourceValue::Reg(6).render_station_operand(false), "Regs[F6]");
        assert_eq!(SourceValue::Forwarded(3).render_station_operand(true), "#3");
        assert_eq!(SourceValue::Forwarded(3).render_station_operand(false), "#3");
    }
}

// register_file.rs
//
// The FP register file: N registers, each tracking whether it is waiting
// on an in-flight producer, and which ROB tag that producer is.

use crate::bus::TagBus;
use crate::errors::SimulatorError;
use crate::operand::SourceValue;

#[derive(Debug, Clone, Copy, Default)]
struct RegisterEntry {
    busy: bool,
    producing_tag: Option<u32>,
    /// Mirrors the source's `RegisterGroup.update`, which stores the
    /// committing rob_index (not a computed value) into the register's
    /// data slot. Kept for structural fidelity; nothing reads it back.
    value: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RegisterFile {
    registers: Vec<RegisterEntry>,
}

/// What a register read yields: either a resolved source value (ready to
/// plug into a station's vj/vk) or a pending producer tag (qj/qk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    Ready(SourceValue),
    Pending(u32),
}

fn parse_indexed(name: &str, prefix: char) -> Option<u32> {
    let mut chars = name.chars();
    if chars.next()? != prefix {
        return None;
    }
    let rest: &str = &name[1..];
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

impl RegisterFile {
    pub fn new(num_registers: usize) -> Self {
        Self { registers: vec![RegisterEntry::default(); num_registers] }
    }

    /// Read operand readiness for `name`, consulting the tag bus first
    /// (the "issue-time commit forward" rule: SPEC_FULL.md §9).
    pub fn read(&self, name: &str, tag_bus: &TagBus) -> Result<ReadResult, SimulatorError> {
        if let Some((committing_reg, rob_index)) = tag_bus.read() {
            if committing_reg == name {
                return Ok(ReadResult::Ready(SourceValue::Forwarded(rob_index)));
            }
        }

        if let Some(index) = parse_indexed(name, 'F') {
            let entry = self.entry(index)?;
            return Ok(if entry.busy {
                ReadResult::Pending(entry.producing_tag.expect("busy register must carry a tag"))
            } else {
                ReadResult::Ready(SourceValue::Reg(index))
            });
        }

        if let Some(index) = parse_indexed(name, 'R') {
            // Base/address registers are always ready.
            return Ok(ReadResult::Ready(SourceValue::Reg(index)));
        }

        Err(SimulatorError::ParseError { line: 0, text: name.to_string() })
    }

    /// Mark the register producing `name` as busy, tagged by `rob_index`.
    /// A later issue to the same register simply overwrites the tag; in-order
    /// issue guarantees the new tag is the correct producer.
    pub fn write(&mut self, name: &str, rob_index: u32) -> Result<(), SimulatorError> {
        let index = parse_indexed(name, 'F')
            .or_else(|| parse_indexed(name, 'R'))
            .ok_or_else(|| SimulatorError::ParseError { line: 0, text: name.to_string() })?;
        let entry = self.entry_mut(index)?;
        entry.busy = true;
        entry.producing_tag = Some(rob_index);
        Ok(())
    }

    /// Apply this cycle's tag-bus commit, if any: clear the committing
    /// register's busy/tag state.
    pub fn update(&mut self, tag_bus: &TagBus) {
        if let Some((name, rob_index)) = tag_bus.read() {
            if let Some(index) = parse_indexed(name, 'F').or_else(|| parse_indexed(name, 'R')) {
                if let Ok(entry) = self.entry_mut(index) {
                    entry.busy = false;
                    entry.producing_tag = None;
                    entry.value = Some(rob_index);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// `Reorder:` trace line: each FP register's producing tag, or blank.
    pub fn reorder_line(&self) -> String {
        let mut line = String::from("Reorder:");
        for (i, reg) in self.registers.iter().enumerate() {
            match reg.producing_tag {
                Some(tag) if reg.busy => line.push_str(&format!("F{}: {};", i, tag)),
                _ => line.push_str(&format!("F{}:;", i)),
            }
        }
        line
    }

    /// `Busy:` trace line.
    pub fn busy_line(&self) -> String {
        let mut line = String::from("Busy:");
        for (i, reg) in self.registers.iter().enumerate() {
            line.push_str(&format!("F{}:{};", i, if reg.busy { "Yes" } else { "No" }));
        }
        line
    }

    fn entry(&self, index: u32) -> Result<&RegisterEntry, SimulatorError> {
        self.registers
            .get(index as usize)
            .ok_or_else(|| SimulatorError::ParseError { line: 0, text: format!("F{} out of range", index) })
    }

    fn entry_mut(&mut self, index: u32) -> Result<&mut RegisterEntry, SimulatorError> {
        self.registers
            .get_mut(index as usize)
            .ok_or_else(|| SimulatorError::ParseError { line: 0, text: format!("F{} out of range", index) })
    }
}

// reorder_buffer.rs
//
// The Reorder Buffer: a circular queue of `size + 1` slots (one slot is
// always empty, distinguishing a full buffer from an empty one) that
// forces in-order commit over the machine's out-of-order execution.

use crate::bus::{CommonDataBus, TagBus};
use crate::instruction::Instruction;
use crate::operand::SourceValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobState {
    Issue,
    Exec,
    WriteResult,
    Commit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SdData {
    pub vj: Option<SourceValue>,
    pub qj: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RobEntry {
    pub busy: bool,
    pub instruction: Instruction,
    pub state: RobState,
    pub destination: Option<String>,
    pub value: Option<String>,
    pub rob_index: u32,
    pub sd_data: SdData,
    pub state_cycle: Vec<u64>,
    pub issued_this_cycle: bool,
}

impl RobEntry {
    fn new(rob_index: u32, instruction: Instruction) -> Self {
        Self {
            busy: true,
            instruction,
            state: RobState::Issue,
            destination: None,
            value: None,
            rob_index,
            sd_data: SdData::default(),
            state_cycle: Vec::new(),
            issued_this_cycle: false,
        }
    }

    /// `entry<i> : <Yes|No>, <translated instruction or blank>, <state or blank>, <destination or blank>, <value or blank>;`
    fn trace_line(slot: Option<&RobEntry>, index: usize) -> String {
        match slot {
            None => format!("entry{} :No,,,,;", index + 1),
            Some(entry) => {
                let state = match entry.state {
                    RobState::Issue => "Issue",
                    RobState::Exec => "Exec",
                    RobState::WriteResult => "Write result",
                    RobState::Commit => "Commit",
                };
                let status = if entry.busy { "Yes" } else { "No" };
                let dest = entry.destination.as_deref().unwrap_or("");
                let value = entry.value.as_deref().unwrap_or("");
                format!(
                    "entry{} : {}, {}, {}, {}, {};",
                    index + 1,
                    status,
                    entry.instruction.to_riscv(),
                    state,
                    dest,
                    value
                )
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReorderBuffer {
    /// Total ring slots: configured size + 1.
    slots: usize,
    entries: Vec<Option<RobEntry>>,
    head: usize,
    new_head: usize,
    tail: usize,
    rob_index_counter: u32,
}

impl ReorderBuffer {
    pub fn new(size: usize) -> Self {
        let slots = size + 1;
        Self { slots, entries: vec![None; slots], head: 0, new_head: 0, tail: 0, rob_index_counter: 0 }
    }

    /// `Allocate`: fails (returns `None`) if the buffer is full.
    pub fn allocate(
        &mut self,
        instruction: Instruction,
        cycle: u64,
        sd_vj: Option<SourceValue>,
        sd_qj: Option<u32>,
    ) -> Option<u32> {
        let next_tail = (self.tail + 1) % self.slots;
        if next_tail == self.head {
            return None;
        }

        self.rob_index_counter += 1;
        let rob_index = self.rob_index_counter;
        let mut entry = RobEntry::new(rob_index, instruction);
        entry.issued_this_cycle = true;
        entry.state_cycle.push(cycle);
        if entry.instruction.opcode.is_store() {
            entry.sd_data = SdData { vj: sd_vj, qj: sd_qj };
        } else {
            entry.destination = Some(entry.instruction.destination.clone());
        }

        self.entries[self.tail] = Some(entry);
        self.tail = next_tail;
        Some(rob_index)
    }

    /// Reclaims the just-allocated tail slot when the accompanying station
    /// allocation failed this cycle.
    pub fn rollback(&mut self) {
        self.rob_index_counter -= 1;
        self.tail = if self.tail == 0 { self.slots - 1 } else { self.tail - 1 };
        self.entries[self.tail] = None;
    }

    /// Walk entries head..tail, advance each by at most one state, commit
    /// the head when ready, and stage a tag-bus write on commit.
    pub fn update(&mut self, cycle: u64, cdb: &CommonDataBus, tag_bus: &mut TagBus, retirements: &mut Vec<RobEntry>) {
        self.new_head = self.head;
        let mut index = self.head;
        while index != self.tail {
            let is_head = index == self.head;
            let is_store = self.entries[index]
                .as_ref()
                .expect("slot between head and tail must be occupied")
                .instruction
                .opcode
                .is_store();

            let entry = self.entries[index].as_mut().expect("slot between head and tail must be occupied");
            if is_store {
                Self::update_sd(entry, is_head, cdb, cycle, &mut self.new_head, index, self.slots, retirements);
            } else {
                Self::update_arith(entry, is_head, cdb, tag_bus, cycle, &mut self.new_head, index, self.slots, retirements);
            }

            index = (index + 1) % self.slots;
        }
        self.head = self.new_head;
    }

    fn update_arith(
        entry: &mut RobEntry,
        is_head: bool,
        cdb: &CommonDataBus,
        tag_bus: &mut TagBus,
        cycle: u64,
        new_head: &mut usize,
        index: usize,
        slots: usize,
        retirements: &mut Vec<RobEntry>,
    ) {
        if entry.state == RobState::Issue && cdb.is_executing(entry.rob_index) {
            entry.state = RobState::Exec;
            entry.state_cycle.push(cycle);
        }
        if is_head && entry.state == RobState::WriteResult {
            entry.busy = false;
            entry.state = RobState::Commit;
            *new_head = (index + 1) % slots;
            entry.state_cycle.push(cycle);
            retirements.push(entry.clone());
        }
        if let Some((tag, value)) = cdb.read() {
            if tag == entry.rob_index {
                entry.value = Some(value.to_string());
                entry.state = RobState::WriteResult;
                entry.state_cycle.push(cycle - 1);
                entry.state_cycle.push(cycle);
                tag_bus.write(entry.destination.clone().expect("arithmetic/LD entry must carry a destination"), entry.rob_index);
            }
        }
        if entry.state != RobState::Issue {
            entry.issued_this_cycle = false;
        }
    }

    fn update_sd(
        entry: &mut RobEntry,
        is_head: bool,
        cdb: &CommonDataBus,
        cycle: u64,
        new_head: &mut usize,
        index: usize,
        slots: usize,
        retirements: &mut Vec<RobEntry>,
    ) {
        if let Some(qj) = entry.sd_data.qj {
            if let Some((tag, _)) = cdb.read() {
                if tag == qj {
                    entry.sd_data.vj = Some(SourceValue::Forwarded(qj));
                    entry.sd_data.qj = None;
                }
            }
        }
        if entry.state == RobState::Issue {
            if entry.issued_this_cycle {
                entry.issued_this_cycle = false;
            } else {
                entry.state = RobState::Exec;
                entry.destination = Some(format!("Mem[{}+{}]", entry.instruction.src1, entry.instruction.src2));
            }
            return;
        }
        if is_head && entry.state == RobState::Exec && entry.sd_data.vj.is_some() {
            entry.state = RobState::Commit;
            entry.busy = false;
            *new_head = (index + 1) % slots;
            entry.state_cycle.push(cycle - 1);
            entry.state_cycle.push(cycle);
            retirements.push(entry.clone());
        }
    }

    pub fn finish(&self) -> bool {
        self.entries.iter().flatten().all(|e| !e.busy)
    }

    /// Every entry with `state != Issue` must have `issued_this_cycle ==
    /// false` at the end of a cycle.
    pub fn issued_this_cycle_invariant_holds(&self) -> bool {
        self.entries.iter().flatten().all(|e| e.state == RobState::Issue || !e.issued_this_cycle)
    }

    /// `size - 1` entries starting just past `tail`, matching the source's
    /// `new_head`-relative traversal so freed/committed slots sort last.
    pub fn trace_lines(&self) -> Vec<String> {
        let mut start = (self.tail + 1) % self.slots;
        for _ in 0..self.slots.saturating_sub(1) {
            if self.entries[start].is_none() {
                start = (start + 1) % self.slots;
            }
        }
        (0..self.slots.saturating_sub(1))
            .map(|i| {
                let index = (start + i) % self.slots;
                RobEntry::trace_line(self.entries[index].as_ref(), i)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Opcode;

    fn ld(dest: &str) -> Instruction {
        Instruction::new(Opcode::Ld, dest.into(), "34".into(), "R2".into())
    }

    #[test]
    fn allocate_fails_when_ring_is_full() {
        let mut rob = ReorderBuffer::new(1);
        assert!(rob.allocate(ld("F6"), 1, Some(SourceValue::Reg(0)), None).is_some());
        assert!(rob.allocate(ld("F4"), 1, Some(SourceValue::Reg(0)), None).is_none());
    }

    #[test]
    fn rollback_reclaims_the_tail_slot() {
        let mut rob = ReorderBuffer::new(1);
        rob.allocate(ld("F6"), 1, Some(SourceValue::Reg(0)), None).unwrap();
        rob.rollback();
        assert!(rob.allocate(ld("F4"), 2, Some(SourceValue::Reg(0)), None).is_some());
    }

    #[test]
    fn issue_to_exec_to_writeresult_to_commit_takes_one_stage_per_cycle() {
        let mut rob = ReorderBuffer::new(2);
        let tag = rob.allocate(ld("F6"), 1, None, None).unwrap();
        let mut tag_bus = TagBus::new();
        let mut log = Vec::new();

        let mut cdb = CommonDataBus::new();
        cdb.mark_executing(tag);
        rob.update(2, &cdb, &mut tag_bus, &mut log);
        assert!(log.is_empty());

        let mut cdb = CommonDataBus::new();
        cdb.write(tag, "Mem[34+Regs[R2]]".into());
        cdb.latch();
        rob.update(3, &cdb, &mut tag_bus, &mut log);
        assert!(log.is_empty(), "WriteResult must not commit in the same cycle it is written");

        let cdb = CommonDataBus::new();
        rob.update(4, &cdb, &mut tag_bus, &mut log);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].state_cycle, vec![1, 2, 2, 3, 4]);
    }

    #[test]
    fn issued_this_cycle_clears_once_an_arithmetic_entry_leaves_issue() {
        let mut rob = ReorderBuffer::new(2);
        let tag = rob.allocate(ld("F6"), 1, None, None).unwrap();
        let mut tag_bus = TagBus::new();
        let mut log = Vec::new();

        assert!(rob.issued_this_cycle_invariant_holds(), "invariant does not constrain entries still in Issue state");

        let mut cdb = CommonDataBus::new();
        cdb.mark_executing(tag);
        rob.update(2, &cdb, &mut tag_bus, &mut log);
        assert!(rob.issued_this_cycle_invariant_holds(), "flag must clear the cycle the entry leaves Issue");
    }

    #[test]
    fn sd_has_three_recorded_cycles() {
        let mut rob = ReorderBuffer::new(2);
        let sd = Instruction::new(Opcode::Sd, "F8".into(), "56".into(), "R3".into());
        let tag = rob.allocate(sd, 1, Some(SourceValue::Reg(8)), None).unwrap();
        let mut tag_bus = TagBus::new();
        let mut log = Vec::new();
        let cdb = CommonDataBus::new();

        rob.update(2, &cdb, &mut tag_bus, &mut log); // issue-cycle skip, stays Issue
        rob.update(3, &cdb, &mut tag_bus, &mut log); // Issue -> Exec
        assert!(log.is_empty());
        rob.update(4, &cdb, &mut tag_bus, &mut log); // Exec -> Commit, vj already resolved
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].state_cycle, vec![1, 3, 4]);
        let _ = tag;
    }
}

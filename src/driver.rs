// driver.rs
//
// The Pipeline Driver: per-cycle orchestration of issue, update, and latch
// across every component, plus the owned Retirement Log and Trace
// Recorder. Grounded on the source's `CPU.run_simulation` main loop and
// `vmips_rust`'s `TomasuloProcessor::tick` phase ordering.

use crate::bus::{CommonDataBus, TagBus};
use crate::config::SimulatorConfig;
use crate::instruction::{Instruction, Opcode};
use crate::load_buffer::LoadBuffer;
use crate::operand::SourceValue;
use crate::register_file::{ReadResult, RegisterFile};
use crate::reorder_buffer::{ReorderBuffer, RobEntry};
use crate::station::FunctionalUnit;
use crate::trace::TraceRecorder;

use std::collections::VecDeque;

pub struct Driver {
    config: SimulatorConfig,
    cycle: u64,
    queue: VecDeque<Instruction>,
    registers: RegisterFile,
    rob: ReorderBuffer,
    add_unit: FunctionalUnit,
    mult_unit: FunctionalUnit,
    load_unit: LoadBuffer,
    cdb: CommonDataBus,
    tag_bus: TagBus,
    retirements: Vec<RobEntry>,
    trace: TraceRecorder,
}

impl Driver {
    pub fn new(config: SimulatorConfig, program: Vec<Instruction>) -> Self {
        let add_unit = FunctionalUnit::new("Add", config.add_stations, config.latencies.clone());
        let mult_unit = FunctionalUnit::new("Mult", config.mult_stations, config.latencies.clone());
        let load_unit = LoadBuffer::new(config.load_buffers);
        let rob = ReorderBuffer::new(config.rob_size);
        let registers = RegisterFile::new(config.num_registers);

        Self {
            config,
            cycle: 0,
            queue: program.into_iter().collect(),
            registers,
            rob,
            add_unit,
            mult_unit,
            load_unit,
            cdb: CommonDataBus::new(),
            tag_bus: TagBus::new(),
            retirements: Vec::new(),
            trace: TraceRecorder::new(),
        }
    }

    /// Run to structural completion (or the `--max-cycles` safety valve)
    /// and return the full trace output.
    pub fn run(mut self) -> String {
        while !self.step() {}
        self.trace.finish();
        self.trace.dump_retirements(&self.retirements);
        self.trace.into_output()
    }

    /// Advance exactly one cycle. Returns `true` once the simulation has
    /// reached structural completion or tripped the `--max-cycles` valve.
    pub fn step(&mut self) -> bool {
        self.cycle += 1;
        self.try_issue();
        self.update_units();
        self.cdb.latch();
        self.tag_bus.latch();
        self.registers.update(&self.tag_bus);

        let block = self.render_state_block();
        self.trace.observe(self.cycle, block);

        if self.is_idle() {
            log::info!("simulation complete after {} cycles", self.cycle);
            return true;
        }
        if let Some(max) = self.config.max_cycles {
            if self.cycle >= max {
                log::warn!("max-cycles ({}) reached before structural completion", max);
                return true;
            }
        }
        false
    }

    /// Read-only access to the reorder buffer, for inspecting per-cycle
    /// invariants in tests.
    pub fn rob(&self) -> &ReorderBuffer {
        &self.rob
    }

    fn try_issue(&mut self) {
        let Some(instruction) = self.queue.front().cloned() else { return };
        log::debug!("cycle {}: attempting to issue {}", self.cycle, instruction);

        let (sd_vj, sd_qj) = if instruction.opcode.is_store() {
            match self.registers.read(&instruction.destination, &self.tag_bus) {
                Ok(ReadResult::Ready(v)) => (Some(v), None),
                Ok(ReadResult::Pending(tag)) => (None, Some(tag)),
                Err(err) => {
                    log::error!("cycle {}: {}", self.cycle, err);
                    return;
                },
            }
        } else {
            (None, None)
        };

        let Some(rob_index) = self.rob.allocate(instruction.clone(), self.cycle, sd_vj, sd_qj) else {
            log::warn!("cycle {}: ROB full, stalling issue", self.cycle);
            return;
        };

        let issued = match instruction.opcode {
            Opcode::Sd => true,
            Opcode::Addd | Opcode::Subd => self.issue_arithmetic(&instruction, rob_index, true),
            Opcode::Multd | Opcode::Divd => self.issue_arithmetic(&instruction, rob_index, false),
            Opcode::Ld => self.issue_load(&instruction, rob_index),
        };

        if issued {
            if !instruction.opcode.is_store() {
                if let Err(err) = self.registers.write(&instruction.destination, rob_index) {
                    log::error!("cycle {}: {}", self.cycle, err);
                }
            }
            self.queue.pop_front();
            log::debug!("cycle {}: issued {} as rob#{}", self.cycle, instruction, rob_index);
        } else {
            log::warn!("cycle {}: no free station, rolling back ROB allocation", self.cycle);
            self.rob.rollback();
        }
    }

    fn issue_arithmetic(&mut self, instruction: &Instruction, rob_index: u32, is_add: bool) -> bool {
        let (vj, qj) = self.read_operand(&instruction.src1);
        let (vk, qk) = self.read_operand(&instruction.src2);
        let unit = if is_add { &mut self.add_unit } else { &mut self.mult_unit };
        unit.issue(instruction.opcode, vj, vk, qj, qk, instruction.destination.clone(), rob_index)
    }

    fn issue_load(&mut self, instruction: &Instruction, rob_index: u32) -> bool {
        let (vj, qj) = self.read_operand(&instruction.src2);
        self.load_unit.issue(instruction.src1.clone(), vj, qj, instruction.destination.clone(), rob_index)
    }

    fn read_operand(&self, name: &str) -> (Option<SourceValue>, Option<u32>) {
        match self.registers.read(name, &self.tag_bus) {
            Ok(ReadResult::Ready(v)) => (Some(v), None),
            Ok(ReadResult::Pending(tag)) => (None, Some(tag)),
            Err(err) => {
                log::error!("cycle {}: {}", self.cycle, err);
                (None, None)
            },
        }
    }

    fn update_units(&mut self) {
        self.load_unit.update(&mut self.cdb);
        self.add_unit.update(&mut self.cdb);
        self.mult_unit.update(&mut self.cdb);
        self.rob.update(self.cycle, &self.cdb, &mut self.tag_bus, &mut self.retirements);
    }

    fn is_idle(&self) -> bool {
        self.queue.is_empty()
            && self.add_unit.finish()
            && self.mult_unit.finish()
            && self.load_unit.finish()
            && self.rob.finish()
    }

    fn render_state_block(&self) -> String {
        let mut block = String::new();
        for line in self.rob.trace_lines() {
            block.push_str(&line);
            block.push('\n');
        }
        for line in self.load_unit.trace_lines() {
            block.push_str(&line);
            block.push('\n');
        }
        for line in self.add_unit.trace_lines() {
            block.push_str(&line);
            block.push('\n');
        }
        for line in self.mult_unit.trace_lines() {
            block.push_str(&line);
            block.push('\n');
        }
        block.push_str(&self.registers.reorder_line());
        block.push('\n');
        block.push_str(&self.registers.busy_line());
        block.push('\n');
        block.push_str("------------------------------------------\n");
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn run_program(text: &str, config: SimulatorConfig) -> String {
        let program = parse_program(text).unwrap();
        Driver::new(config, program).run()
    }

    #[test]
    fn classic_six_instruction_program_terminates_and_retires_everything() {
        let program = "LD F6 34+ R2\nLD F2 45+ R3\nMULTD F0 F2 F4\nSUBD F8 F6 F2\nDIVD F10 F0 F6\nADDD F6 F8 F2\n";
        let output = run_program(program, SimulatorConfig::new());
        assert!(output.contains("LD F6 34 R2:"));
        assert!(output.contains("ADDD F6 F8 F2:"));
        let retirement_lines: Vec<&str> = output.lines().filter(|l| l.contains(": ") && !l.starts_with("cycle_")).collect();
        assert_eq!(retirement_lines.len(), 6);
    }

    #[test]
    fn rob_size_one_forces_strict_in_order_commit() {
        let program = "ADDD F0 F2 F4\nSUBD F6 F0 F2\n";
        let config = SimulatorConfig::new().with_rob_size(1);
        let output = run_program(program, config);
        let retirement_lines: Vec<&str> = output.lines().filter(|l| l.contains(": ") && !l.starts_with("cycle_")).collect();
        assert_eq!(retirement_lines.len(), 2);
    }

    #[test]
    fn single_load_buffer_serializes_loads() {
        let program = "LD F0 0+ R1\nLD F2 8+ R1\n";
        let config = SimulatorConfig::new().with_load_buffers(1);
        let output = run_program(program, config);
        let retirement_lines: Vec<&str> = output.lines().filter(|l| l.contains(": ") && !l.starts_with("cycle_")).collect();
        assert_eq!(retirement_lines.len(), 2);
    }

    #[test]
    fn sd_after_ld_resolves_store_source_through_forwarding() {
        let program = "LD F6 34+ R2\nSD F6 50 R2\n";
        let output = run_program(program, SimulatorConfig::new());
        let retirement_lines: Vec<&str> = output.lines().filter(|l| l.contains(": ") && !l.starts_with("cycle_")).collect();
        assert_eq!(retirement_lines.len(), 2);
        assert!(retirement_lines[1].starts_with("SD F6 50 R2:"));
        let sd_cycles: Vec<&str> = retirement_lines[1].split(": ").nth(1).unwrap().split(',').collect();
        assert_eq!(sd_cycles.len(), 3, "SD retires with exactly three recorded cycles");
    }

    #[test]
    fn max_cycles_safety_valve_halts_runaway_structural_stall() {
        // ROB full, add-station starved of operands via a self-cycle is not
        // constructible from valid input; instead verify the valve trips on
        // an artificially tiny budget against ordinary forward progress.
        let program = "ADDD F0 F2 F4\nADDD F6 F2 F4\nADDD F8 F2 F4\nADDD F10 F2 F4\n";
        let config = SimulatorConfig::new().with_add_stations(1).with_max_cycles(Some(2));
        let output = run_program(program, config);
        assert!(output.contains("cycle_"));
    }
}

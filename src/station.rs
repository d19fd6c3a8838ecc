// station.rs
//
// Reservation stations and the pooled functional units (the Add and Mult
// units) that hold them. The Load Buffer is close cousin but has a
// different two-tick update shape and lives in `load_buffer.rs`.

use std::collections::HashMap;

use crate::bus::CommonDataBus;
use crate::instruction::Opcode;
use crate::operand::SourceValue;

/// One pending operation and its operands (values or producer tags).
#[derive(Debug, Clone, Default)]
pub struct ReservationStation {
    pub name: String,
    pub busy: bool,
    pub op: Option<Opcode>,
    pub vj: Option<SourceValue>,
    pub vk: Option<SourceValue>,
    pub qj: Option<u32>,
    pub qk: Option<u32>,
    pub dest: Option<String>,
    /// Load only: the literal offset component of the address (`src1`,
    /// with its trailing `+` already stripped by the parser).
    pub offset: Option<String>,
    /// Load only: the effective-address string, computed once `vj`
    /// resolves and rendered as `"<a>+Regs[R<i>]"`.
    pub address: Option<String>,
    pub remain_time: i64,
    pub rob_index: Option<u32>,
    pub issued_this_cycle: bool,
}

impl ReservationStation {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn is_ready(&self) -> bool {
        self.busy && self.qj.is_none() && self.qk.is_none()
    }

    pub fn reset(&mut self) {
        let name = std::mem::take(&mut self.name);
        *self = ReservationStation::new(name);
    }

    /// `<name> : <Yes|No>, <op>, <vj>, <vk>, <qj>, <qk>, #<rob_index>;`
    pub fn trace_line(&self) -> String {
        if !self.busy {
            return format!("{} : No,,,,,,;", self.name);
        }
        let is_load = self.op == Some(Opcode::Ld);
        let op = self.op.map(|o| o.as_str().to_string()).unwrap_or_default();
        let vj = self.vj.map(|v| v.render_station_operand(is_load)).unwrap_or_default();
        let vk = self.vk.map(|v| v.render_station_operand(is_load)).unwrap_or_default();
        let qj = self.qj.map(|t| format!("#{}", t)).unwrap_or_default();
        let qk = self.qk.map(|t| format!("#{}", t)).unwrap_or_default();
        let rob = self.rob_index.map(|t| t.to_string()).unwrap_or_default();
        format!("{} : Yes, {}, {}, {}, {}, {}, #{};", self.name, op, vj, vk, qj, qk, rob)
    }
}

fn format_result(op: Opcode, vj: SourceValue, vk: SourceValue) -> String {
    format!("{} {} {}", vj.render_fp(), op.infix(), vk.render_fp())
}

/// A pool of reservation stations sharing a per-opcode latency table (the
/// Add unit or the Mult unit).
#[derive(Debug, Clone)]
pub struct FunctionalUnit {
    pub name: String,
    pub stations: Vec<ReservationStation>,
    latencies: HashMap<Opcode, u32>,
}

impl FunctionalUnit {
    pub fn new(name: impl Into<String>, count: usize, latencies: HashMap<Opcode, u32>) -> Self {
        let name = name.into();
        let stations = (0..count).map(|i| ReservationStation::new(format!("{}{}", name, i + 1))).collect();
        Self { name, stations, latencies }
    }

    /// Issue succeeds iff a station in the pool is free; stations fill in
    /// pool order.
    pub fn issue(
        &mut self,
        op: Opcode,
        vj: Option<SourceValue>,
        vk: Option<SourceValue>,
        qj: Option<u32>,
        qk: Option<u32>,
        dest: String,
        rob_index: u32,
    ) -> bool {
        for station in &mut self.stations {
            if station.busy {
                continue;
            }
            station.busy = true;
            station.op = Some(op);
            station.vj = vj;
            station.vk = vk;
            station.qj = qj;
            station.qk = qk;
            station.dest = Some(dest);
            station.rob_index = Some(rob_index);
            station.remain_time = *self.latencies.get(&op).unwrap_or(&1) as i64;
            station.issued_this_cycle = true;
            return true;
        }
        false
    }

    /// Advance every busy station by one cycle against the current CDB
    /// contents, per SPEC_FULL.md §4.2.
    pub fn update(&mut self, cdb: &mut CommonDataBus) {
        let broadcast = cdb.read().map(|(tag, _)| tag);

        for station in &mut self.stations {
            if !station.busy {
                continue;
            }
            if station.issued_this_cycle {
                station.issued_this_cycle = false;
                continue;
            }
            if station.qj.is_some() || station.qk.is_some() {
                if let Some(tag) = broadcast {
                    if station.qj == Some(tag) {
                        station.vj = Some(SourceValue::Forwarded(tag));
                        station.qj = None;
                    }
                    if station.qk == Some(tag) {
                        station.vk = Some(SourceValue::Forwarded(tag));
                        station.qk = None;
                    }
                }
                continue;
            }
            if station.remain_time > 0 {
                let rob_index = station.rob_index.expect("executing station must carry a rob_index");
                cdb.mark_executing(rob_index);
                station.remain_time -= 1;
                if station.remain_time == 0 {
                    let op = station.op.expect("executing station must carry an opcode");
                    let vj = station.vj.expect("executing station must have a resolved vj");
                    let vk = station.vk.expect("executing station must have a resolved vk");
                    let result = format_result(op, vj, vk);
                    if !cdb.write(rob_index, result) {
                        // Another unit won the CDB this cycle; retry next cycle.
                        station.remain_time = 1;
                    }
                }
            } else {
                station.busy = false;
            }
        }
    }

    pub fn finish(&self) -> bool {
        self.stations.iter().all(|s| !s.busy)
    }

    pub fn trace_lines(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.trace_line()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_unit() -> FunctionalUnit {
        let mut latencies = HashMap::new();
        latencies.insert(Opcode::Addd, 2);
        latencies.insert(Opcode::Subd, 2);
        FunctionalUnit::new("Add", 3, latencies)
    }

    #[test]
    fn issue_fills_pool_in_order() {
        let mut unit = add_unit();
        assert!(unit.issue(Opcode::Addd, Some(SourceValue::Reg(1)), Some(SourceValue::Reg(2)), None, None, "F0".into(), 1));
        assert_eq!(unit.stations[0].name, "Add1");
        assert!(unit.stations[0].busy);
        assert!(!unit.stations[1].busy);
    }

    #[test]
    fn issue_fails_when_pool_is_full() {
        let mut unit = FunctionalUnit::new("Add", 1, HashMap::new());
        assert!(unit.issue(Opcode::Addd, Some(SourceValue::Reg(1)), Some(SourceValue::Reg(2)), None, None, "F0".into(), 1));
        assert!(!unit.issue(Opcode::Addd, Some(SourceValue::Reg(3)), Some(SourceValue::Reg(4)), None, None, "F1".into(), 2));
    }

    #[test]
    fn issued_station_does_not_execute_in_its_allocation_cycle() {
        let mut unit = add_unit();
        unit.issue(Opcode::Addd, Some(SourceValue::Reg(1)), Some(SourceValue::Reg(2)), None, None, "F0".into(), 1);
        let mut cdb = CommonDataBus::new();
        unit.update(&mut cdb);
        assert_eq!(unit.stations[0].remain_time, 2, "issue consumes a cycle without executing");
    }

    #[test]
    fn two_cycle_add_broadcasts_formatted_expression() {
        let mut unit = add_unit();
        unit.issue(Opcode::Addd, Some(SourceValue::Reg(6)), Some(SourceValue::Reg(4)), None, None, "F0".into(), 1);
        let mut cdb = CommonDataBus::new();
        unit.update(&mut cdb); // issue-cycle skip
        cdb.latch();
        unit.update(&mut cdb); // remain_time 2 -> 1
        assert_eq!(unit.stations[0].remain_time, 1);
        cdb.latch();
        unit.update(&mut cdb); // remain_time 1 -> 0, broadcasts
        cdb.latch();
        assert_eq!(cdb.read(), Some((1, "Reg[F6] + Reg[F4]")));
    }

    #[test]
    fn waiting_station_resolves_on_matching_broadcast() {
        let mut unit = add_unit();
        unit.issue(Opcode::Addd, Some(SourceValue::Reg(6)), None, None, Some(9), "F0".into(), 1);
        unit.stations[0].issued_this_cycle = false;
        let mut cdb = CommonDataBus::new();
        cdb.write(9, "Reg[F2] * Reg[F3]".into());
        cdb.latch();
        unit.update(&mut cdb);
        assert_eq!(unit.stations[0].qk, None);
        assert_eq!(unit.stations[0].vk, Some(SourceValue::Forwarded(9)));
    }

    #[test]
    fn trace_line_wraps_unresolved_register_operand() {
        let mut unit = add_unit();
        unit.issue(Opcode::Addd, Some(SourceValue::Reg(6)), Some(SourceValue::Reg(4)), None, None, "F0".into(), 1);
        assert_eq!(unit.stations[0].trace_line(), "Add1 : Yes, ADDD, Regs[F6], Regs[F4], , , #1;");
    }

    #[test]
    fn losing_cdb_contention_retries_next_cycle() {
        let mut unit = add_unit();
        unit.issue(Opcode::Addd, Some(SourceValue::Reg(1)), Some(SourceValue::Reg(2)), None, None, "F0".into(), 5);
        unit.stations[0].remain_time = 1;
        unit.stations[0].issued_this_cycle = false;
        let mut cdb = CommonDataBus::new();
        cdb.write(99, "someone-else".into()); // occupy the stage
        unit.update(&mut cdb);
        assert_eq!(unit.stations[0].remain_time, 1, "lost contention retries at remain_time 1");
    }
}

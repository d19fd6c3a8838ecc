// load_buffer.rs
//
// The Load unit: a pool of reservation stations sharing LD's two-tick
// address-then-memory update shape (SPEC_FULL.md §4.2), distinct enough
// from the arithmetic units' single-phase execute that it gets its own
// `update`.

use crate::bus::CommonDataBus;
use crate::instruction::Opcode;
use crate::operand::SourceValue;
use crate::station::ReservationStation;

const LOAD_LATENCY: i64 = 2;

#[derive(Debug, Clone)]
pub struct LoadBuffer {
    pub stations: Vec<ReservationStation>,
}

impl LoadBuffer {
    pub fn new(count: usize) -> Self {
        let stations = (0..count).map(|i| ReservationStation::new(format!("Load{}", i + 1))).collect();
        Self { stations }
    }

    /// `offset` is the literal address component (`src1`); `vj`/`qj` are
    /// the base register's (`src2`) resolved value or producer tag.
    pub fn issue(
        &mut self,
        offset: String,
        vj: Option<SourceValue>,
        qj: Option<u32>,
        dest: String,
        rob_index: u32,
    ) -> bool {
        for station in &mut self.stations {
            if station.busy {
                continue;
            }
            station.busy = true;
            station.op = Some(Opcode::Ld);
            station.vj = vj;
            station.qj = qj;
            station.offset = Some(offset);
            station.dest = Some(dest);
            station.rob_index = Some(rob_index);
            station.remain_time = LOAD_LATENCY;
            station.issued_this_cycle = true;
            return true;
        }
        false
    }

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
            if station.remain_time == LOAD_LATENCY {
                match station.vj {
                    Some(vj) => {
                        let offset = station.offset.as_deref().unwrap_or_default();
                        station.address = Some(format!("{}+{}", offset, vj.render_base()));
                        station.remain_time -= 1;
                        let rob_index = station.rob_index.expect("executing station must carry a rob_index");
                        cdb.mark_executing(rob_index);
                    },
                    None => {
                        if let Some(tag) = broadcast {
                            if station.qj == Some(tag) {
                                station.vj = Some(SourceValue::Forwarded(tag));
                                station.qj = None;
                            }
                        }
                    },
                }
                continue;
            }
            if station.remain_time > 0 {
                let rob_index = station.rob_index.expect("executing station must carry a rob_index");
                cdb.mark_executing(rob_index);
                station.remain_time -= 1;
                if station.remain_time == 0 {
                    let address = station.address.clone().expect("address must be resolved before memory tick");
                    if !cdb.write(rob_index, format!("Mem[{}]", address)) {
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

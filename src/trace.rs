// trace.rs
//
// Run-length-compressed trace output: a new state block is written only
// once its predecessor's run of identical cycles ends, grounded on the
// source's `record_component_state` / `run_simulation` diffing loop and
// `vmips_rust`'s `dump_state` naming.

use crate::reorder_buffer::RobEntry;

pub struct TraceRecorder {
    pending: Option<(String, u64, u64)>, // (block, run_start, run_end)
    output: String,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self { pending: None, output: String::new() }
    }

    /// Record this cycle's rendered state block, extending the current run
    /// if it matches the previous cycle's block, or flushing that run and
    /// starting a new one if it doesn't.
    pub fn observe(&mut self, cycle: u64, block: String) {
        match &mut self.pending {
            Some((pending_block, _, run_end)) if *pending_block == block => {
                *run_end = cycle;
            },
            Some(_) => {
                self.flush();
                self.pending = Some((block, cycle, cycle));
            },
            None => {
                self.pending = Some((block, cycle, cycle));
            },
        }
    }

    fn flush(&mut self) {
        if let Some((block, start, end)) = self.pending.take() {
            if start == end {
                self.output.push_str(&format!("cycle_{};\n", start));
            } else {
                self.output.push_str(&format!("cycle_{}-{};\n", start, end));
            }
            self.output.push_str(&block);
        }
    }

    /// Flush the final pending run. Must be called exactly once, after the
    /// last `observe`.
    pub fn finish(&mut self) {
        self.flush();
    }

    /// Append the per-instruction retirement summary, in commit order.
    pub fn dump_retirements(&mut self, log: &[RobEntry]) {
        for entry in log {
            let ins = &entry.instruction;
            let cycles: Vec<String> = entry.state_cycle.iter().map(|c| c.to_string()).collect();
            self.output.push_str(&format!(
                "{} {} {} {}: {}\n",
                ins.opcode,
                ins.destination,
                ins.src1,
                ins.src2,
                cycles.join(",")
            ));
        }
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl Default for TraceRecorder {
    fn default() -> Self {
        Self::new()
    }
}

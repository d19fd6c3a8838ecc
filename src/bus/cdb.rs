// bus/cdb.rs
//
// Common Data Bus: the sole point of write serialization in the machine.
// At most one functional unit may broadcast a result per cycle.

use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct CommonDataBus {
    current: Option<(u32, String)>,
    staged: Option<(u32, String)>,
    /// ROB indices with a station actively executing them this cycle.
    /// Cleared at latch time, same as the staged write.
    exec_list: HashSet<u32>,
}

impl CommonDataBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The broadcast visible to every consumer this cycle.
    pub fn read(&self) -> Option<(u32, &str)> {
        self.current.as_ref().map(|(tag, value)| (*tag, value.as_str()))
    }

    /// Stage a broadcast for next cycle. Fails if something already staged
    /// a write this cycle — the caller (a functional unit) must retry.
    pub fn write(&mut self, tag: u32, value: String) -> bool {
        if self.staged.is_some() {
            return false;
        }
        self.staged = Some((tag, value));
        true
    }

    /// Mark `rob_index` as having a station executing it this cycle. The
    /// ROB consults this set to advance Issue -> Exec.
    pub fn mark_executing(&mut self, rob_index: u32) {
        self.exec_list.insert(rob_index);
    }

    pub fn is_executing(&self, rob_index: u32) -> bool {
        self.exec_list.contains(&rob_index)
    }

    /// Promote the staged write to current, then clear both the stage and
    /// the exec list for the next cycle.
    pub fn latch(&mut self) {
        self.current = self.staged.take();
        self.exec_list.clear();
    }
}

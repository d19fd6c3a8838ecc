// bus/tag_bus.rs
//
// Tag bus: carries a single (register_name, committing rob_index) pair
// from the ROB to the register file. The source couples these through a
// bare struct read twice per cycle; this implementation gives it the same
// explicit stage/latch shape as the CDB (SPEC_FULL.md §9).

#[derive(Debug, Clone, Default)]
pub struct TagBus {
    current: Option<(String, u32)>,
    staged: Option<(String, u32)>,
}

impl TagBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> Option<(&str, u32)> {
        self.current.as_ref().map(|(name, tag)| (name.as_str(), *tag))
    }

    /// Stage a commit notification. Unlike the CDB, at most one ROB entry
    /// ever commits per cycle (only the head may), so staging never
    /// contends; this still returns bool for symmetry with `CommonDataBus`.
    pub fn write(&mut self, register: String, rob_index: u32) -> bool {
        if self.staged.is_some() {
            return false;
        }
        self.staged = Some((register, rob_index));
        true
    }

    pub fn latch(&mut self) {
        self.current = self.staged.take();
    }
}

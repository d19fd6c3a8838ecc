// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// config.rs
//
// Configuration for the Tomasulo reorder-buffer simulator: register file
// size, station pool sizes, ROB depth, and per-opcode latencies.

use std::collections::HashMap;

use crate::instruction::Opcode;

/// Per-opcode execute latency (in cycles). Load's two-tick address/memory
/// sequence is modeled separately in the load unit and is not in this table.
pub fn default_latencies() -> HashMap<Opcode, u32> {
    let mut table = HashMap::new();
    table.insert(Opcode::Addd, 2);
    table.insert(Opcode::Subd, 2);
    table.insert(Opcode::Multd, 10);
    table.insert(Opcode::Divd, 20);
    table
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub num_registers: usize,
    pub memory_words: usize,
    pub load_buffers: usize,
    pub rob_size: usize,
    pub add_stations: usize,
    pub mult_stations: usize,
    pub latencies: HashMap<Opcode, u32>,
    pub max_cycles: Option<u64>,
}

impl SimulatorConfig {
    pub fn new() -> Self {
        Self {
            num_registers: 11,
            memory_words: 1024,
            load_buffers: 2,
            rob_size: 6,
            add_stations: 3,
            mult_stations: 2,
            latencies: default_latencies(),
            max_cycles: None,
        }
    }

    pub fn with_registers(mut self, num: usize) -> Self {
        self.num_registers = num;
        self
    }

    pub fn with_memory_words(mut self, num: usize) -> Self {
        self.memory_words = num;
        self
    }

    pub fn with_load_buffers(mut self, num: usize) -> Self {
        self.load_buffers = num;
        self
    }

    pub fn with_rob_size(mut self, size: usize) -> Self {
        self.rob_size = size;
        self
    }

    pub fn with_add_stations(mut self, num: usize) -> Self {
        self.add_stations = num;
        self
    }

    pub fn with_mult_stations(mut self, num: usize) -> Self {
        self.mult_stations = num;
        self
    }

    pub fn with_max_cycles(mut self, max: Option<u64>) -> Self {
        self.max_cycles = max;
        self
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

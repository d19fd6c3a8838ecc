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

// parser.rs
//
// A line-oriented parser for the simulator's assembly listing format:
// `<OPCODE> <DEST> <SRC1> <SRC2>`, one instruction per line.

use crate::errors::SimulatorError;
use crate::instruction::{Instruction, Opcode};

/// Parse a single non-blank line. A trailing `+` on `src1` is stripped
/// before storing, mirroring the listing convention for load offsets.
pub fn parse_line(line_number: usize, line: &str) -> Result<Instruction, SimulatorError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(SimulatorError::ParseError { line: line_number, text: line.to_string() });
    }

    let opcode = Opcode::from_str(fields[0])
        .ok_or_else(|| SimulatorError::UnknownOpcode { line: line_number, opcode: fields[0].to_string() })?;
    let destination = fields[1].to_string();
    let src1 = fields[2].strip_suffix('+').unwrap_or(fields[2]).to_string();
    let src2 = fields[3].to_string();

    Ok(Instruction::new(opcode, destination, src1, src2))
}

/// Parse a full program, skipping blank lines. Line numbers are 1-based.
pub fn parse_program(text: &str) -> Result<Vec<Instruction>, SimulatorError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(i + 1, line))
        .collect()
}

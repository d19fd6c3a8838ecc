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

// main.rs
//
// Command-line entry point for the Tomasulo reorder-buffer simulator.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use tomasulo_rob_sim::config::SimulatorConfig;
use tomasulo_rob_sim::driver::Driver;
use tomasulo_rob_sim::errors::SimulatorError;
use tomasulo_rob_sim::parser::parse_program;

#[derive(Parser)]
#[command(name = "tomasulo_rob_sim")]
#[command(about = "A Tomasulo reorder-buffer processor simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulator on an assembly listing and write the trace output.
    Run {
        /// Input assembly listing
        #[arg(short, long, default_value = "../input/input1.txt")]
        input: PathBuf,

        /// Output trace file
        #[arg(short, long, default_value = "../output/output1.txt")]
        output: PathBuf,

        /// Reorder buffer size
        #[arg(long, default_value = "6")]
        rob_size: usize,

        /// Number of Add/Sub reservation stations
        #[arg(long, default_value = "3")]
        add_stations: usize,

        /// Number of Mult/Div reservation stations
        #[arg(long, default_value = "2")]
        mult_stations: usize,

        /// Number of load buffers
        #[arg(long, default_value = "2")]
        load_buffers: usize,

        /// Number of FP registers
        #[arg(long, default_value = "11")]
        registers: usize,

        /// Operator safety valve: abort if the simulation has not
        /// structurally completed within this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Log level (error, warn, info, debug, trace)
        #[arg(long, default_value = "info")]
        log_level: String,
    },
}

fn run(args: Commands) -> Result<(), SimulatorError> {
    let Commands::Run { input, output, rob_size, add_stations, mult_stations, load_buffers, registers, max_cycles, log_level } =
        args;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&log_level)).init();

    let text = std::fs::read_to_string(&input)?;
    let program = parse_program(&text)?;

    let config = SimulatorConfig::new()
        .with_rob_size(rob_size)
        .with_add_stations(add_stations)
        .with_mult_stations(mult_stations)
        .with_load_buffers(load_buffers)
        .with_registers(registers)
        .with_max_cycles(max_cycles);

    let trace = Driver::new(config, program).run();
    std::fs::write(&output, trace)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        },
    }
}

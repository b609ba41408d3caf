//! # RV-LTL monitor
//!
//! Runtime verification of Linear Temporal Logic (LTL) properties
//! under the four-valued semantics of RV-LTL.[^1]
//!
//! Properties are read from JSON formula files,
//! and can be monitored over recorded traces (CSV, possibly gzip-compressed)
//! or over randomly generated traces, to estimate how often each verdict is reached.
//!
//! [^1]: Bauer, A., Leucker, M., & Schallhart, C. (2010). *Comparing LTL semantics for runtime verification*.
//! Journal of Logic and Computation, 20(3).

mod formula_file;
mod progress;
mod replay;
mod report;
mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use progress::Bar;
use replay::ReplayArgs;
use simulate::SimulateArgs;

/// Available commands.
#[deny(missing_docs)]
#[derive(Subcommand)]
enum Commands {
    /// Validate the formula file, without monitoring it.
    Validate,
    /// Monitor the formula over a recorded trace.
    ///
    /// EXAMPLE: rvltl PATH/TO/FORMULA.json monitor PATH/TO/TRACE.csv
    /// EXAMPLE: rvltl PATH/TO/FORMULA.json monitor --final-only PATH/TO/TRACE.csv.gz
    #[clap(verbatim_doc_comment)]
    Monitor {
        /// Args for trace replay.
        #[clap(flatten)]
        args: ReplayArgs,
        /// Print JSON-serialized report.
        #[arg(long)]
        json: bool,
    },
    /// Monitor the formula over random traces, and tally the verdicts.
    ///
    /// At every step, each atom is true with the probability given in the formula file.
    ///
    /// EXAMPLE: rvltl PATH/TO/FORMULA.json simulate --runs 10000 --length 100
    #[clap(verbatim_doc_comment)]
    Simulate {
        /// Args for simulation.
        #[clap(flatten)]
        args: SimulateArgs,
        /// Print progress bars during simulation.
        #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "unicode")]
        progress: Option<Bar>,
        /// Print JSON-serialized final report.
        ///
        /// By default, a user-friendly report is printed at the end of the simulation.
        /// This flag has the report printed in JSON format instead.
        #[arg(long)]
        json: bool,
    },
}

/// An online monitor for LTL properties with four-valued RV-LTL verdicts.
///
/// Verdicts are TRUE or FALSE once settled by the observed prefix,
/// and PRESUMABLY_TRUE or PRESUMABLY_FALSE while they could still change.
#[derive(Parser)]
#[deny(missing_docs)]
#[command(version, about, long_about)]
pub struct Cli {
    /// Path of the JSON formula file.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    formula: PathBuf,
    /// Verbose output
    #[command(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity,
    /// Actions to execute on the formula.
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let name = self
            .formula
            .file_stem()
            .map(|os_str| os_str.to_string_lossy().into_owned())
            .unwrap_or_else(|| "formula".to_owned());

        eprint!("Processing formula file...");
        let loaded = formula_file::load(&self.formula)?;
        eprintln!(" done");

        match self.command {
            Commands::Validate => {
                println!("formula '{name}' successfully validated");
                println!("{}", loaded.formula);
                println!(
                    "{} atoms ({} required), {} compiled nodes",
                    loaded.formula.atoms().count(),
                    loaded.formula.required_atoms().len(),
                    loaded.formula.len()
                );
            }
            Commands::Monitor { args, json } => {
                args.replay(name, &loaded.formula)?.print(json);
            }
            Commands::Simulate {
                args,
                progress,
                json,
            } => {
                args.simulate(name, &loaded, progress)?.print(json);
            }
        }
        Ok(())
    }
}

// From Clap tutorial <https://docs.rs/clap/latest/clap/_derive/_tutorial/index.html#testing>
#[test]
fn verify_cli() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

use clap::Parser;
use rvltl_core::{Simulation, Tally};

use crate::{formula_file::Loaded, progress::Bar, report::SimulationReport};

/// Monitor the formula over random traces.
#[derive(Debug, Clone, Parser)]
#[deny(missing_docs)]
pub(crate) struct SimulateArgs {
    /// Number of runs to simulate.
    #[arg(short, long, default_value_t = 1000)]
    pub(crate) runs: u32,
    /// Max number of steps of a run.
    ///
    /// A run stops earlier if the formula is found to be violated.
    #[arg(short, long, default_value_t = 300)]
    pub(crate) length: usize,
    /// Seed of the random number generators.
    ///
    /// By default, a random seed is used.
    /// Runs with the same seed produce the same results,
    /// regardless of multi-threading.
    #[arg(short, long)]
    pub(crate) seed: Option<u64>,
    /// Run the simulation on a single thread.
    #[arg(long, default_value_t = false)]
    pub(crate) single_thread: bool,
}

impl SimulateArgs {
    pub(crate) fn simulate(
        &self,
        name: String,
        loaded: &Loaded,
        progress: Option<Bar>,
    ) -> anyhow::Result<SimulationReport> {
        let mut simulation = Simulation::new(&loaded.formula, self.length)?;
        for &(atom, probability) in &loaded.probabilities {
            simulation.set_probability(atom, probability)?;
        }
        let seed = self.seed.unwrap_or_else(rand::random);
        let tally = if let Some(bar) = progress {
            bar.track(&name, self.runs, &simulation, || self.run(&simulation, seed))
        } else {
            eprint!("Simulation in progress...");
            let tally = self.run(&simulation, seed);
            eprintln!(" done!");
            tally
        };
        Ok(SimulationReport::new(name, seed, self.length, &tally))
    }

    fn run(&self, simulation: &Simulation, seed: u64) -> Tally {
        if self.single_thread {
            simulation.simulate(self.runs, seed)
        } else {
            simulation.par_simulate(self.runs, seed)
        }
    }
}

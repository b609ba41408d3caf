use crate::{Atom, B4, Formula};
use log::{info, trace};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;

/// The error type for the configuration of a [`Simulation`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// The probability assigned to an atom is not in `[0, 1]`.
    #[error("probability {1} of atom {0:?} is not in [0, 1]")]
    Probability(Atom, f64),
    /// Runs need at least one step to produce a verdict.
    #[error("the maximum length of a run must be positive")]
    Length,
}

/// The outcome of a single simulated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// The verdict after the last observed step.
    pub verdict: B4,
    /// Number of steps of the run.
    pub length: usize,
}

/// Aggregated outcomes of a batch of simulated runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Number of completed runs.
    pub runs: u32,
    /// Total number of steps over all runs.
    pub steps: u64,
    counts: [u32; 4],
}

impl Tally {
    /// Number of runs that ended with the given verdict.
    pub fn count(&self, verdict: B4) -> u32 {
        self.counts[verdict as usize - 1]
    }

    /// Average number of steps per run.
    pub fn mean_length(&self) -> f64 {
        if self.runs == 0 {
            0f64
        } else {
            self.steps as f64 / self.runs as f64
        }
    }
}

/// Monitors a [`Formula`] over randomly generated traces.
///
/// At every step, each atom of the formula is independently true with its given probability.
/// A run stops as soon as the formula is found to be [`B4::False`],
/// or after the maximum number of steps.
///
/// Runs are independent and only share the (immutable) formula,
/// so they can be executed in parallel.
/// Counters are updated as runs complete, and can be read while the simulation is in progress.
#[derive(Debug)]
pub struct Simulation<'f> {
    formula: &'f Formula,
    probabilities: Vec<(Atom, f64)>,
    max_length: usize,
    completed: AtomicU32,
    steps: AtomicU64,
    counts: [AtomicU32; 4],
}

impl<'f> Simulation<'f> {
    /// Creates a new [`Simulation`] where every atom is true with probability `0.5`.
    pub fn new(formula: &'f Formula, max_length: usize) -> Result<Self, SimulationError> {
        if max_length == 0 {
            return Err(SimulationError::Length);
        }
        Ok(Self {
            formula,
            probabilities: formula
                .required_atoms()
                .iter()
                .map(|atom| (*atom, 0.5))
                .collect(),
            max_length,
            completed: AtomicU32::new(0),
            steps: AtomicU64::new(0),
            counts: Default::default(),
        })
    }

    /// Sets the probability of the given atom being true at any step.
    /// Atoms not occurring in the formula are ignored.
    pub fn set_probability(&mut self, atom: Atom, probability: f64) -> Result<(), SimulationError> {
        if !(0f64..=1f64).contains(&probability) {
            return Err(SimulationError::Probability(atom, probability));
        }
        if let Some((_, p)) = self.probabilities.iter_mut().find(|(a, _)| *a == atom) {
            *p = probability;
        }
        Ok(())
    }

    /// The maximum number of steps of a run.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Runs a single simulation with a fresh monitor and returns its [`RunOutcome`].
    pub fn run<R: Rng>(&self, rng: &mut R) -> RunOutcome {
        trace!("new run starting");
        let mut monitor = self.formula.monitor();
        // reuse vector to avoid allocations
        let mut step = Vec::with_capacity(self.probabilities.len());
        let mut verdict = B4::PresumablyFalse;
        while monitor.len() < self.max_length {
            step.clear();
            step.extend(
                self.probabilities
                    .iter()
                    .map(|&(atom, p)| (atom, rng.random_bool(p))),
            );
            monitor
                .update(step.iter().copied())
                .expect("random steps assign every atom of the formula");
            verdict = monitor.evaluate();
            if verdict == B4::False {
                trace!("run violated at step {}", monitor.len() - 1);
                break;
            }
        }
        trace!("run complete");
        RunOutcome {
            verdict,
            length: monitor.len(),
        }
    }

    fn reset(&self) {
        self.completed.store(0, Ordering::Relaxed);
        self.steps.store(0, Ordering::Relaxed);
        self.counts
            .iter()
            .for_each(|count| count.store(0, Ordering::Relaxed));
    }

    fn sample(&self, seed: u64, run: u32) {
        let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(run as u64));
        let outcome = self.run(&mut rng);
        self.counts[outcome.verdict as usize - 1].fetch_add(1, Ordering::Relaxed);
        self.steps
            .fetch_add(outcome.length as u64, Ordering::Relaxed);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of runs completed in the current simulation.
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Returns the outcomes of the runs completed in the current simulation.
    pub fn tally(&self) -> Tally {
        let mut counts = [0; 4];
        counts
            .iter_mut()
            .zip(&self.counts)
            .for_each(|(c, count)| *c = count.load(Ordering::Relaxed));
        Tally {
            runs: self.completed(),
            steps: self.steps.load(Ordering::Relaxed),
            counts,
        }
    }

    /// Executes the given number of runs, one after the other.
    ///
    /// Run `n` uses an RNG seeded with `seed + n`,
    /// so the result is the same as that of [`Self::par_simulate`] with the same arguments.
    pub fn simulate(&self, runs: u32, seed: u64) -> Tally {
        self.reset();
        info!("simulation starting");
        let start_time = Instant::now();

        (0..runs).for_each(|run| self.sample(seed, run));

        let elapsed = start_time.elapsed();
        info!("simulation time elapsed: {elapsed:0.2?}");
        info!("simulation terminating");
        self.tally()
    }

    /// Executes the given number of runs in parallel.
    ///
    /// See also [`Self::simulate`].
    pub fn par_simulate(&self, runs: u32, seed: u64) -> Tally {
        self.reset();
        info!("parallel simulation starting");
        let start_time = Instant::now();

        (0..runs)
            .into_par_iter()
            .for_each(|run| self.sample(seed, run));

        let elapsed = start_time.elapsed();
        info!("simulation time elapsed: {elapsed:0.2?}");
        info!("simulation terminating");
        self.tally()
    }
}

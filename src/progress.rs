use clap::ValueEnum;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rvltl_core::{B4, Simulation};

/// Simulation progress bar
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub(crate) enum Bar {
    /// Fancy Unicode progress bars
    #[default]
    Unicode,
    /// Basic ASCII progress bars
    Ascii,
}

impl Bar {
    /// Runs `job` on a separate thread,
    /// printing the progress of `simulation` until the job returns.
    pub(crate) fn track<T, F>(&self, name: &str, runs: u32, simulation: &Simulation, job: F) -> T
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        std::thread::scope(|s| {
            let handle = s.spawn(job);
            self.print_progress_bar(name, runs, simulation, || handle.is_finished());
            handle
                .join()
                .unwrap_or_else(|err| std::panic::resume_unwind(err))
        })
    }

    fn print_progress_bar(
        &self,
        name: &str,
        runs: u32,
        simulation: &Simulation,
        finished: impl Fn() -> bool,
    ) {
        const FINE_BAR: &str = "█▉▊▋▌▍▎▏  ";
        const ASCII_BAR: &str = "#--";
        const ASCII_SPINNER: &str = "|/-\\";

        let bars = MultiProgress::new();

        // Spinner
        let spinner_style = if let Bar::Ascii = self {
            ProgressStyle::with_template("{elapsed_precise} {spinner} {msg}")
                .expect("progress bar template")
                .tick_chars(ASCII_SPINNER)
        } else {
            ProgressStyle::with_template("{elapsed_precise} {spinner} {msg}")
                .expect("progress bar template")
        };
        let spinner = bars.add(
            ProgressBar::new_spinner()
                .with_style(spinner_style)
                .with_message(format!(
                    "Simulating {name} ({runs} runs, max length {})",
                    simulation.max_length()
                )),
        );

        // Progress bar
        let progress_style = if let Bar::Ascii = self {
            ProgressStyle::with_template("{bar:50} {percent:>3}% ({pos}/{len}) ETA: {eta}")
                .expect("progress bar template")
                .progress_chars(ASCII_BAR)
        } else {
            ProgressStyle::with_template(
                "{bar:50.white.on_black} {percent:>3}% ({pos}/{len}) ETA: {eta}",
            )
            .expect("progress bar template")
            .progress_chars(FINE_BAR)
        };
        let progress_bar = bars.add(ProgressBar::new(runs as u64).with_style(progress_style));

        let line_style =
            ProgressStyle::with_template("Verdict rates:").expect("progress bar template");
        let line = bars.add(ProgressBar::new(0).with_style(line_style));

        // Verdict bars
        let verdict_style = if let Bar::Ascii = self {
            ProgressStyle::with_template("{bar:50} {percent:>3}% {prefix} {msg}")
                .expect("progress bar template")
                .progress_chars(ASCII_BAR)
        } else {
            ProgressStyle::with_template("{bar:50.green.on_black} {percent:>3}% {prefix} {msg}")
                .expect("progress bar template")
                .progress_chars(FINE_BAR)
        };
        let verdict_bars = B4::ALL.map(|verdict| {
            bars.add(
                ProgressBar::new(1)
                    .with_style(verdict_style.clone())
                    .with_prefix(verdict.to_string()),
            )
        });

        bars.set_move_cursor(true);
        while !finished() {
            let tally = simulation.tally();
            let completed = tally.runs as u64;
            if completed > progress_bar.position() {
                spinner.tick();
                progress_bar.set_position(completed);
                line.tick();
                for (verdict, bar) in B4::ALL.into_iter().zip(&verdict_bars) {
                    let count = tally.count(verdict);
                    bar.set_length(completed);
                    bar.set_position(count as u64);
                    bar.set_message(format!("({count} runs)"));
                    bar.tick();
                }
            }
            // Sleep a while to limit update/refresh rate.
            std::thread::sleep(std::time::Duration::from_millis(100));
        }

        // Clean up terminal
        bars.set_move_cursor(false);
        spinner.finish_and_clear();
        progress_bar.finish_and_clear();
        line.finish_and_clear();
        verdict_bars.iter().for_each(|b| b.finish_and_clear());
    }
}

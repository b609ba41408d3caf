use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, anyhow, bail};
use clap::Parser;
use flate2::read::GzDecoder;
use log::{info, trace};
use rvltl_core::{B4, Formula};

use crate::report::ReplayReport;

/// Replay a recorded trace.
#[derive(Debug, Clone, Parser)]
#[deny(missing_docs)]
pub(crate) struct ReplayArgs {
    /// Path of the trace, in CSV format.
    ///
    /// The header row lists the identifiers of the atoms,
    /// and every following row is a step of the trace,
    /// with values among 'true', 'false', 't', 'f', '1', '0' (case-insensitive).
    /// Files with '.gz' extension are decompressed on the fly.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub(crate) trace: PathBuf,
    /// Only print the verdict after the last step of the trace.
    #[arg(long)]
    pub(crate) final_only: bool,
}

impl ReplayArgs {
    pub(crate) fn replay(&self, name: String, formula: &Formula) -> anyhow::Result<ReplayReport> {
        let reader = open(&self.trace)?;
        let replay = replay(formula, reader, self.final_only)
            .with_context(|| format!("failed to replay trace '{}'", self.trace.display()))?;
        Ok(ReplayReport::new(
            name,
            self.trace.display().to_string(),
            replay.steps,
            &replay.verdicts,
            replay.verdict,
        ))
    }
}

fn open(path: &Path) -> anyhow::Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("failed to open trace '{}'", path.display()))?;
    let reader = BufReader::new(file);
    if path.extension().is_some_and(|ext| ext == "gz") {
        info!("decompressing trace '{}'", path.display());
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

fn parse_value(cell: &str) -> Option<bool> {
    match cell.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub(crate) struct Replay {
    pub(crate) steps: usize,
    pub(crate) verdicts: Vec<B4>,
    pub(crate) verdict: B4,
}

pub(crate) fn replay(formula: &Formula, reader: impl Read, final_only: bool) -> anyhow::Result<Replay> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    // Columns of atoms occurring in the formula; all other columns are ignored.
    let columns = reader
        .headers()
        .context("failed to read trace header")?
        .iter()
        .enumerate()
        .filter_map(|(col, id)| {
            formula
                .atom_by_identifier(id)
                .filter(|atom| formula.required_atoms().binary_search(atom).is_ok())
                .map(|atom| (col, id.to_owned(), atom))
        })
        .collect::<Vec<_>>();
    let mut monitor = formula.monitor();
    let mut verdicts = Vec::new();
    for (step, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read step {step}"))?;
        let values = columns
            .iter()
            .map(|(col, id, atom)| {
                let cell = record
                    .get(*col)
                    .ok_or_else(|| anyhow!("step {step}, atom '{id}': missing value"))?;
                parse_value(cell)
                    .map(|value| (*atom, value))
                    .ok_or_else(|| anyhow!("step {step}, atom '{id}': invalid value '{cell}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        monitor
            .update(values)
            .with_context(|| format!("failed to observe step {step}"))?;
        if !final_only {
            verdicts.push(monitor.evaluate());
        }
        trace!("step {step} replayed");
    }
    if monitor.is_empty() {
        bail!("trace has no steps");
    }
    Ok(Replay {
        steps: monitor.len(),
        verdicts,
        verdict: monitor.evaluate(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rvltl_core::{FormulaBuilder, Ltl};

    fn request_response() -> Formula {
        let mut builder = FormulaBuilder::new();
        let request = builder
            .new_identified_atom("req", Some("request"))
            .expect("atom");
        let response = builder
            .new_identified_atom("res", Some("response"))
            .expect("atom");
        builder
            .build(Ltl::always(Ltl::implies(request, Ltl::eventually(response))))
            .expect("build")
    }

    #[test]
    fn every_step() {
        let formula = request_response();
        let trace = "req,res,other\nfalse,false,x\nTRUE,f,x\n0, 1 ,x\n";
        let replay = replay(&formula, trace.as_bytes(), false).expect("replay");
        assert_eq!(replay.steps, 3);
        assert_eq!(
            replay.verdicts,
            vec![B4::PresumablyTrue, B4::PresumablyFalse, B4::PresumablyTrue]
        );
        assert_eq!(replay.verdict, B4::PresumablyTrue);
    }

    #[test]
    fn final_only() {
        let formula = request_response();
        let trace = "res,req\n0,1\n0,0\n";
        let replay = replay(&formula, trace.as_bytes(), true).expect("replay");
        assert_eq!(replay.steps, 2);
        assert!(replay.verdicts.is_empty());
        assert_eq!(replay.verdict, B4::PresumablyFalse);
    }

    #[test]
    fn missing_column() {
        let formula = request_response();
        let err = replay(&formula, "req\n1\n".as_bytes(), false).expect_err("missing column");
        assert!(format!("{err:#}").contains("response"));
        assert!(format!("{err:#}").contains("step 0"));
    }

    #[test]
    fn invalid_value() {
        let formula = request_response();
        let err = replay(&formula, "req,res\n1,0\n1,yes\n".as_bytes(), false)
            .expect_err("invalid value");
        assert!(err.to_string().contains("step 1"));
    }

    #[test]
    fn unused_columns_are_not_parsed() {
        let mut builder = FormulaBuilder::new();
        let p = builder.new_identified_atom("p", None).expect("atom");
        let _unused = builder.new_identified_atom("unused", None).expect("atom");
        let formula = builder.build(Ltl::Atom(p)).expect("build");
        let trace = "unused,p,unknown\nmaybe,1,x\n";
        let replay = replay(&formula, trace.as_bytes(), false).expect("replay");
        assert_eq!(replay.verdicts, vec![B4::True]);
    }

    #[test]
    fn empty_trace() {
        let formula = request_response();
        replay(&formula, "req,res\n".as_bytes(), false).expect_err("empty trace");
    }

    #[test]
    fn compressed_trace() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let path = std::env::temp_dir().join(format!("rvltl-{}.csv.gz", std::process::id()));
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"req,res\n1,0\n0,0\n0,1\n")
            .expect("compress");
        std::fs::write(&path, encoder.finish().expect("compress")).expect("write trace");

        let formula = request_response();
        let replay = replay(&formula, open(&path).expect("open"), true);
        std::fs::remove_file(&path).expect("remove trace");
        assert_eq!(replay.expect("replay").verdict, B4::PresumablyTrue);
    }
}

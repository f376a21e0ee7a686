//! Interactive explanation dashboard.
//!
//! Loads a pretrained regression model plus its companion artifacts and
//! runs a prompt/predict/explain loop in the terminal: one numeric input
//! per feature, a prediction metric, an attribution waterfall, and a
//! local surrogate weight table.
//!
//! Usage:
//!   cargo run --bin dashboard -- --artifacts artifacts/
//!
//! Options:
//!   --artifacts DIR      Artifact directory (default: artifacts)
//!   --samples N          Surrogate perturbation samples (default: 512)
//!   --seed N             Surrogate RNG seed (default: 42)
//!   --top K              Features shown per explanation (default: 10)
//!   --set NAME=VALUE     Preset a feature value (repeatable, skips prompts)
//!   --once               Run a single interaction and exit
//!
//! Set RUST_LOG=debug for stage timings.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use glassbox::render::{render_report, Frame};
use glassbox::{ArtifactBundle, FeatureSchema, InputVector, Pipeline, SurrogateConfig};

#[derive(Debug, Parser)]
#[command(name = "dashboard", about = "Regression explanation dashboard")]
struct Args {
    /// Directory containing model.gbx, scaler.gbx, reference.parquet,
    /// and feature_names.json
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Perturbation sample count for the local surrogate
    #[arg(long, default_value_t = 512)]
    samples: usize,

    /// Surrogate RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Show at most this many features per explanation section
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Preset feature values, repeatable (`name=value`); skips prompting
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Run a single interaction and exit
    #[arg(long)]
    once: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let bundle = ArtifactBundle::load(&args.artifacts).map_err(|e| e.to_string())?;
    let pipeline = Pipeline::new(
        &bundle,
        SurrogateConfig {
            n_samples: args.samples,
            seed: args.seed,
            ..SurrogateConfig::default()
        },
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let preset = !args.set.is_empty();

    loop {
        let input = if preset {
            preset_input(bundle.schema(), &args.set)?
        } else {
            prompt_input(bundle.schema(), &mut stdin.lock(), &mut stdout)
                .map_err(|e| e.to_string())?
        };

        let mut frame = Frame::new();
        frame.title("Regression Explanation Dashboard");
        match pipeline.run(&input) {
            Ok(report) => render_report(&mut frame, bundle.schema(), &report, args.top),
            Err(e) => frame.stage_error(e.stage(), &e),
        }
        frame.flush_to(&mut stdout).map_err(|e| e.to_string())?;

        if args.once || preset || !another(&mut stdin.lock(), &mut stdout).map_err(|e| e.to_string())? {
            return Ok(());
        }
    }
}

/// Solicit one value per schema feature, in schema order. Empty or
/// unparseable entries fall back to the 0.0 default.
fn prompt_input(
    schema: &FeatureSchema,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<InputVector> {
    writeln!(output, "Enter feature values (empty = 0.0):")?;
    let mut values = Vec::with_capacity(schema.len());
    for name in schema.iter() {
        write!(output, "  {name} [0.0]: ")?;
        output.flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
        let trimmed = line.trim();
        let value = if trimmed.is_empty() {
            0.0
        } else {
            match trimmed.parse::<f32>() {
                Ok(v) => v,
                Err(_) => {
                    writeln!(output, "    not a number, using 0.0")?;
                    0.0
                }
            }
        };
        values.push(value);
    }
    Ok(InputVector::from_ordered(values))
}

/// Build the input from `--set name=value` flags.
fn preset_input(schema: &FeatureSchema, pairs: &[String]) -> Result<InputVector, String> {
    let mut parsed = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=VALUE, got '{pair}'"))?;
        let value: f32 = value
            .trim()
            .parse()
            .map_err(|_| format!("not a number in '{pair}'"))?;
        parsed.push((name.trim().to_string(), value));
    }
    InputVector::from_pairs(schema, &parsed).map_err(|e| e.to_string())
}

/// Ask whether to run another interaction; EOF means no.
fn another(input: &mut impl BufRead, output: &mut impl Write) -> io::Result<bool> {
    write!(output, "\nAnother prediction? [Y/n] ")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(!line.trim_start().starts_with(['n', 'N']))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(list: &[&str]) -> FeatureSchema {
        FeatureSchema::new(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn prompt_parses_and_defaults() {
        let schema = schema(&["a", "b", "c"]);
        let mut input = "1.5\n\nnonsense\n".as_bytes();
        let mut output = Vec::new();
        let vector = prompt_input(&schema, &mut input, &mut output).unwrap();
        assert_eq!(vector.values().to_vec(), vec![1.5, 0.0, 0.0]);
        assert!(String::from_utf8(output).unwrap().contains("not a number"));
    }

    #[test]
    fn preset_rejects_malformed_pairs() {
        let schema = schema(&["a"]);
        assert!(preset_input(&schema, &["a=1.0".to_string()]).is_ok());
        assert!(preset_input(&schema, &["a".to_string()]).is_err());
        assert!(preset_input(&schema, &["a=xyz".to_string()]).is_err());
        assert!(preset_input(&schema, &["z=1.0".to_string()]).is_err());
    }

    #[test]
    fn another_treats_eof_as_no() {
        let mut output = Vec::new();
        assert!(!another(&mut "".as_bytes(), &mut output).unwrap());
        assert!(another(&mut "\n".as_bytes(), &mut output).unwrap());
        assert!(another(&mut "y\n".as_bytes(), &mut output).unwrap());
        assert!(!another(&mut "n\n".as_bytes(), &mut output).unwrap());
    }
}

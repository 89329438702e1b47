//! Command-line parsing for the CZM curve tool.
//!
//! Argument parsing and command dispatch stay separate from the numeric
//! code: every subcommand maps onto one library operation or pipeline.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::ColumnRef;
use crate::domain::{FitForm, Metric};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "czm", version, about = "Cohesive-zone fracture test post-processing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the analytical load–displacement curve of a specimen.
    Analytical(AnalyticalArgs),
    /// Split a load–displacement trace at peak load.
    Split(SplitArgs),
    /// Fit a functional form to two columns of a table.
    Fit(FitArgs),
    /// Evaluate a saved fit against two columns of another table.
    Evaluate(EvaluateArgs),
    /// Compare analytical fits against simulated / experimental curves.
    Compare(CompareArgs),
    /// Run `compare` for every case of a JSON manifest.
    Batch(BatchArgs),
    /// Redefine cohesive elements of an FE input deck as user elements.
    Deck(DeckArgs),
    /// Run the external FE solver on a deck and split its history output.
    Job(JobArgs),
    /// Print the comparison log.
    History(HistoryArgs),
}

/// Specimen given either directly or as an FE test model.
#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct SpecimenSource {
    /// Specimen geometry JSON.
    #[arg(long, value_name = "JSON")]
    pub geometry: Option<PathBuf>,

    /// FE test-model JSON; the analytical specimen is derived from it.
    #[arg(long = "test-model", value_name = "JSON")]
    pub test_model: Option<PathBuf>,
}

/// Terminal plot options.
#[derive(Debug, Args, Clone)]
pub struct PlotOptions {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args)]
pub struct AnalyticalArgs {
    #[command(flatten)]
    pub specimen: SpecimenSource,

    /// Curve CSV to write (defaults to `<name>.csv`).
    #[arg(short, long, value_name = "CSV")]
    pub out: Option<PathBuf>,

    /// Append the specimen to this JSON-lines input log.
    #[arg(long, value_name = "JSONL")]
    pub input_log: Option<PathBuf>,

    #[command(flatten)]
    pub plot: PlotOptions,
}

#[derive(Debug, Args)]
pub struct SplitArgs {
    /// Load–displacement table (CSV with a header row).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Input is a history-output file (three label rows).
    #[arg(long)]
    pub history: bool,

    /// Displacement column (index or header name).
    #[arg(long, default_value = "0")]
    pub disp_col: ColumnRef,

    /// Load column (index or header name).
    #[arg(long, default_value = "1")]
    pub load_col: ColumnRef,

    /// Split curve CSV to write (defaults to `<input stem>_Split.csv`).
    #[arg(short, long, value_name = "CSV")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub plot: PlotOptions,
}

#[derive(Debug, Args)]
pub struct FitArgs {
    /// Table to fit (CSV with a header row).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Independent-variable column (index or header name).
    #[arg(long, default_value = "0")]
    pub x_col: ColumnRef,

    /// Dependent-variable column (index or header name).
    #[arg(long, default_value = "1")]
    pub y_col: ColumnRef,

    #[arg(long, value_enum, default_value_t = FitForm::Linear)]
    pub form: FitForm,

    /// Number of parameters; must match the form.
    #[arg(long)]
    pub params: Option<usize>,

    #[arg(long, value_enum, default_value_t = Metric::Mse)]
    pub metric: Metric,

    /// Write the fit result as JSON.
    #[arg(short, long, value_name = "JSON")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Fit result JSON written by `czm fit --out`.
    #[arg(long, value_name = "JSON")]
    pub fit: PathBuf,

    /// Table to evaluate against.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    #[arg(long, default_value = "0")]
    pub x_col: ColumnRef,

    #[arg(long, default_value = "1")]
    pub y_col: ColumnRef,

    /// Lower domain bound (exclusive); defaults to the column minimum.
    #[arg(long, allow_hyphen_values = true)]
    pub x_min: Option<f64>,

    /// Upper domain bound (exclusive); defaults to the column maximum.
    #[arg(long, allow_hyphen_values = true)]
    pub x_max: Option<f64>,

    #[arg(long, value_enum, default_value_t = Metric::Mse)]
    pub metric: Metric,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Test name recorded in the log.
    #[arg(short, long)]
    pub name: String,

    /// Analytical curve CSV.
    #[arg(long, value_name = "CSV", conflicts_with_all = ["geometry", "test_model"])]
    pub analytical: Option<PathBuf>,

    /// Generate the analytical curve from a specimen geometry JSON.
    #[arg(long, value_name = "JSON", conflicts_with = "test_model")]
    pub geometry: Option<PathBuf>,

    /// Generate the analytical curve from an FE test-model JSON.
    #[arg(long = "test-model", value_name = "JSON")]
    pub test_model: Option<PathBuf>,

    /// Simulated split curve CSV.
    #[arg(long, value_name = "CSV")]
    pub simulated: Option<PathBuf>,

    /// Experimental split curve CSV.
    #[arg(long, value_name = "CSV")]
    pub experimental: Option<PathBuf>,

    /// Form fitted to the elastic regime.
    #[arg(long, value_enum, default_value_t = FitForm::Linear)]
    pub elastic_form: FitForm,

    /// Form fitted to the fracture regime.
    #[arg(long, value_enum, default_value_t = FitForm::Exponential)]
    pub fracture_form: FitForm,

    /// Comparison log to append to.
    #[arg(long, value_name = "JSONL", default_value = "OutputDatabase.jsonl")]
    pub log: PathBuf,

    #[command(flatten)]
    pub plot: PlotOptions,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Manifest JSON; relative paths resolve against its directory.
    #[arg(short, long, value_name = "JSON")]
    pub manifest: PathBuf,

    /// Comparison log to append to.
    #[arg(long, value_name = "JSONL", default_value = "OutputDatabase.jsonl")]
    pub log: PathBuf,

    /// Worker threads (defaults to the number of CPUs).
    #[arg(long)]
    pub jobs: Option<usize>,
}

#[derive(Debug, Args)]
pub struct DeckArgs {
    /// Input deck.
    #[arg(short, long, value_name = "INP")]
    pub input: PathBuf,

    /// Rewritten deck (defaults to overwriting the input).
    #[arg(short, long, value_name = "INP")]
    pub out: Option<PathBuf>,

    /// Cohesive constants: stiffness, mode-I strength, mode-II strength,
    /// mode-I toughness, mode-II toughness, B-K exponent.
    #[arg(long, value_delimiter = ',', required = true, allow_hyphen_values = true)]
    pub props: Vec<f64>,
}

#[derive(Debug, Args)]
pub struct JobArgs {
    /// Job name.
    #[arg(short, long)]
    pub name: String,

    /// Input deck.
    #[arg(long, value_name = "INP")]
    pub deck: PathBuf,

    /// Work directory (defaults to the current directory).
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Solver command line; `{deck}` and `{name}` are substituted.
    /// Falls back to the `CZM_SOLVER_CMD` environment variable.
    #[arg(long, value_name = "CMD")]
    pub solver_cmd: Option<String>,

    /// History-output file the solver writes, relative to the work dir.
    #[arg(long, default_value = crate::job::DEFAULT_RESULT_FILE)]
    pub result_file: String,

    /// Displacement column of the history output.
    #[arg(long, default_value = "U2")]
    pub disp_col: ColumnRef,

    /// Load column of the history output.
    #[arg(long, default_value = "RF2")]
    pub load_col: ColumnRef,

    /// Split curve CSV to write (defaults to `<name>_Split.csv` in the work dir).
    #[arg(short, long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Comparison log.
    #[arg(long, value_name = "JSONL", default_value = "OutputDatabase.jsonl")]
    pub log: PathBuf,

    /// Only show entries whose name contains this text.
    #[arg(long)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compare_defaults_to_linear_and_exponential() {
        let cli = Cli::parse_from(["czm", "compare", "-n", "t1", "--analytical", "a.csv"]);
        let Command::Compare(args) = cli.command else {
            panic!("expected compare");
        };
        assert_eq!(args.elastic_form, FitForm::Linear);
        assert_eq!(args.fracture_form, FitForm::Exponential);
        assert!(args.simulated.is_none());
    }

    #[test]
    fn columns_parse_as_names_or_indices() {
        let cli = Cli::parse_from(["czm", "split", "-i", "r.csv", "--disp-col", "U2", "--load-col", "3"]);
        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.disp_col, ColumnRef::Name("U2".to_string()));
        assert_eq!(args.load_col, ColumnRef::Index(3));
    }

    #[test]
    fn deck_props_are_comma_separated() {
        let cli = Cli::parse_from(["czm", "deck", "-i", "Job.inp", "--props", "1e6,18,47.2,0.42,2.89,2.35"]);
        let Command::Deck(args) = cli.command else {
            panic!("expected deck");
        };
        assert_eq!(args.props, [1e6, 18.0, 47.2, 0.42, 2.89, 2.35]);
        assert!(Cli::try_parse_from(["czm", "deck", "-i", "Job.inp"]).is_err());
    }

    #[test]
    fn analytical_needs_exactly_one_specimen_source() {
        assert!(Cli::try_parse_from(["czm", "analytical"]).is_err());
        assert!(
            Cli::try_parse_from(["czm", "analytical", "--geometry", "g.json", "--test-model", "t.json"]).is_err()
        );
        assert!(Cli::try_parse_from(["czm", "analytical", "--test-model", "t.json"]).is_ok());
    }
}

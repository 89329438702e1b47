//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - dispatches each subcommand onto library operations
//! - prints reports and plots
//! - writes curve files and appends to the JSON-lines logs

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info};

use crate::analytical;
use crate::cli::{
    AnalyticalArgs, BatchArgs, Cli, Command, CompareArgs, DeckArgs, EvaluateArgs, FitArgs, HistoryArgs, JobArgs,
    PlotOptions, SpecimenSource, SplitArgs,
};
use crate::data::{split_at_max, ColumnRef, Table};
use crate::deck::{rewrite_deck_file, CohesiveProps};
use crate::domain::{FitResult, SpecimenGeometry, TestModel};
use crate::error::{AppError, CzmError};
use crate::io::{
    append_json_line, read_history_table, read_json, read_json_lines, read_table, write_curve_csv, write_json_pretty,
};
use crate::job::{run_job, CommandRunner, JobSpec};
use crate::plot::{render_ascii_plot, render_curve_plot, Series, ELASTIC_MARKER, FRACTURE_MARKER};
use crate::report;

pub mod pipeline;

use pipeline::{AnalyticalSource, BatchManifest, CompareCase, CompareOutput};

const SIMULATED_MARKER: char = 's';
const EXPERIMENTAL_MARKER: char = 'x';

/// Entry point for the `czm` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env is fine; the solver command may come from flags.
    if let Ok(path) = dotenvy::dotenv() {
        debug!("loaded environment from '{}'", path.display());
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Analytical(args) => handle_analytical(args),
        Command::Split(args) => handle_split(args),
        Command::Fit(args) => handle_fit(args),
        Command::Evaluate(args) => handle_evaluate(args),
        Command::Compare(args) => handle_compare(args),
        Command::Batch(args) => handle_batch(args),
        Command::Deck(args) => handle_deck(args),
        Command::Job(args) => handle_job(args),
        Command::History(args) => handle_history(args),
    }
}

fn handle_analytical(args: AnalyticalArgs) -> Result<(), AppError> {
    let geometry = load_geometry(&args.specimen)?;
    let curve = analytical::solve(&geometry)?;

    let stem = if geometry.name.is_empty() { "analytical" } else { geometry.name.as_str() };
    let out = args.out.unwrap_or_else(|| PathBuf::from(format!("{stem}.csv")));
    write_curve_csv(&out, &curve)?;
    info!("wrote analytical curve to '{}'", out.display());

    if let Some(log) = &args.input_log {
        append_json_line(log, &geometry)?;
    }

    let title = format!("{} analytical curve: {stem}", geometry.test_type.display_name());
    println!("{}", report::format_curve_summary(&title, &curve));
    if show_plot(&args.plot) {
        println!("{}", render_curve_plot(&curve, &[], args.plot.width, args.plot.height));
    }
    Ok(())
}

fn load_geometry(source: &SpecimenSource) -> Result<SpecimenGeometry, AppError> {
    match (&source.geometry, &source.test_model) {
        (Some(path), _) => Ok(read_json::<SpecimenGeometry>(path)?),
        (None, Some(path)) => Ok(read_json::<TestModel>(path)?.to_geometry()),
        (None, None) => Err(AppError::new(2, "either --geometry or --test-model is required")),
    }
}

fn handle_split(args: SplitArgs) -> Result<(), AppError> {
    let table = if args.history {
        read_history_table(&args.input)?.table
    } else {
        read_table(&args.input)?
    };
    let disp = args.disp_col.resolve(&table)?;
    let load = args.load_col.resolve(&table)?;

    let split = split_at_max(&table, disp, load)?;
    info!("peak load at row {}", split.peak_row);
    let curve = split.into_curve();

    let out = args.out.unwrap_or_else(|| sibling_with_suffix(&args.input, "_Split.csv"));
    write_curve_csv(&out, &curve)?;
    info!("wrote split curve to '{}'", out.display());

    println!("{}", report::format_curve_summary(&format!("split: {}", args.input.display()), &curve));
    if show_plot(&args.plot) {
        println!("{}", render_curve_plot(&curve, &[], args.plot.width, args.plot.height));
    }
    Ok(())
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let table = read_table(&args.input)?;
    let (x, y) = resolve_pair(&table, &args.x_col, &args.y_col)?;
    let param_count = args.params.unwrap_or_else(|| args.form.param_count());

    let result = crate::fit::fit(&table, x, y, args.form, param_count, args.metric)?;
    let label = format!("{} vs {}", table.headers()[y], table.headers()[x]);
    println!("{}", report::format_fit_summary(&label, &result));

    if let Some(out) = &args.out {
        write_json_pretty(out, &result)?;
        info!("wrote fit result to '{}'", out.display());
    }
    Ok(())
}

fn handle_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let model: FitResult = read_json(&args.fit)?;
    let table = read_table(&args.input)?;
    let (x, y) = resolve_pair(&table, &args.x_col, &args.y_col)?;

    let (col_min, col_max) = table
        .column_range(x)?
        .ok_or_else(|| CzmError::EmptyInput(format!("column '{}' has no values", table.headers()[x])))?;
    let x_min = args.x_min.unwrap_or(col_min);
    let x_max = args.x_max.unwrap_or(col_max);

    let quality = crate::fit::evaluate(&table, x, y, x_min, x_max, model.form, &model.params, args.metric)?;
    println!(
        "{} fit on {} over ({x_min:.4}, {x_max:.4}): {}",
        model.form.display_name(),
        args.input.display(),
        report::fmt_quality(&quality)
    );
    Ok(())
}

fn handle_compare(args: CompareArgs) -> Result<(), AppError> {
    let analytical = match (args.analytical, args.geometry, args.test_model) {
        (Some(path), _, _) => AnalyticalSource::Curve(path),
        (None, Some(path), _) => AnalyticalSource::Geometry(path),
        (None, None, Some(path)) => AnalyticalSource::TestModel(path),
        (None, None, None) => {
            return Err(AppError::new(
                2,
                "an analytical reference is required: --analytical, --geometry or --test-model",
            ));
        }
    };
    let case = CompareCase {
        name: args.name,
        analytical,
        simulated: args.simulated,
        experimental: args.experimental,
        elastic_form: args.elastic_form,
        fracture_form: args.fracture_form,
    };

    let output = pipeline::run_compare(&case)?;
    append_json_line(&args.log, &output.record)?;
    info!("appended '{}' to '{}'", output.record.name, args.log.display());

    print_compare_output(&output);
    if show_plot(&args.plot) {
        println!("{}", comparison_plot(&output, &args.plot));
    }
    Ok(())
}

fn print_compare_output(output: &CompareOutput) {
    println!("{}", report::format_fit_summary("elastic", &output.elastic_fit));
    println!("{}", report::format_fit_summary("fracture", &output.fracture_fit));
    println!("{}", report::format_comparison(&output.record));
}

fn comparison_plot(output: &CompareOutput, plot: &PlotOptions) -> String {
    let mut series = vec![
        Series {
            points: &output.analytical.elastic,
            marker: ELASTIC_MARKER,
        },
        Series {
            points: &output.analytical.fracture,
            marker: FRACTURE_MARKER,
        },
    ];
    for (curve, marker) in [(&output.simulated, SIMULATED_MARKER), (&output.experimental, EXPERIMENTAL_MARKER)] {
        if let Some(curve) = curve {
            series.push(Series { points: &curve.elastic, marker });
            series.push(Series { points: &curve.fracture, marker });
        }
    }
    render_ascii_plot(
        &series,
        &[&output.elastic_fit, &output.fracture_fit],
        plot.width,
        plot.height,
    )
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let manifest: BatchManifest = read_json(&args.manifest)?;
    let base = args.manifest.parent().unwrap_or(Path::new(".")).to_path_buf();
    info!("running {} case(s) from '{}'", manifest.cases.len(), args.manifest.display());

    let results = match args.jobs {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| AppError::new(2, format!("failed to build worker pool: {e}")))?
            .install(|| pipeline::run_batch(&manifest, &base)),
        None => pipeline::run_batch(&manifest, &base),
    };

    // Log writes happen here, in manifest order.
    let summary = record_batch(results, &args.log)?;
    for report in &summary.reports {
        println!("{report}");
    }
    for (name, e) in &summary.failures {
        eprintln!("{name}: {e}");
    }

    let failed = summary.failures.len();
    match summary.failures.into_iter().next() {
        None => Ok(()),
        Some((_, e)) => Err(AppError::new(
            e.exit_code(),
            format!("{failed} of {} case(s) failed; first error: {e}", manifest.cases.len()),
        )),
    }
}

/// What a batch left behind: one report per logged record, one entry per
/// failed case.
struct BatchSummary {
    reports: Vec<String>,
    failures: Vec<(String, CzmError)>,
}

fn record_batch(results: Vec<(String, Result<CompareOutput, CzmError>)>, log: &Path) -> Result<BatchSummary, AppError> {
    let mut summary = BatchSummary {
        reports: Vec::new(),
        failures: Vec::new(),
    };
    for (name, result) in results {
        match result {
            Ok(output) => {
                append_json_line(log, &output.record)?;
                summary.reports.push(report::format_comparison(&output.record));
            }
            Err(e) => summary.failures.push((name, e)),
        }
    }
    Ok(summary)
}

fn handle_deck(args: DeckArgs) -> Result<(), AppError> {
    let values: [f64; 6] = args.props.as_slice().try_into().map_err(|_| {
        AppError::new(2, format!("--props takes 6 values, got {}", args.props.len()))
    })?;
    let out = args.out.as_deref().unwrap_or(&args.input);

    let rewrite = rewrite_deck_file(&args.input, out, &CohesiveProps::from(values))?;
    println!(
        "Redefined {} cohesive element set(s): {}",
        rewrite.elsets.len(),
        rewrite.elsets.join(", ")
    );
    Ok(())
}

fn handle_job(args: JobArgs) -> Result<(), AppError> {
    let mut runner = match &args.solver_cmd {
        Some(cmd) => CommandRunner::from_command_line(cmd)?,
        None => CommandRunner::from_env()?,
    };
    let spec = JobSpec {
        name: args.name.clone(),
        work_dir: args.work_dir.clone(),
        deck: args.deck.clone(),
        result_file: args.result_file.clone(),
    };

    let outcome = run_job(&mut runner, spec)?;
    if !outcome.result_exists {
        return Err(CzmError::Job(format!(
            "{} finished without writing '{}'",
            outcome.id,
            outcome.result_path.display()
        ))
        .into());
    }

    let history = read_history_table(&outcome.result_path)?;
    let disp = args.disp_col.resolve(&history.table)?;
    let load = args.load_col.resolve(&history.table)?;
    let curve = split_at_max(&history.table, disp, load)?.into_curve();

    let out = args
        .out
        .unwrap_or_else(|| args.work_dir.join(format!("{}_Split.csv", args.name)));
    write_curve_csv(&out, &curve)?;
    info!("wrote split curve to '{}'", out.display());

    println!("{}", report::format_curve_summary(&format!("job {}", args.name), &curve));
    Ok(())
}

fn handle_history(args: HistoryArgs) -> Result<(), AppError> {
    let mut entries = read_json_lines(&args.log)?;
    if let Some(filter) = &args.name {
        entries.retain(|e| {
            e.get("name")
                .and_then(|v| v.as_str())
                .is_some_and(|n| n.contains(filter.as_str()))
        });
    }
    print!("{}", report::format_history(&entries));
    Ok(())
}

fn resolve_pair(table: &Table, x: &ColumnRef, y: &ColumnRef) -> Result<(usize, usize), AppError> {
    Ok((x.resolve(table)?, y.resolve(table)?))
}

fn show_plot(plot: &PlotOptions) -> bool {
    !plot.no_plot
}

/// `dir/stem.csv` -> `dir/stem<suffix>`.
fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}

//! External FE solver jobs.
//!
//! A submitted job is represented by an explicit `JobHandle` value that the
//! caller keeps and passes back to `wait`; runners hold no name lookup.
//! `CommandRunner` launches a configured command in the job's work
//! directory and blocks until it exits.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{CzmError, Result};

/// Environment variable holding the solver command line.
pub const SOLVER_CMD_ENV: &str = "CZM_SOLVER_CMD";

/// Result file the solver's history extraction writes into the work dir.
pub const DEFAULT_RESULT_FILE: &str = "Results_Raw.csv";

/// Argument placeholders substituted when launching a job.
const DECK_PLACEHOLDER: &str = "{deck}";
const NAME_PLACEHOLDER: &str = "{name}";

/// What to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub name: String,
    pub work_dir: PathBuf,
    pub deck: PathBuf,
    /// Result file name, relative to `work_dir`.
    #[serde(default = "default_result_file")]
    pub result_file: String,
}

fn default_result_file() -> String {
    DEFAULT_RESULT_FILE.to_string()
}

impl JobSpec {
    pub fn new(name: impl Into<String>, work_dir: impl Into<PathBuf>, deck: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            work_dir: work_dir.into(),
            deck: deck.into(),
            result_file: default_result_file(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Handle to a submitted job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobHandle {
    pub id: JobId,
    pub name: String,
    pub work_dir: PathBuf,
    pub deck: PathBuf,
    pub result_path: PathBuf,
}

/// Completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub id: JobId,
    pub result_path: PathBuf,
    /// Whether the solver produced the expected result file.
    pub result_exists: bool,
}

pub trait JobRunner {
    fn submit(&mut self, spec: JobSpec) -> Result<JobHandle>;
    fn wait(&mut self, handle: &JobHandle) -> Result<JobOutcome>;
}

/// Submit `spec` and block until it finishes.
pub fn run_job<R: JobRunner + ?Sized>(runner: &mut R, spec: JobSpec) -> Result<JobOutcome> {
    let handle = runner.submit(spec)?;
    runner.wait(&handle)
}

/// Runs jobs as child processes of a fixed command.
///
/// Arguments may contain `{deck}` and `{name}`; if none mentions the deck,
/// the deck path is appended.
#[derive(Debug)]
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    next_id: u64,
    running: HashMap<JobId, Child>,
}

impl CommandRunner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            next_id: 1,
            running: HashMap::new(),
        }
    }

    /// Parse a whitespace-separated command line.
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| CzmError::InvalidArgument("empty solver command".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    /// Command line from `CZM_SOLVER_CMD` (process environment or `.env`).
    pub fn from_env() -> Result<Self> {
        let command = dotenvy::var(SOLVER_CMD_ENV).map_err(|_| {
            CzmError::InvalidArgument(format!("no solver command given and {SOLVER_CMD_ENV} is not set"))
        })?;
        Self::from_command_line(&command)
    }

    fn command_args(&self, name: &str, deck: &Path) -> Vec<String> {
        let deck = deck.display().to_string();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(DECK_PLACEHOLDER, &deck).replace(NAME_PLACEHOLDER, name))
            .collect();
        if !self.args.iter().any(|a| a.contains(DECK_PLACEHOLDER)) {
            args.push(deck);
        }
        args
    }
}

impl JobRunner for CommandRunner {
    fn submit(&mut self, spec: JobSpec) -> Result<JobHandle> {
        if !spec.work_dir.is_dir() {
            return Err(CzmError::Job(format!(
                "work directory '{}' does not exist",
                spec.work_dir.display()
            )));
        }

        let id = JobId(self.next_id);
        self.next_id += 1;

        let args = self.command_args(&spec.name, &spec.deck);
        debug!("{id}: {} {}", self.program, args.join(" "));
        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(&spec.work_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CzmError::Job(format!("failed to launch '{}': {e}", self.program)))?;
        self.running.insert(id, child);
        info!("{id} ({}) submitted in '{}'", spec.name, spec.work_dir.display());

        Ok(JobHandle {
            id,
            result_path: spec.work_dir.join(&spec.result_file),
            name: spec.name,
            work_dir: spec.work_dir,
            deck: spec.deck,
        })
    }

    fn wait(&mut self, handle: &JobHandle) -> Result<JobOutcome> {
        let child = self
            .running
            .remove(&handle.id)
            .ok_or_else(|| CzmError::Job(format!("{} is not running under this runner", handle.id)))?;

        let output = child
            .wait_with_output()
            .map_err(|e| CzmError::Job(format!("{}: {e}", handle.id)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CzmError::Job(format!(
                "{} ({}) failed with {}: {}",
                handle.id,
                handle.name,
                output.status,
                stderr.trim()
            )));
        }

        let result_exists = handle.result_path.is_file();
        info!(
            "{} ({}) finished; result {}",
            handle.id,
            handle.name,
            if result_exists { "present" } else { "missing" }
        );
        Ok(JobOutcome {
            id: handle.id,
            result_path: handle.result_path.clone(),
            result_exists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandRunner {
        CommandRunner::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn successful_job_reports_its_result_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = shell("echo 'RF,U' > Results_Raw.csv");

        let outcome = run_job(&mut runner, JobSpec::new("dcb", dir.path(), "Job.inp")).unwrap();
        assert!(outcome.result_exists);
        assert_eq!(outcome.result_path, dir.path().join(DEFAULT_RESULT_FILE));
    }

    #[test]
    fn failed_exit_status_is_a_job_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = shell("echo boom >&2; exit 3");

        let err = run_job(&mut runner, JobSpec::new("dcb", dir.path(), "Job.inp")).unwrap_err();
        assert!(matches!(&err, CzmError::Job(msg) if msg.contains("boom")));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn handles_are_distinct_and_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = shell("true");

        let a = runner.submit(JobSpec::new("a", dir.path(), "a.inp")).unwrap();
        let b = runner.submit(JobSpec::new("b", dir.path(), "b.inp")).unwrap();
        assert_ne!(a.id, b.id);

        let outcome = runner.wait(&b).unwrap();
        assert!(!outcome.result_exists);
        runner.wait(&a).unwrap();
        assert!(matches!(runner.wait(&a), Err(CzmError::Job(_))));
    }

    #[test]
    fn placeholders_are_substituted() {
        let runner = CommandRunner::from_command_line("solver job={name} input={deck} cpus=4").unwrap();
        let args = runner.command_args("dcb", Path::new("Job.inp"));
        assert_eq!(args, ["job=dcb", "input=Job.inp", "cpus=4"]);

        let runner = CommandRunner::from_command_line("solver -v").unwrap();
        assert_eq!(runner.command_args("dcb", Path::new("Job.inp")), ["-v", "Job.inp"]);
    }

    #[test]
    fn missing_work_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut runner = shell("true");
        let spec = JobSpec::new("x", dir.path().join("absent"), "Job.inp");
        assert!(matches!(runner.submit(spec), Err(CzmError::Job(_))));
    }

    #[test]
    fn empty_command_line_is_invalid() {
        assert!(matches!(
            CommandRunner::from_command_line("   "),
            Err(CzmError::InvalidArgument(_))
        ));
    }
}

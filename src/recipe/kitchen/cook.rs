// src/recipe/kitchen/cook.rs

//! Cook: step-by-step execution of a build plan

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::recipe::plan::{Action, BuildPlan, Invocation, PlannedPatch, Step, StepKind};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use super::Kitchen;
use super::config::CookReport;
use super::fetch::verify_checksum;
use super::patch::apply_patches;

/// Lines of stderr echoed when a command fails
const FAILURE_TAIL_LINES: usize = 20;

/// A single cook operation
pub struct Cook<'a> {
    kitchen: &'a Kitchen,
    /// Current job count; lowered by a parallelism step
    jobs: u32,
    report: CookReport,
}

impl<'a> Cook<'a> {
    pub(super) fn new(kitchen: &'a Kitchen) -> Self {
        Self {
            kitchen,
            jobs: kitchen.config.jobs,
            report: CookReport::default(),
        }
    }

    /// Run every step in order, stopping at the first failure
    ///
    /// Nothing is rolled back on failure.
    pub(super) fn run(mut self, plan: BuildPlan) -> Result<CookReport> {
        for step in plan.into_steps() {
            info!("Running {} phase", step.kind);
            let ran = self
                .run_step(&step)
                .map_err(|e| e.in_step(step.kind))?;
            if ran {
                self.report.executed.push(step.kind);
            }
        }
        Ok(self.report)
    }

    /// Returns false when the step turned out to be a no-op
    fn run_step(&mut self, step: &Step) -> Result<bool> {
        match &step.action {
            Action::FetchAsset {
                url,
                dest,
                checksum,
            } => self.fetch_asset(url, dest, checksum.as_ref()),
            Action::Run(invocation) => {
                self.run_invocation(step.kind, invocation)?;
                Ok(true)
            }
            Action::ApplyPatches { root, patches } => {
                self.patch(root, patches)?;
                Ok(true)
            }
            Action::SetJobs(jobs) => {
                debug!("Forcing {} job(s) (was {})", jobs, self.jobs);
                self.jobs = *jobs;
                self.log_line(&format!("=== {} ===\njobs = {}", step.kind, jobs));
                Ok(true)
            }
            Action::Cleanup { root, globs } => {
                self.cleanup(root, globs)?;
                Ok(true)
            }
        }
    }

    fn fetch_asset(
        &mut self,
        url: &str,
        dest: &Path,
        checksum: Option<&Checksum>,
    ) -> Result<bool> {
        if dest.exists() {
            info!("{} already present, skipping download", dest.display());
            self.report
                .skipped
                .push(format!("{} (already present)", dest.display()));
            return Ok(false);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        info!("Fetching: {}", url);
        let bytes = self.kitchen.fetcher.fetch(url)?;

        match checksum {
            Some(expected) if self.kitchen.config.verify_assets => {
                verify_checksum(&bytes, expected)?;
                debug!("Checksum verified for {}", url);
            }
            Some(_) => {
                self.warn(format!("Checksum verification disabled for {}", url));
            }
            None => {
                self.warn(format!("No checksum declared for {}", url));
            }
        }

        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "asset".to_string());
        let partial = dest.with_file_name(format!("{}.part", file_name));
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, dest)?;

        self.log_line(&format!(
            "=== {} ===\n{} -> {} ({} bytes)",
            StepKind::FetchAsset,
            url,
            dest.display(),
            bytes.len()
        ));
        Ok(true)
    }

    fn run_invocation(&mut self, kind: StepKind, invocation: &Invocation) -> Result<()> {
        let command = invocation.command_line();
        debug!("Command: {} (in {})", command, invocation.cwd.display());

        let mut env = self.kitchen.config.env.clone();
        env.push(("MAKEFLAGS".to_string(), format!("-j{}", self.jobs)));

        let output = self.kitchen.runner.run(invocation, &env)?;
        self.log_build_output(kind, &output.stdout, &output.stderr);

        if !output.success() {
            let tail: Vec<&str> = output.stderr.lines().collect();
            let tail = &tail[tail.len().saturating_sub(FAILURE_TAIL_LINES)..];
            if !tail.is_empty() {
                warn!("{} stderr:\n{}", kind, tail.join("\n"));
            }
            return Err(Error::CommandFailed {
                step: kind,
                command,
                code: output.code,
            });
        }

        Ok(())
    }

    fn patch(&mut self, root: &Path, patches: &[PlannedPatch]) -> Result<()> {
        if patches.is_empty() {
            debug!("No patches to apply");
        }
        let written = apply_patches(root, patches)?;

        self.log_line(&format!("=== {} ===", StepKind::ApplyPatches));
        for patch in patches {
            self.log_line(&format!("applied {}", patch.name));
        }
        debug!("Patched {} file(s)", written.len());
        Ok(())
    }

    /// Remove files matching `globs` under `root`, ignoring ones already gone
    fn cleanup(&mut self, root: &Path, globs: &[String]) -> Result<()> {
        let mut removed = Vec::new();

        // The prefix is literal; only the recipe pattern is glob syntax
        let base = glob::Pattern::escape(&root.to_string_lossy());

        for pattern in globs {
            let full = Path::new(&base).join(pattern);
            let full = full.to_string_lossy();
            let paths = glob::glob(&full)
                .map_err(|e| Error::Parse(format!("invalid cleanup pattern {}: {}", pattern, e)))?;

            for entry in paths {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        debug!("Skipping unreadable cleanup candidate: {}", e);
                        continue;
                    }
                };
                if !path.is_file() {
                    continue;
                }
                match fs::remove_file(&path) {
                    Ok(()) => removed.push(path),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        self.log_line(&format!("=== {} ===", StepKind::Cleanup));
        for path in &removed {
            self.log_line(&format!("removed {}", path.display()));
        }
        info!("Removed {} file(s) from {}", removed.len(), root.display());
        Ok(())
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.report.warnings.push(message);
    }

    fn log_line(&mut self, line: &str) {
        self.report.log.push_str(line);
        self.report.log.push('\n');
    }

    /// Log build step output (stdout/stderr) with a step header
    fn log_build_output(&mut self, kind: StepKind, stdout: &str, stderr: &str) {
        self.log_line(&format!("=== {} ===", kind));
        if !stdout.is_empty() {
            self.report.log.push_str(stdout);
            self.report.log.push('\n');
        }
        if !stderr.is_empty() {
            self.report.log.push_str(stderr);
            self.report.log.push('\n');
        }
    }
}

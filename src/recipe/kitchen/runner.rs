// src/recipe/kitchen/runner.rs

//! Subprocess execution for build steps

use crate::error::{Error, Result};
use crate::recipe::plan::Invocation;
use std::process::Command;

/// Captured result of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs invocations to completion
///
/// Implementations block until the process exits. A nonzero exit is not an
/// error here; the caller decides what it means.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation, env: &[(String, String)]) -> Result<RunOutput>;
}

/// Runs invocations directly on the host, without a shell
pub struct HostRunner;

impl CommandRunner for HostRunner {
    fn run(&self, invocation: &Invocation, env: &[(String, String)]) -> Result<RunOutput> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .map_err(|e| Error::Spawn {
                command: invocation.command_line(),
                source: e,
            })?;

        Ok(RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[cfg(unix)]
    #[test]
    fn test_host_runner_captures_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let inv = Invocation {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "echo $GREETING; pwd; exit 3".to_string()],
            cwd: dir.path().to_path_buf(),
        };
        let out = HostRunner
            .run(&inv, &[("GREETING".to_string(), "hello".to_string())])
            .unwrap();

        assert_eq!(out.code, Some(3));
        assert!(!out.success());
        assert!(out.stdout.starts_with("hello\n"));
    }

    #[test]
    fn test_host_runner_spawn_failure() {
        let inv = Invocation {
            program: "definitely-not-a-program-xyz".to_string(),
            args: Vec::new(),
            cwd: PathBuf::from("."),
        };
        let err = HostRunner.run(&inv, &[]).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert_eq!(err.exit_code(), 1);
    }
}

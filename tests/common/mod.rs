// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use cookbook::recipe::kitchen::patch::split_patch;
use cookbook::recipe::kitchen::{CommandRunner, Fetcher, RunOutput};
use cookbook::recipe::{
    EnvironmentFacts, EnvironmentProbe, Invocation, ProbeError, Recipe, RuntimeQuery,
};
use cookbook::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One recorded invocation with the environment it was given
#[derive(Debug, Clone)]
pub struct Call {
    pub invocation: Invocation,
    pub env: Vec<(String, String)>,
}

impl Call {
    pub fn command_line(&self) -> String {
        self.invocation.command_line()
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Runner that records every invocation and exits 0 unless told otherwise
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<Call>>>,
    /// program name -> exit code
    failures: Arc<Mutex<HashMap<String, i32>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation whose full command line equals `command` exit with `code`
    pub fn fail(self, command: &str, code: i32) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(command.to_string(), code);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::command_line).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, invocation: &Invocation, env: &[(String, String)]) -> Result<RunOutput> {
        self.calls.lock().unwrap().push(Call {
            invocation: invocation.clone(),
            env: env.to_vec(),
        });

        let code = self
            .failures
            .lock()
            .unwrap()
            .get(&invocation.command_line())
            .copied()
            .unwrap_or(0);

        Ok(RunOutput {
            code: Some(code),
            stdout: format!("{} done", invocation.program),
            stderr: if code == 0 {
                String::new()
            } else {
                "*** [all] Error".to_string()
            },
        })
    }
}

/// Fetcher that serves a fixed body or simulates a network failure
#[derive(Clone)]
pub struct MockFetcher {
    requests: Arc<Mutex<Vec<String>>>,
    body: Vec<u8>,
    offline: bool,
}

impl MockFetcher {
    pub fn serving(body: &[u8]) -> Self {
        Self {
            requests: Arc::default(),
            body: body.to_vec(),
            offline: false,
        }
    }

    pub fn offline() -> Self {
        Self {
            requests: Arc::default(),
            body: Vec::new(),
            offline: true,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.offline {
            return Err(Error::Fetch {
                url: url.to_string(),
                message: "network is unreachable".to_string(),
            });
        }
        Ok(self.body.clone())
    }
}

/// Runtime answering fixed values
pub struct FakeQuery {
    pub version: String,
    pub prefix: PathBuf,
}

impl RuntimeQuery for FakeQuery {
    fn version(&self) -> std::result::Result<String, ProbeError> {
        Ok(self.version.clone())
    }

    fn prefix(&self) -> std::result::Result<PathBuf, ProbeError> {
        Ok(self.prefix.clone())
    }
}

/// Probe a fake runtime installed at `prefix`
pub fn probe(recipe: &Recipe, version: &str, prefix: &Path) -> EnvironmentFacts {
    let runtime = recipe.runtime.clone().unwrap_or_default();
    EnvironmentProbe::new(
        Box::new(FakeQuery {
            version: version.to_string(),
            prefix: prefix.to_path_buf(),
        }),
        runtime,
    )
    .probe()
    .unwrap()
}

/// Create an empty file, including parent directories
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}

/// Write the files a patch expects, reconstructed from its pre-image
///
/// Each file gets a header line so hunks do not start at line 1.
pub fn write_preimage(root: &Path, name: &str, diff: &str, strip: usize) {
    for file in split_patch(name, diff).unwrap() {
        let mut content = String::from("# fixture\n");
        for line in file.hunks.lines() {
            if line.starts_with("@@") || line.starts_with('\\') {
                continue;
            }
            if let Some(rest) = line.strip_prefix(' ').or_else(|| line.strip_prefix('-')) {
                content.push_str(rest);
                content.push('\n');
            }
        }

        let rel: PathBuf = Path::new(&file.old_path).iter().skip(strip).collect();
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

// src/recipe/probe.rs

//! Host environment probing
//!
//! Builds that embed a scripting runtime need to know which version is
//! installed and where its library and headers live. The probe asks the
//! runtime itself (through [`RuntimeQuery`]) for its version and prefix and
//! then inspects the filesystem under that prefix to pick a library variant.
//!
//! Variant precedence is fixed: framework bundle, then static archive, then
//! shared library. A framework install is recognized by a marker file
//! directly under the prefix; it links against that file and takes headers
//! from a sibling directory. Prefix-style installs use `lib/` and
//! `include/<short-name>`.

use crate::recipe::format::RuntimeSection;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Failures while locating or querying the host runtime
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("No runtime interpreter found in PATH (tried: {0})")]
    RuntimeNotFound(String),

    #[error("Runtime query `{command}` failed: {message}")]
    QueryFailed { command: String, message: String },

    #[error("Cannot parse runtime version from {0:?}")]
    UnparseableVersion(String),

    #[error("Ambiguous runtime query output: {0:?}")]
    Ambiguous(String),

    #[error("Runtime prefix {} does not exist", .0.display())]
    PrefixMissing(PathBuf),
}

/// Questions the probe asks the installed runtime
pub trait RuntimeQuery {
    /// Raw version output; only the first two components are used
    fn version(&self) -> Result<String, ProbeError>;

    /// Installation prefix of the runtime
    fn prefix(&self) -> Result<PathBuf, ProbeError>;
}

/// A Python interpreter found on the host PATH
#[derive(Debug, Clone)]
pub struct HostPython {
    interpreter: PathBuf,
    /// `<name>-config` helper next to the interpreter, if any
    config_tool: Option<PathBuf>,
}

impl HostPython {
    /// Find the first candidate interpreter on PATH
    pub fn locate(candidates: &[String]) -> Result<Self, ProbeError> {
        for name in candidates {
            if let Ok(interpreter) = which::which(name) {
                debug!("Found runtime interpreter {}", interpreter.display());
                let config_tool = which::which(format!("{}-config", name)).ok();
                return Ok(Self {
                    interpreter,
                    config_tool,
                });
            }
        }
        Err(ProbeError::RuntimeNotFound(candidates.join(", ")))
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    fn eval(&self, code: &str) -> Result<String, ProbeError> {
        run_query(Command::new(&self.interpreter).arg("-c").arg(code), &self.interpreter)
    }
}

impl RuntimeQuery for HostPython {
    fn version(&self) -> Result<String, ProbeError> {
        self.eval("import sys; print('%d.%d' % sys.version_info[:2])")
    }

    fn prefix(&self) -> Result<PathBuf, ProbeError> {
        if let Some(config) = &self.config_tool {
            match run_query(Command::new(config).arg("--prefix"), config) {
                Ok(prefix) => return Ok(PathBuf::from(prefix)),
                Err(e) => debug!("{}, falling back to sys.prefix", e),
            }
        }
        self.eval("import sys; print(sys.prefix)").map(PathBuf::from)
    }
}

fn run_query(cmd: &mut Command, program: &Path) -> Result<String, ProbeError> {
    let command = format!("{:?}", cmd);
    debug!("Querying runtime: {}", command);

    let output = cmd.output().map_err(|e| ProbeError::QueryFailed {
        command: command.clone(),
        message: format!("cannot run {}: {}", program.display(), e),
    })?;

    if !output.status.success() {
        return Err(ProbeError::QueryFailed {
            command,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    match lines.as_slice() {
        [line] => Ok(line.to_string()),
        [] => Err(ProbeError::QueryFailed {
            command,
            message: "no output".to_string(),
        }),
        _ => Err(ProbeError::Ambiguous(stdout.trim().to_string())),
    }
}

/// Which library variant was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryLayout {
    /// Combined library + headers bundle under the prefix
    Framework,
    /// `lib/lib<short>.a`
    Static,
    /// `lib/lib<short>` with the platform's shared-library suffix
    Dynamic,
}

impl LibraryLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Framework => "framework",
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Facts about the host runtime, computed once per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFacts {
    /// `X.Y`
    pub runtime_version: String,
    /// Canonical library short name, e.g. `python3.11`
    pub short_name: String,
    pub prefix: PathBuf,
    pub library: PathBuf,
    pub include: PathBuf,
    pub layout: LibraryLayout,
}

impl EnvironmentFacts {
    pub fn is_framework(&self) -> bool {
        self.layout == LibraryLayout::Framework
    }
}

/// Pick the library variant under `prefix`
///
/// Only the existence of fixed paths is checked, so the result does not
/// depend on directory enumeration order.
pub fn resolve_layout(
    prefix: &Path,
    short_name: &str,
    runtime: &RuntimeSection,
) -> (LibraryLayout, PathBuf, PathBuf) {
    let marker = prefix.join(&runtime.framework_marker);
    if marker.is_file() {
        return (
            LibraryLayout::Framework,
            marker,
            prefix.join(&runtime.framework_headers),
        );
    }

    let include = prefix.join("include").join(short_name);
    let static_lib = prefix.join("lib").join(format!("lib{}.a", short_name));
    if static_lib.exists() {
        return (LibraryLayout::Static, static_lib, include);
    }

    let dynamic_lib = prefix.join("lib").join(format!(
        "lib{}{}",
        short_name,
        std::env::consts::DLL_SUFFIX
    ));
    (LibraryLayout::Dynamic, dynamic_lib, include)
}

/// Normalize a version string to `X.Y`
fn major_minor(raw: &str) -> Result<String, ProbeError> {
    let raw = raw.trim();
    let raw = raw.strip_prefix("Python ").unwrap_or(raw);
    let mut parts = raw.split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor))
            if !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit()) =>
        {
            Ok(format!("{}.{}", major, minor))
        }
        _ => Err(ProbeError::UnparseableVersion(raw.to_string())),
    }
}

/// Gathers [`EnvironmentFacts`] from a runtime
pub struct EnvironmentProbe {
    query: Box<dyn RuntimeQuery>,
    runtime: RuntimeSection,
}

impl EnvironmentProbe {
    pub fn new(query: Box<dyn RuntimeQuery>, runtime: RuntimeSection) -> Self {
        Self { query, runtime }
    }

    /// Probe the interpreter found on the host PATH
    pub fn host(runtime: RuntimeSection) -> Result<Self, ProbeError> {
        let python = HostPython::locate(&runtime.interpreters)?;
        info!("Probing runtime {}", python.interpreter().display());
        Ok(Self::new(Box::new(python), runtime))
    }

    pub fn probe(&self) -> Result<EnvironmentFacts, ProbeError> {
        let runtime_version = major_minor(&self.query.version()?)?;
        let short_name = format!("{}{}", self.runtime.short_name_prefix, runtime_version);

        let prefix = self.query.prefix()?;
        if !prefix.is_dir() {
            return Err(ProbeError::PrefixMissing(prefix));
        }

        let (layout, library, include) = resolve_layout(&prefix, &short_name, &self.runtime);
        debug!(
            "Runtime {} at {} ({} layout)",
            short_name,
            prefix.display(),
            layout.as_str()
        );

        Ok(EnvironmentFacts {
            runtime_version,
            short_name,
            prefix,
            library,
            include,
            layout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixed {
        version: &'static str,
        prefix: PathBuf,
    }

    impl RuntimeQuery for Fixed {
        fn version(&self) -> Result<String, ProbeError> {
            Ok(self.version.to_string())
        }

        fn prefix(&self) -> Result<PathBuf, ProbeError> {
            Ok(self.prefix.clone())
        }
    }

    fn probe_at(prefix: &Path, version: &'static str) -> Result<EnvironmentFacts, ProbeError> {
        EnvironmentProbe::new(
            Box::new(Fixed {
                version,
                prefix: prefix.to_path_buf(),
            }),
            RuntimeSection::default(),
        )
        .probe()
    }

    #[test]
    fn test_major_minor() {
        assert_eq!(major_minor("3.11").unwrap(), "3.11");
        assert_eq!(major_minor("3.11.4\n").unwrap(), "3.11");
        assert_eq!(major_minor("Python 2.7.18").unwrap(), "2.7");
        assert!(major_minor("three").is_err());
        assert!(major_minor("3").is_err());
        assert!(major_minor("3.x").is_err());
    }

    #[test]
    fn test_dynamic_fallback() {
        let dir = TempDir::new().unwrap();
        let facts = probe_at(dir.path(), "3.11").unwrap();

        assert_eq!(facts.short_name, "python3.11");
        assert_eq!(facts.layout, LibraryLayout::Dynamic);
        assert!(!facts.is_framework());
        assert_eq!(
            facts.library,
            dir.path().join(format!("lib/libpython3.11{}", std::env::consts::DLL_SUFFIX))
        );
        assert_eq!(facts.include, dir.path().join("include/python3.11"));
    }

    #[test]
    fn test_framework_marker() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Python"), b"").unwrap();

        let facts = probe_at(dir.path(), "2.7").unwrap();
        assert!(facts.is_framework());
        assert_eq!(facts.library, dir.path().join("Python"));
        assert_eq!(facts.include, dir.path().join("Headers"));
    }

    #[test]
    fn test_missing_prefix() {
        let err = probe_at(Path::new("/nonexistent/python/prefix"), "3.11").unwrap_err();
        assert!(matches!(err, ProbeError::PrefixMissing(_)));
    }

    #[test]
    fn test_bad_version() {
        let dir = TempDir::new().unwrap();
        let err = probe_at(dir.path(), "unknown").unwrap_err();
        assert!(matches!(err, ProbeError::UnparseableVersion(_)));
    }

    #[test]
    fn test_locate_missing_interpreter() {
        let err = HostPython::locate(&["definitely-not-a-python-xyz".to_string()]).unwrap_err();
        assert!(matches!(err, ProbeError::RuntimeNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_skips_missing_candidates() {
        let candidates = ["definitely-not-a-python-xyz".to_string(), "sh".to_string()];
        let found = HostPython::locate(&candidates).unwrap();
        assert!(found.interpreter().is_absolute());
        assert_eq!(found.interpreter().file_name().unwrap(), "sh");
    }
}

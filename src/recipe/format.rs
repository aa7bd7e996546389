// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are TOML files that describe how to fetch, configure, build and
//! install one package. The format is purely declarative: conditional
//! behaviour is expressed by tying assets, scripts and configure flags to a
//! declared option flag, and host-specific values are injected through
//! `%(name)s` substitution once the environment has been probed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// A complete recipe for building a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Package metadata
    pub package: PackageSection,

    /// Source archive and alternate VCS location
    pub source: SourceSection,

    /// Declared dependencies, build-only or runtime
    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    /// Boolean switches accepted on the command line
    #[serde(default)]
    pub options: Vec<OptionDecl>,

    /// Files fetched into the source tree when an option is set
    #[serde(default)]
    pub assets: Vec<AssetSection>,

    /// Acquisition scripts bundled with the source tree, run when an option is set
    #[serde(default)]
    pub scripts: Vec<ScriptSection>,

    /// Patches applied in declaration order before configure
    #[serde(default)]
    pub patches: Vec<PatchInfo>,

    /// Scripting runtime to probe on the host (optional)
    #[serde(default)]
    pub runtime: Option<RuntimeSection>,

    /// Build-system generator invocation
    #[serde(default)]
    pub configure: ConfigureSection,

    /// Compile and install invocations
    #[serde(default)]
    pub build: BuildSection,

    /// Files removed from the prefix after install
    #[serde(default)]
    pub cleanup: CleanupSection,

    /// Post-install guidance (optional)
    #[serde(default)]
    pub caveats: Option<CaveatsSection>,

    /// Variables for substitution (optional)
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Recipe {
    /// Substitute variables in a string
    ///
    /// Replaces `%(name)s` patterns with their values from:
    /// 1. Built-in variables (`name`, `version`)
    /// 2. Caller-provided variables (prefix, probed runtime facts, ...)
    /// 3. Custom variables from the `[variables]` section
    pub fn substitute(&self, template: &str, extra: &[(&str, &str)]) -> String {
        let mut result = template.to_string();

        result = result.replace("%(version)s", &self.package.version);
        result = result.replace("%(name)s", &self.package.name);

        for (key, value) in extra {
            result = result.replace(&format!("%({})s", key), value);
        }

        for (key, value) in &self.variables {
            result = result.replace(&format!("%({})s", key), value);
        }

        result
    }

    /// Get the archive URL with variables substituted
    pub fn archive_url(&self) -> String {
        self.substitute(&self.source.archive, &[])
    }

    /// Get the archive filename from the URL
    pub fn archive_filename(&self) -> String {
        self.archive_url()
            .split('/')
            .next_back()
            .filter(|s| !s.is_empty())
            .unwrap_or("source.tar.gz")
            .to_string()
    }

    /// Dependencies needed only while building
    pub fn build_dependencies(&self) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.phase == DependencyPhase::Build)
            .collect()
    }

    /// Dependencies propagated to consumers of the installed package
    pub fn runtime_dependencies(&self) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|d| d.phase == DependencyPhase::Runtime)
            .collect()
    }

    /// Look up a declared option by its flag token
    pub fn option(&self, flag: &str) -> Option<&OptionDecl> {
        self.options.iter().find(|o| o.flag == flag)
    }
}

/// Package metadata section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    pub name: String,

    pub version: String,

    /// Short description
    #[serde(default)]
    pub summary: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,
}

/// Source location section
///
/// Fetching and extracting the source is the host package manager's job;
/// the recipe only records where it lives and how to verify it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    /// Primary source archive URL
    ///
    /// Supports `%(version)s` substitution.
    pub archive: String,

    /// Checksum for the archive (`algorithm:hex`)
    pub checksum: String,

    /// Development head in a version control system (optional)
    #[serde(default)]
    pub head: Option<HeadSource>,
}

/// Alternate VCS source location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadSource {
    pub url: String,

    /// Version control system (`git`, `svn`, ...)
    #[serde(default = "default_vcs")]
    pub vcs: String,
}

fn default_vcs() -> String {
    "git".to_string()
}

/// When a dependency is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyPhase {
    /// Needed to build, not installed alongside the package
    Build,
    /// Propagated to consumers of the installed package
    #[default]
    Runtime,
}

impl DependencyPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyPhase::Build => "build",
            DependencyPhase::Runtime => "runtime",
        }
    }
}

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,

    #[serde(default)]
    pub phase: DependencyPhase,

    /// Ecosystem that provides the dependency, when it is not a system
    /// package (e.g. `python` for a Python module)
    #[serde(default)]
    pub provider: Option<String>,
}

/// A boolean option declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDecl {
    /// Exact command-line token, e.g. `--with-java`
    pub flag: String,

    #[serde(default)]
    pub description: String,
}

/// A third-party file fetched into the source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSection {
    /// Option flag that enables this asset
    pub option: String,

    /// Download URL
    pub url: String,

    /// Destination path relative to the source tree
    pub dest: String,

    /// Expected checksum of the download (`algorithm:hex`)
    #[serde(default)]
    pub checksum: Option<String>,
}

/// An external acquisition script shipped inside the source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSection {
    /// Option flag that enables this script
    pub option: String,

    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory relative to the source tree
    #[serde(default)]
    pub workdir: Option<String>,
}

/// Information about a single patch
///
/// A patch is unified-diff text, possibly touching several files. Exactly
/// one of `diff` (inline text) or `file` (path relative to the recipe) is
/// expected; the parser loads `file` into `diff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchInfo {
    pub name: String,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub diff: Option<String>,

    /// Strip level for patch paths (default: 1)
    #[serde(default = "default_strip")]
    pub strip: u32,
}

fn default_strip() -> u32 {
    1
}

/// Scripting runtime the build links against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSection {
    /// Interpreter names to look up on PATH, in order of preference
    #[serde(default = "default_interpreters")]
    pub interpreters: Vec<String>,

    /// Prefix for the canonical short name (`python` + `3.11`)
    #[serde(default = "default_short_name_prefix")]
    pub short_name_prefix: String,

    /// File under the runtime prefix that marks a framework-style install
    #[serde(default = "default_framework_marker")]
    pub framework_marker: String,

    /// Header directory sibling to the framework marker
    #[serde(default = "default_framework_headers")]
    pub framework_headers: String,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            interpreters: default_interpreters(),
            short_name_prefix: default_short_name_prefix(),
            framework_marker: default_framework_marker(),
            framework_headers: default_framework_headers(),
        }
    }
}

fn default_interpreters() -> Vec<String> {
    vec!["python3".to_string(), "python".to_string()]
}

fn default_short_name_prefix() -> String {
    "python".to_string()
}

fn default_framework_marker() -> String {
    "Python".to_string()
}

fn default_framework_headers() -> String {
    "Headers".to_string()
}

/// Configure section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureSection {
    /// Build-system generator
    #[serde(default = "default_configure_program")]
    pub program: String,

    /// Base configuration parameters
    ///
    /// Supports `%(prefix)s` substitution.
    #[serde(default)]
    pub args: Vec<String>,

    /// Fixed structural flags appended after the base set
    #[serde(default)]
    pub flags: Vec<String>,

    /// Flags appended only when an option is set
    #[serde(default)]
    pub conditional: Vec<ConditionalFlags>,

    /// Template for the runtime library argument
    ///
    /// Supports `%(runtime_library)s`.
    #[serde(default)]
    pub library_arg: Option<String>,

    /// Template for the runtime include argument
    ///
    /// Supports `%(runtime_include)s`.
    #[serde(default)]
    pub include_arg: Option<String>,

    /// Source directory argument passed last
    #[serde(default = "default_source_arg")]
    pub source_arg: String,
}

impl Default for ConfigureSection {
    fn default() -> Self {
        Self {
            program: default_configure_program(),
            args: Vec::new(),
            flags: Vec::new(),
            conditional: Vec::new(),
            library_arg: None,
            include_arg: None,
            source_arg: default_source_arg(),
        }
    }
}

fn default_configure_program() -> String {
    "cmake".to_string()
}

fn default_source_arg() -> String {
    ".".to_string()
}

/// Configure flags gated on an option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalFlags {
    pub option: String,
    pub flags: Vec<String>,
}

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSpec {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,
}

impl InvocationSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Compile and install section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_compile")]
    pub compile: InvocationSpec,

    #[serde(default = "default_install")]
    pub install: InvocationSpec,

    /// Whether the upstream build tolerates parallel jobs
    ///
    /// When false the build is forced to a single job.
    #[serde(default = "default_parallel_safe")]
    pub parallel_safe: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            compile: default_compile(),
            install: default_install(),
            parallel_safe: default_parallel_safe(),
        }
    }
}

fn default_compile() -> InvocationSpec {
    InvocationSpec::new("make", &[])
}

fn default_install() -> InvocationSpec {
    InvocationSpec::new("make", &["install"])
}

fn default_parallel_safe() -> bool {
    true
}

/// Post-install cleanup section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupSection {
    /// Glob patterns relative to the install prefix
    #[serde(default)]
    pub globs: Vec<String>,
}

/// Post-install guidance template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaveatsSection {
    /// Supports `%(prefix)s` and `%(runtime_short_name)s`
    pub text: String,
}

/// Whether a recipe-relative path stays beneath the directory it is joined to
///
/// Absolute paths and any `..` component are rejected.
pub fn is_confined(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RECIPE: &str = r#"
[package]
name = "hello"
version = "2.12"
homepage = "https://www.gnu.org/software/hello/"

[source]
archive = "https://ftp.gnu.org/gnu/hello/hello-%(version)s.tar.gz"
checksum = "sha256:cf04af86dc085268c5f4470fbae49b18afbc221b78096aab842d934a76bad0ab"

[source.head]
url = "https://git.savannah.gnu.org/git/hello.git"

[[dependencies]]
name = "cmake"
phase = "build"

[[dependencies]]
name = "gettext"

[[dependencies]]
name = "numpy"
provider = "python"

[[options]]
flag = "--with-docs"
description = "Build documentation"

[configure]
args = ["-DCMAKE_INSTALL_PREFIX=%(prefix)s"]

[[configure.conditional]]
option = "--with-docs"
flags = ["-DBUILD_DOCS=ON"]

[variables]
flavor = "plain"
"#;

    #[test]
    fn test_parse_recipe() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();

        assert_eq!(recipe.package.name, "hello");
        assert_eq!(recipe.package.version, "2.12");
        assert!(recipe.source.archive.contains("%(version)s"));

        let head = recipe.source.head.as_ref().unwrap();
        assert_eq!(head.vcs, "git"); // default

        assert_eq!(recipe.configure.program, "cmake"); // default
        assert_eq!(recipe.configure.source_arg, ".");
        assert_eq!(recipe.configure.conditional.len(), 1);
        assert!(recipe.build.parallel_safe);
        assert_eq!(recipe.build.install, InvocationSpec::new("make", &["install"]));
        assert!(recipe.runtime.is_none());
        assert!(recipe.caveats.is_none());
    }

    #[test]
    fn test_dependency_split() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();

        let build: Vec<&str> = recipe.build_dependencies().iter().map(|d| d.name.as_str()).collect();
        let runtime: Vec<&str> = recipe.runtime_dependencies().iter().map(|d| d.name.as_str()).collect();

        assert_eq!(build, vec!["cmake"]);
        assert_eq!(runtime, vec!["gettext", "numpy"]);
        assert_eq!(recipe.dependencies[2].provider.as_deref(), Some("python"));
    }

    #[test]
    fn test_variable_substitution() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();

        assert_eq!(
            recipe.archive_url(),
            "https://ftp.gnu.org/gnu/hello/hello-2.12.tar.gz"
        );
        assert_eq!(recipe.archive_filename(), "hello-2.12.tar.gz");

        let out = recipe.substitute(
            "%(name)s %(flavor)s -> %(prefix)s",
            &[("prefix", "/opt/hello")],
        );
        assert_eq!(out, "hello plain -> /opt/hello");

        // Unknown placeholders are left alone
        assert_eq!(recipe.substitute("%(nope)s", &[]), "%(nope)s");
    }

    #[test]
    fn test_option_lookup() {
        let recipe: Recipe = toml::from_str(SAMPLE_RECIPE).unwrap();
        assert_eq!(
            recipe.option("--with-docs").map(|o| o.description.as_str()),
            Some("Build documentation")
        );
        assert!(recipe.option("--with-java").is_none());
    }

    #[test]
    fn test_is_confined() {
        assert!(is_confined("External/java_lib/junit.jar"));
        assert!(is_confined("./lib/*.cmake"));
        assert!(is_confined(""));
        assert!(!is_confined("../junit.jar"));
        assert!(!is_confined("External/../../junit.jar"));
        assert!(!is_confined("/etc/passwd"));
    }

    #[test]
    fn test_runtime_defaults() {
        let runtime = RuntimeSection::default();
        assert_eq!(runtime.interpreters, vec!["python3", "python"]);
        assert_eq!(runtime.framework_marker, "Python");
        assert_eq!(runtime.framework_headers, "Headers");
    }
}

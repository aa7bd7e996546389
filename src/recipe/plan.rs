// src/recipe/plan.rs

//! Build plan construction
//!
//! A [`BuildPlan`] is the fully resolved list of steps for one invocation.
//! It is computed from the recipe, the resolved option values and the probed
//! environment facts without touching the filesystem or running anything, so
//! the whole plan can be inspected (or printed by `cookbook plan`) before a
//! single command runs.
//!
//! Step order is fixed:
//!
//! 1. conditional asset fetches
//! 2. conditional external-source scripts
//! 3. patch application
//! 4. configure (arguments assembled here)
//! 5. parallelism constraint, when the recipe is not parallel-safe
//! 6. compile
//! 7. install
//! 8. post-install cleanup

use crate::error::{Error, Result};
use crate::hash::Checksum;
use crate::recipe::format::{InvocationSpec, Recipe, is_confined};
use crate::recipe::options::ResolvedOptions;
use crate::recipe::probe::EnvironmentFacts;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a build step, reported on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    FetchAsset,
    FetchExternal,
    ApplyPatches,
    Configure,
    Parallelism,
    Compile,
    Install,
    Cleanup,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchAsset => "fetch-asset",
            Self::FetchExternal => "fetch-external",
            Self::ApplyPatches => "patch",
            Self::Configure => "configure",
            Self::Parallelism => "parallelism",
            Self::Compile => "compile",
            Self::Install => "install",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A subprocess to run: (command, arguments, working directory)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Human-readable command line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A patch ready to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPatch {
    pub name: String,
    pub diff: String,
    pub strip: u32,
}

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Download `url` to `dest` unless `dest` already exists
    FetchAsset {
        url: String,
        dest: PathBuf,
        checksum: Option<Checksum>,
    },
    Run(Invocation),
    /// Apply patches in order against `root`
    ApplyPatches {
        root: PathBuf,
        patches: Vec<PlannedPatch>,
    },
    /// Force the job count for the remaining steps
    SetJobs(u32),
    /// Remove files matching `globs` relative to `root`
    Cleanup { root: PathBuf, globs: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub action: Action,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.action {
            Action::FetchAsset { url, dest, .. } => {
                write!(f, "{}: {} -> {}", self.kind, url, dest.display())
            }
            Action::Run(inv) => write!(
                f,
                "{}: {} (in {})",
                self.kind,
                inv.command_line(),
                inv.cwd.display()
            ),
            Action::ApplyPatches { patches, .. } => {
                let names: Vec<&str> = patches.iter().map(|p| p.name.as_str()).collect();
                if names.is_empty() {
                    write!(f, "{}: (none)", self.kind)
                } else {
                    write!(f, "{}: {}", self.kind, names.join(", "))
                }
            }
            Action::SetJobs(jobs) => write!(f, "{}: jobs = {}", self.kind, jobs),
            Action::Cleanup { root, globs } => {
                write!(f, "{}: {} under {}", self.kind, globs.join(" "), root.display())
            }
        }
    }
}

/// Ordered, resolved steps for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    steps: Vec<Step>,
    configure_args: Vec<String>,
}

impl BuildPlan {
    /// Build the plan for `recipe`
    ///
    /// Fails only if a configure template needs runtime facts and none were
    /// probed.
    pub fn new(
        recipe: &Recipe,
        options: &ResolvedOptions,
        facts: Option<&EnvironmentFacts>,
        source_dir: &Path,
        prefix: &Path,
    ) -> Result<Self> {
        let vars = template_vars(source_dir, prefix, facts);
        let vars: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let subst = |s: &str| recipe.substitute(s, &vars);

        let mut steps = Vec::new();

        for asset in recipe.assets.iter().filter(|a| options.is_set(&a.option)) {
            let checksum = asset
                .checksum
                .as_deref()
                .map(Checksum::parse)
                .transpose()
                .map_err(|e| Error::Parse(format!("checksum for {}: {}", asset.url, e)))?;
            steps.push(Step {
                kind: StepKind::FetchAsset,
                action: Action::FetchAsset {
                    url: subst(&asset.url),
                    dest: source_dir.join(confined("asset destination", subst(&asset.dest))?),
                    checksum,
                },
            });
        }

        for script in recipe.scripts.iter().filter(|s| options.is_set(&s.option)) {
            let cwd = match &script.workdir {
                Some(dir) => source_dir.join(confined("script workdir", subst(dir))?),
                None => source_dir.to_path_buf(),
            };
            steps.push(Step {
                kind: StepKind::FetchExternal,
                action: Action::Run(Invocation {
                    program: subst(&script.program),
                    args: script.args.iter().map(|a| subst(a)).collect(),
                    cwd,
                }),
            });
        }

        let mut patches = Vec::with_capacity(recipe.patches.len());
        for patch in &recipe.patches {
            let diff = patch.diff.clone().ok_or_else(|| {
                Error::Parse(format!("patch {} has not been loaded", patch.name))
            })?;
            patches.push(PlannedPatch {
                name: patch.name.clone(),
                diff,
                strip: patch.strip,
            });
        }
        steps.push(Step {
            kind: StepKind::ApplyPatches,
            action: Action::ApplyPatches {
                root: source_dir.to_path_buf(),
                patches,
            },
        });

        let configure_args = configure_args(recipe, options, facts, &subst)?;
        let mut args = configure_args.clone();
        args.push(subst(&recipe.configure.source_arg));
        steps.push(Step {
            kind: StepKind::Configure,
            action: Action::Run(Invocation {
                program: subst(&recipe.configure.program),
                args,
                cwd: source_dir.to_path_buf(),
            }),
        });

        if !recipe.build.parallel_safe {
            steps.push(Step {
                kind: StepKind::Parallelism,
                action: Action::SetJobs(1),
            });
        }

        let invocation = |spec: &InvocationSpec| Invocation {
            program: subst(&spec.program),
            args: spec.args.iter().map(|a| subst(a)).collect(),
            cwd: source_dir.to_path_buf(),
        };
        steps.push(Step {
            kind: StepKind::Compile,
            action: Action::Run(invocation(&recipe.build.compile)),
        });
        steps.push(Step {
            kind: StepKind::Install,
            action: Action::Run(invocation(&recipe.build.install)),
        });

        steps.push(Step {
            kind: StepKind::Cleanup,
            action: Action::Cleanup {
                root: prefix.to_path_buf(),
                globs: recipe
                    .cleanup
                    .globs
                    .iter()
                    .map(|g| confined("cleanup pattern", subst(g)))
                    .collect::<Result<_>>()?,
            },
        });

        Ok(Self {
            steps,
            configure_args,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|s| s.kind).collect()
    }

    /// Configure arguments, without the trailing source argument
    pub fn configure_args(&self) -> &[String] {
        &self.configure_args
    }

    /// Number of steps that reach the network
    pub fn fetch_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.kind, StepKind::FetchAsset | StepKind::FetchExternal))
            .count()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {}", i + 1, step)?;
        }
        Ok(())
    }
}

/// Reject a substituted path that would leave its root directory
fn confined(what: &str, path: String) -> Result<String> {
    if is_confined(&path) {
        Ok(path)
    } else {
        Err(Error::Parse(format!(
            "{} {} must be relative and stay inside its directory",
            what, path
        )))
    }
}

/// Substitution variables derived from configuration and probed facts
pub fn template_vars(
    source_dir: &Path,
    prefix: &Path,
    facts: Option<&EnvironmentFacts>,
) -> Vec<(&'static str, String)> {
    let mut vars = vec![
        ("prefix", prefix.display().to_string()),
        ("source_dir", source_dir.display().to_string()),
    ];
    if let Some(facts) = facts {
        vars.push(("runtime_version", facts.runtime_version.clone()));
        vars.push(("runtime_short_name", facts.short_name.clone()));
        vars.push(("runtime_library", facts.library.display().to_string()));
        vars.push(("runtime_include", facts.include.display().to_string()));
    }
    vars
}

/// Assemble configure arguments
///
/// Base parameters, then fixed structural flags, then flags for each set
/// option in declaration order, then the runtime library/include pair.
fn configure_args(
    recipe: &Recipe,
    options: &ResolvedOptions,
    facts: Option<&EnvironmentFacts>,
    subst: &dyn Fn(&str) -> String,
) -> Result<Vec<String>> {
    let configure = &recipe.configure;
    let mut args: Vec<String> = configure.args.iter().map(|a| subst(a)).collect();
    args.extend(configure.flags.iter().map(|f| subst(f)));

    for conditional in &configure.conditional {
        if options.is_set(&conditional.option) {
            for flag in &conditional.flags {
                let flag = subst(flag);
                if !args.contains(&flag) {
                    args.push(flag);
                }
            }
        }
    }

    for template in [&configure.library_arg, &configure.include_arg]
        .into_iter()
        .flatten()
    {
        if facts.is_none() {
            return Err(Error::Parse(format!(
                "configure argument {} needs probed runtime facts but the recipe has no [runtime] section",
                template
            )));
        }
        args.push(subst(template));
    }

    Ok(args)
}

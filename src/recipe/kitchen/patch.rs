// src/recipe/kitchen/patch.rs

//! Unified-diff application
//!
//! A recipe patch may touch several files. It is split into per-file
//! sections, every section is applied in memory, and only when all of them
//! succeed are the results written back. A patch therefore either applies
//! completely or leaves the tree untouched.
//!
//! When a section fails to apply but its reverse applies cleanly, the
//! change is already present; if that holds for every section the patch is
//! reported as already applied instead of as a conflict.

use crate::recipe::plan::PlannedPatch;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const DEV_NULL: &str = "/dev/null";

/// Patch parsing and application errors
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Patch {patch} is malformed: {message}")]
    Malformed { patch: String, message: String },

    #[error("Patch {patch} targets {} which does not exist", .path.display())]
    MissingTarget { patch: String, path: PathBuf },

    #[error("Patch {patch} does not apply to {file}: {message}")]
    DoesNotApply {
        patch: String,
        file: String,
        message: String,
    },

    #[error("Patch {patch} is already applied")]
    AlreadyApplied { patch: String },

    #[error("Patch {patch}: cannot write {}: {source}", .path.display())]
    Write {
        patch: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One file's section of a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    /// Hunk headers and lines, with blank context lines normalized to " "
    pub hunks: String,
}

impl FileDiff {
    pub fn creates(&self) -> bool {
        self.old_path == DEV_NULL
    }

    pub fn deletes(&self) -> bool {
        self.new_path == DEV_NULL
    }

    /// Path the section applies to, relative to the tree root
    fn target(&self, strip: u32) -> Option<PathBuf> {
        let path = if self.deletes() {
            &self.old_path
        } else {
            &self.new_path
        };
        strip_path(path, strip)
    }

    /// Re-emit the section as a standalone single-file diff
    fn to_unified(&self) -> String {
        format!("--- a\n+++ b\n{}", self.hunks)
    }
}

/// Remove `strip` leading components; `None` if nothing usable remains
fn strip_path(path: &str, strip: u32) -> Option<PathBuf> {
    let stripped: PathBuf = Path::new(path)
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .skip(strip as usize)
        .collect();

    let escapes = stripped
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if stripped.as_os_str().is_empty() || escapes {
        None
    } else {
        Some(stripped)
    }
}

/// File name from a `---`/`+++` header, without any trailing timestamp
fn header_path(header: &str) -> String {
    let name = header.split('\t').next().unwrap_or(header);
    let name = name.split("  ").next().unwrap_or(name);
    name.trim().to_string()
}

/// Old and new line counts from `@@ -a,b +c,d @@`
fn hunk_counts(line: &str) -> Option<(usize, usize)> {
    let mut ranges = line.strip_prefix("@@ ")?.split_whitespace();
    let old = ranges.next()?.strip_prefix('-')?;
    let new = ranges.next()?.strip_prefix('+')?;

    let count = |range: &str| -> Option<usize> {
        match range.split_once(',') {
            Some((_, n)) => n.parse().ok(),
            None => range.parse::<usize>().ok().map(|_| 1),
        }
    };
    Some((count(old)?, count(new)?))
}

/// Split a possibly multi-file unified diff into per-file sections
///
/// Lines outside file sections (`diff --git`, `index ...`, prose) are
/// ignored.
pub fn split_patch(name: &str, text: &str) -> Result<Vec<FileDiff>, PatchError> {
    let malformed = |message: String| PatchError::Malformed {
        patch: name.to_string(),
        message,
    };

    let mut files = Vec::new();
    let mut current: Option<FileDiff> = None;
    let (mut old_left, mut new_left) = (0usize, 0usize);
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if old_left > 0 || new_left > 0 {
            let Some(section) = current.as_mut() else {
                return Err(malformed("hunk outside a file section".to_string()));
            };
            let line = if line.is_empty() { " " } else { line };
            match line.as_bytes()[0] {
                b' ' => {
                    old_left = old_left.saturating_sub(1);
                    new_left = new_left.saturating_sub(1);
                }
                b'-' => old_left = old_left.saturating_sub(1),
                b'+' => new_left = new_left.saturating_sub(1),
                b'\\' => {}
                _ => return Err(malformed(format!("unexpected line in hunk: {:?}", line))),
            }
            section.hunks.push_str(line);
            section.hunks.push('\n');
            continue;
        }

        if let Some(old) = line.strip_prefix("--- ") {
            let new = lines
                .next()
                .and_then(|l| l.strip_prefix("+++ "))
                .ok_or_else(|| malformed(format!("missing +++ header after {:?}", line)))?;
            if let Some(done) = current.take() {
                files.push(done);
            }
            current = Some(FileDiff {
                old_path: header_path(old),
                new_path: header_path(new),
                hunks: String::new(),
            });
        } else if line.starts_with("@@") {
            let section = current
                .as_mut()
                .ok_or_else(|| malformed("hunk before any file header".to_string()))?;
            let (old, new) =
                hunk_counts(line).ok_or_else(|| malformed(format!("bad hunk header {:?}", line)))?;
            old_left = old;
            new_left = new;
            section.hunks.push_str(line);
            section.hunks.push('\n');
        } else if line.starts_with('\\') {
            // "\ No newline at end of file" trailing the last hunk line
            if let Some(section) = current.as_mut() {
                section.hunks.push_str(line);
                section.hunks.push('\n');
            }
        }
    }

    if old_left > 0 || new_left > 0 {
        return Err(malformed("truncated hunk".to_string()));
    }
    if let Some(done) = current.take() {
        files.push(done);
    }
    if files.is_empty() {
        return Err(malformed("no file sections".to_string()));
    }
    if let Some(empty) = files.iter().find(|f| f.hunks.is_empty()) {
        return Err(malformed(format!("no hunks for {}", empty.new_path)));
    }

    Ok(files)
}

/// Apply one patch against `root`, all-or-nothing
///
/// Returns the files that were written.
pub fn apply_patch(root: &Path, patch: &PlannedPatch) -> Result<Vec<PathBuf>, PatchError> {
    let files = split_patch(&patch.name, &patch.diff)?;

    let mut updates: Vec<(PathBuf, Option<String>)> = Vec::with_capacity(files.len());
    let mut failure: Option<(String, String)> = None;
    let mut all_reversible = true;

    for file in &files {
        let rel = file.target(patch.strip).ok_or_else(|| PatchError::Malformed {
            patch: patch.name.clone(),
            message: format!(
                "cannot strip {} components from {}",
                patch.strip, file.new_path
            ),
        })?;
        let path = root.join(&rel);

        let original = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound && file.creates() => String::new(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PatchError::MissingTarget {
                    patch: patch.name.clone(),
                    path,
                });
            }
            Err(e) => {
                return Err(PatchError::DoesNotApply {
                    patch: patch.name.clone(),
                    file: rel.display().to_string(),
                    message: e.to_string(),
                });
            }
        };

        let unified = file.to_unified();
        let parsed = diffy::Patch::from_str(&unified).map_err(|e| PatchError::Malformed {
            patch: patch.name.clone(),
            message: format!("{}: {}", rel.display(), e),
        })?;

        match diffy::apply(&original, &parsed) {
            Ok(updated) => {
                debug!("Patch {} applies to {}", patch.name, rel.display());
                let content = if file.deletes() { None } else { Some(updated) };
                updates.push((path, content));
            }
            Err(e) => {
                if failure.is_none() {
                    failure = Some((rel.display().to_string(), e.to_string()));
                }
                if diffy::apply(&original, &parsed.reverse()).is_err() {
                    all_reversible = false;
                }
            }
        }
    }

    if let Some((file, message)) = failure {
        if all_reversible && updates.is_empty() {
            return Err(PatchError::AlreadyApplied {
                patch: patch.name.clone(),
            });
        }
        return Err(PatchError::DoesNotApply {
            patch: patch.name.clone(),
            file,
            message,
        });
    }

    let write_err = |path: &Path, source: io::Error| PatchError::Write {
        patch: patch.name.clone(),
        path: path.to_path_buf(),
        source,
    };

    let mut written = Vec::with_capacity(updates.len());
    for (path, content) in updates {
        match content {
            Some(text) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| write_err(&path, e))?;
                }
                fs::write(&path, text).map_err(|e| write_err(&path, e))?;
            }
            None => fs::remove_file(&path).map_err(|e| write_err(&path, e))?,
        }
        written.push(path);
    }

    Ok(written)
}

/// Apply patches in order, stopping at the first failure
pub fn apply_patches(root: &Path, patches: &[PlannedPatch]) -> Result<Vec<PathBuf>, PatchError> {
    let mut written = Vec::new();
    for patch in patches {
        info!("Applying patch: {}", patch.name);
        written.extend(apply_patch(root, patch)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO_FILES: &str = "\
diff --git a/one.txt b/one.txt
--- a/one.txt\t2012-10-19 23:47:44.000000000 -0700
+++ b/one.txt\t2012-10-21 23:35:13.000000000 -0700
@@ -1,3 +1,4 @@
 alpha

+inserted
 gamma
--- a/sub/two.txt  2012-06-29 22:27:14.000000000 -0700
+++ b/sub/two.txt
@@ -1,2 +1,2 @@
-old line
+new line
 tail
";

    fn planned(name: &str, diff: &str) -> PlannedPatch {
        PlannedPatch {
            name: name.to_string(),
            diff: diff.to_string(),
            strip: 1,
        }
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("one.txt"), "alpha\n\ngamma\n").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/two.txt"), "old line\ntail\n").unwrap();
        dir
    }

    #[test]
    fn test_split_patch() {
        let files = split_patch("p", TWO_FILES).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].new_path, "b/one.txt");
        assert_eq!(files[1].old_path, "a/sub/two.txt");
        // Blank context line normalized
        assert!(files[0].hunks.contains("\n \n+inserted\n"));
    }

    #[test]
    fn test_split_patch_errors() {
        assert!(matches!(
            split_patch("p", "just some text\n"),
            Err(PatchError::Malformed { .. })
        ));
        let truncated = "--- a/x\n+++ b/x\n@@ -1,3 +1,3 @@\n a\n";
        assert!(matches!(
            split_patch("p", truncated),
            Err(PatchError::Malformed { .. })
        ));
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("a/b/c.txt", 1), Some(PathBuf::from("b/c.txt")));
        assert_eq!(strip_path("c.txt", 0), Some(PathBuf::from("c.txt")));
        assert_eq!(strip_path("a/c.txt", 2), None);
        assert_eq!(strip_path("a/../../etc/passwd", 1), None);
    }

    #[test]
    fn test_header_path() {
        assert_eq!(header_path("a/CMakeLists.txt  2012-10-19 23:47:44"), "a/CMakeLists.txt");
        assert_eq!(header_path("b/CMakeLists.txt\t2012-10-21"), "b/CMakeLists.txt");
        assert_eq!(header_path("b/plain.txt"), "b/plain.txt");
    }

    #[test]
    fn test_apply_multi_file() {
        let dir = tree();
        let written = apply_patch(dir.path(), &planned("p", TWO_FILES)).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("one.txt")).unwrap(),
            "alpha\n\ninserted\ngamma\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("sub/two.txt")).unwrap(),
            "new line\ntail\n"
        );
    }

    #[test]
    fn test_already_applied() {
        let dir = tree();
        apply_patch(dir.path(), &planned("p", TWO_FILES)).unwrap();
        let err = apply_patch(dir.path(), &planned("p", TWO_FILES)).unwrap_err();
        assert!(matches!(err, PatchError::AlreadyApplied { .. }));
    }

    #[test]
    fn test_all_or_nothing() {
        let dir = tree();
        fs::write(dir.path().join("sub/two.txt"), "something else\ntail\n").unwrap();

        let err = apply_patch(dir.path(), &planned("p", TWO_FILES)).unwrap_err();
        assert!(matches!(err, PatchError::DoesNotApply { ref file, .. } if file == "sub/two.txt"));
        // First file untouched even though its section applied
        assert_eq!(
            fs::read_to_string(dir.path().join("one.txt")).unwrap(),
            "alpha\n\ngamma\n"
        );
    }

    #[test]
    fn test_missing_target() {
        let dir = TempDir::new().unwrap();
        let err = apply_patch(dir.path(), &planned("p", TWO_FILES)).unwrap_err();
        assert!(matches!(err, PatchError::MissingTarget { .. }));
    }

    #[test]
    fn test_create_file() {
        let dir = TempDir::new().unwrap();
        let diff = "--- /dev/null\n+++ b/new/file.txt\n@@ -0,0 +1,2 @@\n+hello\n+world\n";
        apply_patch(dir.path(), &planned("create", diff)).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("new/file.txt")).unwrap(),
            "hello\nworld\n"
        );
    }

    #[test]
    fn test_apply_patches_stops_at_first_failure() {
        let dir = tree();
        let bad = "--- a/one.txt\n+++ b/one.txt\n@@ -1,1 +1,1 @@\n-nope\n+yes\n";
        let err = apply_patches(
            dir.path(),
            &[planned("bad", bad), planned("good", TWO_FILES)],
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::DoesNotApply { ref patch, .. } if patch == "bad"));
        assert_eq!(
            fs::read_to_string(dir.path().join("sub/two.txt")).unwrap(),
            "old line\ntail\n"
        );
    }
}

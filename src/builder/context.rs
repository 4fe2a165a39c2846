//! Build context archiving
//!
//! The Docker Engine API takes the build context as a tar stream. Only the
//! `.dockerignore` at the context root is read, and its patterns are matched
//! from that root the way the Docker CLI matches them.

use super::BuildError;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the ignore file honoured at the root of build contexts
pub const DOCKERIGNORE: &str = ".dockerignore";

/// Tar `root` on a blocking thread
pub async fn archive_context(root: &Path, dockerfile: &str) -> Result<Vec<u8>, BuildError> {
    let root = root.to_path_buf();
    let dockerfile = dockerfile.to_string();

    tokio::task::spawn_blocking(move || archive_dir(&root, &dockerfile))
        .await
        .map_err(|e| BuildError::Task(e.to_string()))?
}

/// Matcher for `<root>/.dockerignore` with every pattern anchored at `root`.
///
/// A missing file matches nothing.
pub fn load_dockerignore(root: &Path) -> io::Result<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);

    let content = match fs::read_to_string(root.join(DOCKERIGNORE)) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    for line in content.lines() {
        if let Some(pattern) = anchor_pattern(line) {
            builder
                .add_line(None, &pattern)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        }
    }

    builder
        .build()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Rewrite a `.dockerignore` line as a root-anchored gitignore pattern
fn anchor_pattern(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (negated, pattern) = match line.strip_prefix('!') {
        Some(rest) => (true, rest.trim()),
        None => (false, line),
    };
    let pattern = pattern.trim_start_matches("./").trim_start_matches('/');
    if pattern.is_empty() {
        return None;
    }

    Some(format!("{}/{}", if negated { "!" } else { "" }, pattern))
}

/// Tar the contents of `root`, skipping paths matched by its `.dockerignore`.
///
/// The Dockerfile and the ignore file itself are always included, since the
/// daemon needs them even when a pattern excludes them.
pub fn archive_dir(root: &Path, dockerfile: &str) -> Result<Vec<u8>, BuildError> {
    let context_err = |source: io::Error| BuildError::Context {
        path: root.to_path_buf(),
        source,
    };

    if !root.is_dir() {
        return Err(context_err(io::Error::new(
            io::ErrorKind::NotFound,
            "build context is not a directory",
        )));
    }

    let dockerignore = load_dockerignore(root).map_err(context_err)?;

    let mut archive = tar::Builder::new(Vec::new());
    archive.follow_symlinks(false);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut always_included: Vec<PathBuf> =
        vec![PathBuf::from(DOCKERIGNORE), PathBuf::from(dockerfile)];
    let mut entries = 0usize;

    for entry in walker {
        let entry = entry.map_err(|e| context_err(io::Error::new(io::ErrorKind::Other, e.to_string())))?;
        let path = entry.path();
        let relative = match path.strip_prefix(root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            _ => continue,
        };

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if dockerignore
            .matched_path_or_any_parents(&relative, is_dir)
            .is_ignore()
        {
            continue;
        }

        if is_dir {
            archive.append_dir(&relative, path).map_err(context_err)?;
        } else {
            archive
                .append_path_with_name(path, &relative)
                .map_err(context_err)?;
        }
        always_included.retain(|p| p != &relative);
        entries += 1;
    }

    for relative in always_included {
        let path = root.join(&relative);
        if path.is_file() {
            archive
                .append_path_with_name(&path, &relative)
                .map_err(context_err)?;
            entries += 1;
        }
    }

    let bytes = archive.into_inner().map_err(context_err)?;
    debug!(
        context = %root.display(),
        entries,
        bytes = bytes.len(),
        "Archived build context"
    );
    Ok(bytes)
}

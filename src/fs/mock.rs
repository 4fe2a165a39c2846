use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

/// In-memory file tree rooted at `/mock` by default.
///
/// Relative paths given to `add_file` and to the `FileSystem` methods are
/// resolved against the root, so tests can write `compose.yml` and read it
/// back with either form.
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, Option<String>>>,
    root: PathBuf,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("/mock"))
    }

    pub fn with_root(root: PathBuf) -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: &str) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_parents(&mut files, parent);
        }
        files.insert(path, Some(content.to_string()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = self.normalize_path(path.as_ref());
        let mut files = self.files.write().unwrap();
        Self::ensure_parents(&mut files, &path);
    }

    fn normalize_path(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                other => normalized.push(other),
            }
        }
        normalized
    }

    fn ensure_parents(files: &mut HashMap<PathBuf, Option<String>>, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            files.entry(current.clone()).or_insert(None);
        }
    }
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        self.files.read().unwrap().contains_key(&path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.normalize_path(path);
        matches!(self.files.read().unwrap().get(&path), Some(Some(_)))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = self.normalize_path(path);
        let files = self.files.read().unwrap();
        match files.get(&path) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(anyhow!("Not a file: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file() {
        let fs = MockFileSystem::new();
        fs.add_file("docker-compose.yml", "services: {}");

        assert!(fs.exists(Path::new("/mock/docker-compose.yml")));
        assert!(fs.is_file(Path::new("docker-compose.yml")));
    }

    #[test]
    fn test_parent_directories_created() {
        let fs = MockFileSystem::new();
        fs.add_file("deploy/compose/app.yml", "services: {}");

        assert!(fs.exists(Path::new("/mock/deploy")));
        assert!(fs.exists(Path::new("/mock/deploy/compose")));
        assert!(!fs.is_file(Path::new("/mock/deploy")));
    }

    #[test]
    fn test_dot_segments_are_normalized() {
        let fs = MockFileSystem::new();
        fs.add_file("a/compose.yml", "x");

        assert_eq!(
            fs.read_to_string(Path::new("./a/../a/compose.yml")).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_read_directory_fails() {
        let fs = MockFileSystem::new();
        fs.add_dir("api");

        let err = fs.read_to_string(Path::new("api")).unwrap_err();
        assert!(err.to_string().contains("Not a file"));
    }

    #[test]
    fn test_with_root() {
        let fs = MockFileSystem::with_root(PathBuf::from("/repo"));
        fs.add_file("compose.yaml", "services: {}");

        assert_eq!(fs.root(), Path::new("/repo"));
        assert!(fs.exists(Path::new("/repo/compose.yaml")));
    }
}

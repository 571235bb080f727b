use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ignore::WalkBuilder;
use tracing::{debug, warn};

/// Source files of one project tree
pub trait FileIndex {
    /// Invokes `handler` for every Java source file, in a stable order
    fn walk(&self, handler: &mut dyn FnMut(&Path));

    /// Source file declaring the given fully qualified type name
    fn find_by_qualified_name(&self, qualified_name: &str) -> Option<PathBuf>;
}

/// Filesystem-backed index rooted at a project directory
pub struct SourceTree {
    root: PathBuf,
    by_qualified_name: OnceLock<HashMap<String, PathBuf>>,
}

impl SourceTree {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            by_qualified_name: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn source_files(&self) -> Vec<PathBuf> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().map_or(false, |ext| ext == "java") {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => warn!("Skipping unreadable entry under {}: {}", self.root.display(), e),
            }
        }
        files
    }

    fn index(&self) -> &HashMap<String, PathBuf> {
        self.by_qualified_name.get_or_init(|| {
            let mut index = HashMap::new();
            for file in self.source_files() {
                if let Some(qualified_name) = qualified_name_for(&self.root, &file) {
                    index.entry(qualified_name).or_insert(file);
                }
            }
            debug!("Indexed {} source files under {}", index.len(), self.root.display());
            index
        })
    }
}

impl FileIndex for SourceTree {
    fn walk(&self, handler: &mut dyn FnMut(&Path)) {
        for file in self.source_files() {
            handler(&file);
        }
    }

    fn find_by_qualified_name(&self, qualified_name: &str) -> Option<PathBuf> {
        self.index().get(qualified_name).cloned()
    }
}

const SOURCE_ROOTS: [&str; 2] = ["/src/main/java/", "/src/test/java/"];

/// Qualified type name implied by a file's location
///
/// Files under a Maven-style `src/main/java` or `src/test/java` directory are
/// named relative to that directory, anything else relative to the root.
pub fn qualified_name_for(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let relative: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    let relative = relative.join("/");

    let stem = relative.strip_suffix(".java")?;
    let stem = SOURCE_ROOTS
        .iter()
        .filter_map(|marker| {
            if let Some(rest) = stem.strip_prefix(&marker[1..]) {
                return Some((0, rest));
            }
            stem.rfind(marker).map(|at| (at, &stem[at + marker.len()..]))
        })
        .max_by_key(|(at, _)| *at)
        .map(|(_, rest)| rest)
        .unwrap_or(stem);

    Some(stem.replace('/', "."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;

    #[test]
    fn names_follow_the_maven_source_roots() {
        let root = Path::new("/work/project");
        assert_eq!(
            qualified_name_for(root, Path::new("/work/project/module/src/main/java/garden/Plant.java")).as_deref(),
            Some("garden.Plant")
        );
        assert_eq!(
            qualified_name_for(root, Path::new("/work/project/src/test/java/garden/steps/GardenSteps.java")).as_deref(),
            Some("garden.steps.GardenSteps")
        );
        assert_eq!(
            qualified_name_for(root, Path::new("/work/project/pkg/Person.java")).as_deref(),
            Some("pkg.Person")
        );
        assert_eq!(qualified_name_for(root, Path::new("/work/project/README.md")), None);
    }

    #[test]
    fn walks_java_files_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        temp.child("b/Second.java").write_str("class Second {}").unwrap();
        temp.child("a/First.java").write_str("class First {}").unwrap();
        temp.child("a/notes.txt").write_str("not java").unwrap();

        let tree = SourceTree::new(temp.path());
        let mut seen = Vec::new();
        tree.walk(&mut |path| seen.push(path.file_name().unwrap().to_string_lossy().into_owned()));

        assert_eq!(seen, vec!["First.java", "Second.java"]);
    }

    #[test]
    fn finds_files_by_qualified_name() {
        let temp = TempDir::new().unwrap();
        temp.child("src/main/java/garden/Gardener.java").write_str("package garden; class Gardener {}").unwrap();

        let tree = SourceTree::new(temp.path());
        let found = tree.find_by_qualified_name("garden.Gardener").unwrap();
        assert!(found.ends_with("src/main/java/garden/Gardener.java"));
        assert!(tree.find_by_qualified_name("garden.Missing").is_none());
    }
}

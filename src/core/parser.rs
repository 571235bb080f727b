use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info};

use super::file_index::{FileIndex, SourceTree};
use super::languages::JavaParser;
use super::options::LanguageLevel;
use super::symbols::{Origin, SymbolResolver, TypeTable, PLATFORM_SOURCES};
use super::syntax::CompilationUnit;
use crate::error::Result;

/// Parsing and symbol state for one analysis run
///
/// Holds the language level and class path explicitly instead of relying on
/// any process-wide parser configuration.
pub struct ParserContext {
    /// Language level the sources are resolved against
    level: LanguageLevel,

    /// Dependency source trees, resolved but reported as non-local
    library_roots: Vec<PathBuf>,

    parser: JavaParser,

    /// Parse results by path; `None` marks a file that could not be read or parsed
    units: HashMap<PathBuf, Option<Arc<CompilationUnit>>>,

    types: TypeTable,
}

impl ParserContext {
    pub fn new(level: LanguageLevel, library_roots: Vec<PathBuf>) -> Result<Self> {
        let mut parser = JavaParser::new()?;
        let mut types = TypeTable::new();

        for (label, source) in PLATFORM_SOURCES {
            let unit = Arc::new(parser.parse(source, Path::new(label))?);
            types.register_unit(&unit, Origin::Platform);
        }
        debug!("Registered {} platform types", types.len());

        Ok(Self {
            level,
            library_roots,
            parser,
            units: HashMap::new(),
            types,
        })
    }

    pub fn level(&self) -> LanguageLevel {
        self.level
    }

    /// Parses every project source and every library root into the type table
    ///
    /// Returns the number of project types registered.
    pub fn index(&mut self, file_index: &dyn FileIndex) -> usize {
        let mut registered = 0;
        for file in collect_files(file_index) {
            if let Some(unit) = self.parse(&file) {
                registered += self.types.register_unit(&unit, Origin::Project);
            }
        }

        for root in self.library_roots.clone() {
            let library = SourceTree::new(&root);
            let mut library_types = 0;
            for file in collect_files(&library) {
                if let Some(unit) = self.parse(&file) {
                    library_types += self.types.register_unit(&unit, Origin::Library);
                }
            }
            debug!("Registered {} library types from {}", library_types, root.display());
        }

        info!("📚 Indexed {} project types ({} types on the class path)", registered, self.types.len());
        registered
    }

    /// Parses a file once; later calls return the cached unit
    pub fn parse(&mut self, path: &Path) -> Option<Arc<CompilationUnit>> {
        if let Some(cached) = self.units.get(path) {
            return cached.clone();
        }

        let unit = match std::fs::read_to_string(path) {
            Ok(content) => match self.parser.parse(&content, path) {
                Ok(unit) => Some(Arc::new(unit)),
                Err(e) => {
                    error!("Skipping {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                error!("Skipping unreadable source {}: {}", path.display(), e);
                None
            }
        };

        self.units.insert(path.to_path_buf(), unit.clone());
        unit
    }

    /// Previously parsed unit for a path
    pub fn unit(&self, path: &Path) -> Option<Arc<CompilationUnit>> {
        self.units.get(path).cloned().flatten()
    }

    /// Unit declaring a type, via the file index first and the type table second
    pub fn find_by_qualified_name(
        &self,
        qualified_name: &str,
        file_index: &dyn FileIndex,
    ) -> Option<Arc<CompilationUnit>> {
        file_index
            .find_by_qualified_name(qualified_name)
            .and_then(|path| self.unit(&path))
            .or_else(|| self.types.get(qualified_name).map(|handle| handle.unit.clone()))
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn symbols(&self) -> SymbolResolver<'_> {
        SymbolResolver::new(&self.types, self.level)
    }
}

fn collect_files(file_index: &dyn FileIndex) -> Vec<PathBuf> {
    let mut files = Vec::new();
    file_index.walk(&mut |path| files.push(path.to_path_buf()));
    files
}

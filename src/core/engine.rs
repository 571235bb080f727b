// src/core/engine.rs
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info};

use super::call_graph::{AnalysisReport, EntryPointDetector, InvocationCollector, InvocationResolver, StepStrategies};
use super::file_index::FileIndex;
use super::options::AnalyzeOptions;
use super::parser::ParserContext;
use super::patterns::Patterns;
use super::reporters::Reporter;
use super::symbols::{Origin, TypeHandle};
use crate::error::Result;

/// Orchestrates one analysis run: indexing, entry point detection, call
/// tree resolution and finally reporting
pub struct Engine {
    options: AnalyzeOptions,
    patterns: Patterns,
    strategies: StepStrategies,
    file_index: Box<dyn FileIndex>,
    reporters: Vec<Box<dyn Reporter>>,
}

impl Engine {
    pub fn new(options: AnalyzeOptions, file_index: Box<dyn FileIndex>, reporters: Vec<Box<dyn Reporter>>) -> Result<Self> {
        let patterns = Patterns::new(&options)?;
        debug!("Analysis options: {:?}", options);

        Ok(Self {
            options,
            patterns,
            strategies: StepStrategies::default(),
            file_index,
            reporters,
        })
    }

    /// Replaces the default English and Dutch step keyword strategies
    pub fn with_strategies(mut self, strategies: StepStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Traverses the project and builds the report without publishing it
    pub fn analyze(&self) -> Result<AnalysisReport> {
        info!(
            "🔍 Analyzing {} {} at {} ({})",
            self.options.project_name,
            self.options.version,
            self.options.root.display(),
            self.options.language_level
        );

        let mut context = ParserContext::new(self.options.language_level, self.options.library_roots.clone())?;
        context.index(self.file_index.as_ref());

        let mut files: Vec<PathBuf> = Vec::new();
        self.file_index.walk(&mut |path| files.push(path.to_path_buf()));

        let detector = EntryPointDetector::new(&self.patterns, &self.strategies);
        let collector = InvocationCollector::new(self.options.project_name.clone(), self.options.version.clone());
        let mut resolver = InvocationResolver::new(&context, self.file_index.as_ref(), &self.patterns, collector);

        for file in &files {
            // Unreadable files were already reported while indexing
            let Some(unit) = context.unit(file) else {
                continue;
            };

            for decl in &unit.types {
                if !self.options.accepts_type(&decl.name) {
                    debug!("Skipping {} (filtered)", decl.name);
                    continue;
                }

                info!("Analyse type \"{}\" for entry points", decl.name);
                let ty = TypeHandle {
                    unit: unit.clone(),
                    decl: decl.clone(),
                    enclosing: Vec::new(),
                    origin: Origin::Project,
                };
                detector.detect(&ty, &mut resolver);
            }
        }

        let report = resolver.into_report();
        info!("✅ Found {} entry points in {} files", report.root_invocations.len(), files.len());
        Ok(report)
    }

    /// Analyzes the project and hands the report to every reporter in order
    ///
    /// A failing reporter is logged and does not stop the ones after it.
    pub async fn run(&self) -> Result<AnalysisReport> {
        let started = Instant::now();
        let report = self.analyze()?;

        for reporter in &self.reporters {
            debug!("Running {} reporter", reporter.name());
            if let Err(e) = reporter.report(&report).await {
                error!("❌ {} reporter failed: {}", reporter.name(), e);
            }
        }

        info!("🎉 Analysis complete in {:.2?}", started.elapsed());
        Ok(report)
    }
}

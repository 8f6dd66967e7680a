//! Core analyzer for orchestrating a no-mock analysis pass.

use crate::config::Config;
use crate::engine::{Cancellation, RuleEngine};
use crate::frontend::{ExternalTypes, FrontEnd, FrontEndError, SkippedFile, SourceFile};
use crate::registry::{RegistryError, SignatureRegistry};
use crate::types::AnalysisResult;

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error walking the source tree.
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    /// Error parsing a source file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Signature table error.
    #[error("Signature registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Front-end failure.
    #[error("Front end error: {0}")]
    FrontEnd(#[from] FrontEndError),

    /// Worker pool could not be created.
    #[error("Failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    config: Option<Config>,
    registry: Option<SignatureRegistry>,
    front_ends: Vec<Box<dyn FrontEnd>>,
    exclude_patterns: Vec<String>,
    fail_on_parse_error: Option<bool>,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses this registry instead of the one described by the configuration.
    #[must_use]
    pub fn registry(mut self, registry: SignatureRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Adds a language front end.
    #[must_use]
    pub fn front_end<F: FrontEnd + 'static>(mut self, front_end: F) -> Self {
        self.front_ends.push(Box::new(front_end));
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets whether to fail on parse errors (default: from configuration).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = Some(fail);
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory is unavailable, an exclude
    /// pattern or signature row is invalid, or the worker pool cannot start.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();

        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let registry = match self.registry {
            Some(registry) => registry,
            None => config.build_registry()?,
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let excludes = exclude_patterns
            .iter()
            .map(String::as_str)
            .map(glob::Pattern::new)
            .collect::<Result<Vec<_>, _>>()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.analyzer.parallelism.unwrap_or(0))
            .build()?;

        Ok(Analyzer {
            root,
            registry,
            front_ends: self.front_ends,
            exclude_patterns,
            excludes,
            fail_on_parse_error: self
                .fail_on_parse_error
                .unwrap_or(config.analyzer.fail_on_parse_error),
            config,
            pool,
        })
    }
}

/// The main analyzer: discovers sources, runs front ends, evaluates every
/// candidate site.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    config: Config,
    registry: SignatureRegistry,
    front_ends: Vec<Box<dyn FrontEnd>>,
    exclude_patterns: Vec<String>,
    excludes: Vec<glob::Pattern>,
    fail_on_parse_error: bool,
    pool: rayon::ThreadPool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the effective signature registry.
    #[must_use]
    pub fn registry(&self) -> &SignatureRegistry {
        &self.registry
    }

    /// Analyzes all files under the root.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery fails, a file cannot be read, or
    /// a file fails to parse while `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<AnalysisResult, AnalyzerError> {
        self.analyze_with(&Cancellation::new())
    }

    /// Like [`analyze`](Self::analyze), observing a cancellation flag
    /// between nodes.
    ///
    /// # Errors
    ///
    /// See [`analyze`](Self::analyze).
    pub fn analyze_with(&self, cancel: &Cancellation) -> Result<AnalysisResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files()?;
        info!("Found {} files to analyze", files.len());

        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            debug!("Reading: {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let relative = path
                .strip_prefix(self.base_dir())
                .map_or_else(|_| path.clone(), Path::to_path_buf);
            sources.push(SourceFile::new(relative, content));
        }

        self.run(sources, cancel)
    }

    /// Analyzes in-memory sources, skipping discovery.
    ///
    /// # Errors
    ///
    /// Returns an error if a front end fails, or a file fails to parse while
    /// `fail_on_parse_error` is set.
    pub fn analyze_sources(&self, sources: Vec<SourceFile>) -> Result<AnalysisResult, AnalyzerError> {
        self.run(sources, &Cancellation::new())
    }

    fn run(
        &self,
        sources: Vec<SourceFile>,
        cancel: &Cancellation,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let externals = ExternalTypes::from_registry(&self.registry, &self.config.marker);
        let mut buckets: Vec<Vec<SourceFile>> = self.front_ends.iter().map(|_| Vec::new()).collect();

        for source in sources {
            match self.front_end_index(&source.path) {
                Some(index) => buckets[index].push(source),
                None => debug!("No front end for {}", source.path.display()),
            }
        }

        let mut result = AnalysisResult::new();
        for (front_end, sources) in self.front_ends.iter().zip(buckets) {
            if sources.is_empty() {
                continue;
            }
            debug!(
                "Compiling {} {} file(s)",
                sources.len(),
                front_end.language_id()
            );

            let compilation = self
                .pool
                .install(|| front_end.compile(&sources, &externals))?;
            for skipped in &compilation.skipped {
                warn!("Failed to parse {}: {}", skipped.path.display(), skipped.reason);
                self.check_parse_policy(skipped)?;
            }
            for recovered in &compilation.recovered {
                warn!(
                    "Syntax error in {} ({}); analyzing the rest of the file",
                    recovered.path.display(),
                    recovered.reason
                );
                self.check_parse_policy(recovered)?;
            }

            let engine = RuleEngine::new(&self.registry, &compilation.types, &self.config.marker);
            let diagnostics = self
                .pool
                .install(|| engine.check_all_parallel(&compilation.candidates, cancel));

            result.diagnostics.extend(diagnostics);
            result.files_checked += sources.len().saturating_sub(compilation.skipped.len());
            result.nodes_evaluated += compilation.candidates.len();
        }

        result.sort();

        if cancel.is_cancelled() {
            info!("Analysis cancelled; results are partial");
        }
        info!(
            "Analysis complete: {} diagnostics in {} files ({} sites)",
            result.diagnostics.len(),
            result.files_checked,
            result.nodes_evaluated
        );

        Ok(result)
    }

    fn check_parse_policy(&self, file: &SkippedFile) -> Result<(), AnalyzerError> {
        if self.fail_on_parse_error {
            return Err(AnalyzerError::Parse {
                path: file.path.clone(),
                message: file.reason.clone(),
            });
        }
        Ok(())
    }

    /// Directory that reported paths are relative to: the root itself, or
    /// its parent when the root is a single file.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        if self.root.is_file() {
            self.root.parent().unwrap_or(&self.root)
        } else {
            &self.root
        }
    }

    fn front_end_index(&self, path: &Path) -> Option<usize> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))?;
        self.front_ends
            .iter()
            .position(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Discovers all source files some front end handles.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(self.config.analyzer.respect_gitignore);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || self.front_end_index(path).is_none() {
                continue;
            }

            let relative = path.strip_prefix(self.base_dir()).unwrap_or(path);
            if self.should_exclude(relative) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path (relative to the root) should be excluded.
    fn should_exclude(&self, path: &Path) -> bool {
        if self.excludes.iter().any(|pattern| pattern.matches_path(path)) {
            return true;
        }

        // Directory patterns like "**/bin/**" also match at the root.
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude_patterns.iter().any(|pattern| {
            let clean = pattern.replace("**/", "").replace("/**", "");
            !clean.is_empty()
                && !clean.contains('*')
                && path_str
                    .split('/')
                    .any(|component| component == clean)
        })
    }
}

//! The C# [`FrontEnd`]: parse every file, then bind names across all of them.

use crate::binder::Binder;
use crate::extractor::CSharpExtractor;
use crate::syntax::FileSyntax;
use donotmock_core::{
    Compilation, ExternalTypes, FrontEnd, FrontEndError, SkippedFile, SourceFile,
};
use rayon::prelude::*;
use tracing::debug;

/// C# front end backed by tree-sitter.
///
/// All files handed to one [`FrontEnd::compile`] call form a single
/// compilation: partial types merge, and a type declared in one file is
/// visible from every other.
#[derive(Default)]
pub struct CSharpFrontEnd {
    extractor: CSharpExtractor,
}

impl CSharpFrontEnd {
    /// Creates the front end.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrontEnd for CSharpFrontEnd {
    fn language_id(&self) -> &'static str {
        "csharp"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".cs"]
    }

    fn compile(
        &self,
        sources: &[SourceFile],
        externals: &ExternalTypes,
    ) -> Result<Compilation, FrontEndError> {
        let parsed: Vec<Result<FileSyntax, FrontEndError>> = sources
            .par_iter()
            .map(|source| self.extractor.extract(&source.path, &source.content))
            .collect();

        let mut compilation = Compilation::default();
        let mut files: Vec<FileSyntax> = Vec::with_capacity(parsed.len());
        for file in parsed {
            match file {
                Ok(file) => {
                    if let Some(reason) = &file.error {
                        compilation.recovered.push(SkippedFile {
                            path: file.path.clone(),
                            reason: reason.clone(),
                        });
                    }
                    files.push(file);
                }
                Err(FrontEndError::Parse { path, message }) => {
                    compilation.skipped.push(SkippedFile {
                        path,
                        reason: message,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let binder = Binder::new(&files, externals);
        for file in &files {
            for entry in binder.type_entries(file) {
                compilation.types.insert(entry);
            }
            for site in &file.sites {
                compilation.candidates.push(binder.candidate(file, site));
            }
        }

        debug!(
            files = files.len(),
            skipped = compilation.skipped.len(),
            recovered = compilation.recovered.len(),
            types = compilation.types.len(),
            candidates = compilation.candidates.len(),
            "Compiled C# sources"
        );
        Ok(compilation)
    }
}

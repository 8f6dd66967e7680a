//! # donotmock-core
//!
//! Rule engine that forbids creating mocks of types marked as not mockable.
//!
//! A type opts out of mocking by carrying a marker (by default
//! `DoNotMock.DoNotMockAttribute`), directly or on any ancestor. This crate
//! provides the language-independent parts:
//!
//! - [`SignatureRegistry`]: table of mocking-library construction shapes
//! - [`HierarchyResolver`]: breadth-first marker search over a [`TypeHierarchy`]
//! - [`emit`]: turns a found marker into a `DNMK001` [`Diagnostic`]
//! - [`RuleEngine`]: per-node orchestration of the three
//! - [`Analyzer`]: file discovery, [`FrontEnd`] dispatch and parallel evaluation
//!
//! ## Example
//!
//! ```ignore
//! use donotmock_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./tests")
//!     .front_end(CSharpFrontEnd::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! result.print_report();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod emitter;
mod engine;
mod frontend;
mod hierarchy;
mod model;
mod registry;
mod resolver;
mod types;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{AnalyzerConfig, Config, ConfigError, RegistryConfig, SignatureConfig};
pub use emitter::{emit, MESSAGE_PROPERTY, RULE_ID, RULE_NAME};
pub use engine::{Cancellation, Evaluation, RuleEngine};
pub use frontend::{
    Compilation, ExternalTypes, FrontEnd, FrontEndError, SkippedFile, SourceFile,
};
pub use hierarchy::{TypeEntry, TypeHierarchy, TypeTable};
pub use model::{
    Annotation, AnnotationArg, CandidateNode, MarkerSpec, NodeCategory, TypeArgument, TypeKind,
    TypeRef,
};
pub use registry::{
    ConstructionSignature, MatchOutcome, RegistryBuilder, RegistryError, SignatureKey,
    SignatureMatch, SignatureRegistry, SubjectRule, MOCK_ARITY,
};
pub use resolver::{HierarchyResolver, MarkerHit};
pub use types::{AnalysisResult, Diagnostic, DiagnosticReport, Location, Severity, Suggestion};

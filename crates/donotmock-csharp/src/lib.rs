//! # donotmock-csharp
//!
//! Tree-sitter based C# front end for `donotmock-core`.
//!
//! Parses C# sources into per-file syntax (namespaces, `using` directives,
//! type declarations with their base lists and attributes, and
//! `new T<...>()` / `T.M<...>()` sites), then binds names across the whole
//! compilation so the rule engine sees fully qualified types:
//!
//! - [`CSharpExtractor`] for single-file extraction
//! - [`CSharpFrontEnd`] implementing [`donotmock_core::FrontEnd`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod binder;
pub mod extractor;
pub mod frontend;
mod names;
pub mod syntax;

pub use extractor::CSharpExtractor;
pub use frontend::CSharpFrontEnd;

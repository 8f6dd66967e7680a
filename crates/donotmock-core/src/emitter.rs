//! Turns a found marker into a structured diagnostic.

use crate::model::{Annotation, TypeRef};
use crate::types::{Diagnostic, Location, Severity, Suggestion};

/// Stable rule identifier.
pub const RULE_ID: &str = "DNMK001";

/// Rule name.
pub const RULE_NAME: &str = "do-not-mock";

/// Property key carrying the remediation message.
pub const MESSAGE_PROPERTY: &str = "Message";

/// Builds the diagnostic for a mock of `subject` at `location`.
///
/// The message names `subject`, the type requested at the call site, even
/// when `annotation` was declared on one of its ancestors. The remediation
/// text is exposed both as the `Message` property and as the suggestion; both
/// are omitted when the marker carries no non-empty message.
#[must_use]
pub fn emit(location: Location, subject: &TypeRef, annotation: &Annotation) -> Diagnostic {
    let diagnostic = Diagnostic::new(
        RULE_ID,
        RULE_NAME,
        Severity::Error,
        location,
        format!("'{subject}' must not be mocked"),
    );

    match annotation.message() {
        Some(message) => diagnostic
            .with_property(MESSAGE_PROPERTY, message)
            .with_suggestion(Suggestion::new(message)),
        None => diagnostic,
    }
}

//! Per-node rule orchestration.
//!
//! Each candidate node goes through signature matching, the hierarchy walk
//! and, on a hit, diagnostic synthesis. Nodes are independent: the engine
//! holds only shared read-only references, so batches may be evaluated in any
//! order or in parallel.

use crate::emitter;
use crate::hierarchy::TypeHierarchy;
use crate::model::{CandidateNode, MarkerSpec};
use crate::registry::{MatchOutcome, SignatureRegistry};
use crate::resolver::HierarchyResolver;
use crate::types::Diagnostic;

use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace, warn};

/// Outcome of evaluating one candidate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Not a registered mock-construction shape.
    NonMatch,
    /// Registered shape with the wrong number of type arguments.
    ArityMismatch {
        /// Arity the signature requires.
        expected: usize,
        /// Arity found at the site.
        found: usize,
    },
    /// The host could not resolve a symbol the match depends on.
    Unresolved(String),
    /// A mock of a type whose ancestry carries no marker.
    NoMarkerFound,
    /// A mock of a marked type.
    MarkerFound(Diagnostic),
}

impl Evaluation {
    /// The diagnostic, if the node is a violation.
    #[must_use]
    pub fn into_diagnostic(self) -> Option<Diagnostic> {
        match self {
            Self::MarkerFound(diagnostic) => Some(diagnostic),
            Self::NonMatch
            | Self::ArityMismatch { .. }
            | Self::Unresolved(_)
            | Self::NoMarkerFound => None,
        }
    }
}

/// Cooperative cancellation flag, observed between nodes.
#[derive(Debug, Default)]
pub struct Cancellation {
    cancelled: AtomicBool,
}

impl Cancellation {
    /// Creates a flag that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; nodes already being evaluated finish.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Stateless evaluator for the no-mock rule.
pub struct RuleEngine<'a, H: ?Sized> {
    registry: &'a SignatureRegistry,
    hierarchy: &'a H,
    marker: &'a MarkerSpec,
}

impl<'a, H: TypeHierarchy + ?Sized> RuleEngine<'a, H> {
    /// Wires the registry and hierarchy provider for one analysis pass.
    #[must_use]
    pub fn new(registry: &'a SignatureRegistry, hierarchy: &'a H, marker: &'a MarkerSpec) -> Self {
        Self {
            registry,
            hierarchy,
            marker,
        }
    }

    /// Evaluates a single node.
    #[must_use]
    pub fn evaluate(&self, node: &CandidateNode) -> Evaluation {
        let found = match self.registry.classify(node) {
            MatchOutcome::Matched(found) => found,
            MatchOutcome::NonMatch => return Evaluation::NonMatch,
            MatchOutcome::ArityMismatch { expected, found } => {
                return Evaluation::ArityMismatch { expected, found }
            }
            MatchOutcome::Unresolved(reason) => return Evaluation::Unresolved(reason),
        };

        let resolver = HierarchyResolver::new(self.hierarchy, self.marker);
        match resolver.resolve_marker(&found.subject) {
            Some(hit) => {
                debug!(
                    subject = %found.subject,
                    declared_on = %hit.declared_on,
                    library = %found.signature.library,
                    "mock of marked type"
                );
                Evaluation::MarkerFound(emitter::emit(
                    node.location.clone(),
                    &found.subject,
                    hit.annotation,
                ))
            }
            None => Evaluation::NoMarkerFound,
        }
    }

    /// Evaluates a node, isolating faults raised by the hierarchy provider.
    ///
    /// A panic while evaluating this node is logged and treated as a
    /// non-match; it never reaches other nodes.
    #[must_use]
    pub fn check(&self, node: &CandidateNode) -> Option<Diagnostic> {
        match catch_unwind(AssertUnwindSafe(|| self.evaluate(node))) {
            Ok(evaluation) => {
                if !matches!(evaluation, Evaluation::MarkerFound(_)) {
                    trace!(
                        file = %node.location.file.display(),
                        line = node.location.line,
                        outcome = ?evaluation,
                        "no diagnostic"
                    );
                }
                evaluation.into_diagnostic()
            }
            Err(_) => {
                warn!(
                    "Evaluation failed at {}:{}:{}; skipping node",
                    node.location.file.display(),
                    node.location.line,
                    node.location.column
                );
                None
            }
        }
    }

    /// Evaluates nodes in order, stopping before the next node once cancelled.
    pub fn check_all<'n, I>(&self, nodes: I, cancel: &Cancellation) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = &'n CandidateNode>,
    {
        let mut diagnostics = Vec::new();
        for node in nodes {
            if cancel.is_cancelled() {
                debug!("Cancelled; remaining nodes skipped");
                break;
            }
            diagnostics.extend(self.check(node));
        }
        diagnostics
    }

    /// Evaluates nodes on the current rayon pool.
    ///
    /// Cancellation is checked before each node starts.
    #[must_use]
    pub fn check_all_parallel(&self, nodes: &[CandidateNode], cancel: &Cancellation) -> Vec<Diagnostic> {
        nodes
            .par_iter()
            .filter(|_| !cancel.is_cancelled())
            .filter_map(|node| self.check(node))
            .collect()
    }
}

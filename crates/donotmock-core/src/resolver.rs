//! Breadth-first marker search over a type's ancestor graph.
//!
//! Order is part of the contract: the subject itself, then its base type,
//! then its interfaces in declaration order, then the same expansion for each
//! of those in queue order. Each qualified name is visited once, so diamond
//! interface graphs and cyclic provider data terminate in O(V+E).

use crate::hierarchy::TypeHierarchy;
use crate::model::{Annotation, MarkerSpec, TypeRef};
use std::collections::{HashSet, VecDeque};
use tracing::trace;

/// A marker found during a hierarchy walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerHit<'a> {
    /// The type that declares the marker (the subject or one of its ancestors).
    pub declared_on: TypeRef,
    /// The marker as declared.
    pub annotation: &'a Annotation,
}

/// Finds the first no-mock marker in a type's ancestry.
pub struct HierarchyResolver<'a, H: ?Sized> {
    hierarchy: &'a H,
    marker: &'a MarkerSpec,
}

impl<'a, H: TypeHierarchy + ?Sized> HierarchyResolver<'a, H> {
    /// Creates a resolver over a hierarchy provider.
    #[must_use]
    pub fn new(hierarchy: &'a H, marker: &'a MarkerSpec) -> Self {
        Self { hierarchy, marker }
    }

    /// Returns the first marker in canonical order, or `None` when no type in
    /// the ancestor graph (the subject included) declares one.
    #[must_use]
    pub fn resolve_marker(&self, subject: &TypeRef) -> Option<MarkerHit<'a>> {
        let hierarchy: &'a H = self.hierarchy;
        let mut queue = VecDeque::from([subject.clone()]);
        let mut visited = HashSet::from([subject.qualified_name().to_string()]);

        while let Some(current) = queue.pop_front() {
            if let Some(annotation) = hierarchy
                .annotations(&current)
                .iter()
                .find(|annotation| self.marker.matches(annotation))
            {
                trace!(subject = %subject, declared_on = %current, "marker found");
                return Some(MarkerHit {
                    declared_on: current,
                    annotation,
                });
            }

            let ancestors = hierarchy
                .base_type(&current)
                .into_iter()
                .chain(hierarchy.interfaces(&current));
            for ancestor in ancestors {
                if visited.insert(ancestor.qualified_name().to_string()) {
                    queue.push_back(ancestor.clone());
                }
            }
        }

        trace!(subject = %subject, visited = visited.len(), "no marker in hierarchy");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{TypeEntry, TypeTable};
    use std::sync::Mutex;

    fn marker(message: &str) -> Annotation {
        Annotation::new("DoNotMockAttribute", "DoNotMock").with_message(message)
    }

    fn resolve<'a>(
        table: &'a TypeTable,
        spec: &'a MarkerSpec,
        subject: &TypeRef,
    ) -> Option<MarkerHit<'a>> {
        HierarchyResolver::new(table, spec).resolve_marker(subject)
    }

    #[test]
    fn marker_on_subject() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(TypeEntry::new(TypeRef::interface("IService")).with_annotation(marker("A")));

        let hit = resolve(&table, &spec, &TypeRef::interface("IService")).unwrap();
        assert_eq!(hit.declared_on.qualified_name(), "IService");
        assert_eq!(hit.annotation.message(), Some("A"));
    }

    #[test]
    fn no_marker_anywhere() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(
                TypeEntry::new(TypeRef::class("Service"))
                    .with_base(TypeRef::class("Base"))
                    .with_interface(TypeRef::interface("IService")),
            )
            .with(TypeEntry::new(TypeRef::interface("IService")).with_annotation(
                Annotation::new("ObsoleteAttribute", "System").with_message("old"),
            ));

        assert!(resolve(&table, &spec, &TypeRef::class("Service")).is_none());
        assert!(resolve(&table, &spec, &TypeRef::class("Unknown")).is_none());
    }

    #[test]
    fn inherited_through_interface_chain() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(
                TypeEntry::new(TypeRef::interface("IService"))
                    .with_interface(TypeRef::interface("IBaseService")),
            )
            .with(
                TypeEntry::new(TypeRef::interface("IBaseService")).with_annotation(marker("X")),
            );

        let hit = resolve(&table, &spec, &TypeRef::interface("IService")).unwrap();
        assert_eq!(hit.declared_on.qualified_name(), "IBaseService");
        assert_eq!(hit.annotation.message(), Some("X"));
    }

    #[test]
    fn base_type_wins_over_interface() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(
                TypeEntry::new(TypeRef::class("Service"))
                    .with_base(TypeRef::class("ServiceBase"))
                    .with_interface(TypeRef::interface("IService")),
            )
            .with(TypeEntry::new(TypeRef::interface("IService")).with_annotation(marker("iface")))
            .with(TypeEntry::new(TypeRef::class("ServiceBase")).with_annotation(marker("base")));

        let hit = resolve(&table, &spec, &TypeRef::class("Service")).unwrap();
        assert_eq!(hit.annotation.message(), Some("base"));
    }

    #[test]
    fn subject_wins_over_ancestors() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(
                TypeEntry::new(TypeRef::class("Service"))
                    .with_base(TypeRef::class("ServiceBase"))
                    .with_annotation(marker("self")),
            )
            .with(TypeEntry::new(TypeRef::class("ServiceBase")).with_annotation(marker("base")));

        let hit = resolve(&table, &spec, &TypeRef::class("Service")).unwrap();
        assert_eq!(hit.annotation.message(), Some("self"));
    }

    #[test]
    fn breadth_first_prefers_shallower_interface() {
        // Service -> Base -> IDeep(marked "deep")
        // Service -> IShallow(marked "shallow")
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(
                TypeEntry::new(TypeRef::class("Service"))
                    .with_base(TypeRef::class("Base"))
                    .with_interface(TypeRef::interface("IShallow")),
            )
            .with(TypeEntry::new(TypeRef::class("Base")).with_interface(TypeRef::interface("IDeep")))
            .with(TypeEntry::new(TypeRef::interface("IDeep")).with_annotation(marker("deep")))
            .with(
                TypeEntry::new(TypeRef::interface("IShallow")).with_annotation(marker("shallow")),
            );

        let hit = resolve(&table, &spec, &TypeRef::class("Service")).unwrap();
        assert_eq!(hit.annotation.message(), Some("shallow"));
    }

    #[test]
    fn interfaces_checked_in_declaration_order() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(
                TypeEntry::new(TypeRef::class("Service"))
                    .with_interface(TypeRef::interface("IFirst"))
                    .with_interface(TypeRef::interface("ISecond")),
            )
            .with(TypeEntry::new(TypeRef::interface("ISecond")).with_annotation(marker("second")))
            .with(TypeEntry::new(TypeRef::interface("IFirst")).with_annotation(marker("first")));

        let hit = resolve(&table, &spec, &TypeRef::class("Service")).unwrap();
        assert_eq!(hit.annotation.message(), Some("first"));
    }

    /// Counts annotation lookups per type to observe the visit pattern.
    struct Counting {
        table: TypeTable,
        visits: Mutex<Vec<String>>,
    }

    impl TypeHierarchy for Counting {
        fn base_type(&self, ty: &TypeRef) -> Option<&TypeRef> {
            self.table.base_type(ty)
        }
        fn interfaces(&self, ty: &TypeRef) -> &[TypeRef] {
            self.table.interfaces(ty)
        }
        fn annotations(&self, ty: &TypeRef) -> &[Annotation] {
            if let Ok(mut visits) = self.visits.lock() {
                visits.push(ty.qualified_name().to_string());
            }
            self.table.annotations(ty)
        }
    }

    #[test]
    fn diamond_visits_shared_ancestor_once() {
        //        IRoot
        //       /     \
        //    ILeft   IRight
        //       \     /
        //       Service
        let spec = MarkerSpec::default();
        let provider = Counting {
            table: TypeTable::new()
                .with(
                    TypeEntry::new(TypeRef::class("Service"))
                        .with_interface(TypeRef::interface("ILeft"))
                        .with_interface(TypeRef::interface("IRight")),
                )
                .with(
                    TypeEntry::new(TypeRef::interface("ILeft"))
                        .with_interface(TypeRef::interface("IRoot")),
                )
                .with(
                    TypeEntry::new(TypeRef::interface("IRight"))
                        .with_interface(TypeRef::interface("IRoot")),
                ),
            visits: Mutex::new(Vec::new()),
        };

        let hit = HierarchyResolver::new(&provider, &spec).resolve_marker(&TypeRef::class("Service"));
        assert!(hit.is_none());

        let visits = provider.visits.lock().unwrap().clone();
        assert_eq!(visits, vec!["Service", "ILeft", "IRight", "IRoot"]);
    }

    #[test]
    fn cyclic_provider_data_terminates() {
        let spec = MarkerSpec::default();
        let table = TypeTable::new()
            .with(TypeEntry::new(TypeRef::interface("IA")).with_interface(TypeRef::interface("IB")))
            .with(TypeEntry::new(TypeRef::interface("IB")).with_interface(TypeRef::interface("IA")));

        assert!(resolve(&table, &spec, &TypeRef::interface("IA")).is_none());
    }

    #[test]
    fn other_marker_identity_is_ignored() {
        let spec = MarkerSpec::new("NoMockAttribute", "Acme.Testing");
        let table = TypeTable::new().with(
            TypeEntry::new(TypeRef::interface("IService"))
                .with_annotation(marker("default marker"))
                .with_annotation(
                    Annotation::new("NoMockAttribute", "Acme.Testing").with_message("custom"),
                ),
        );

        let hit = resolve(&table, &spec, &TypeRef::interface("IService")).unwrap();
        assert_eq!(hit.annotation.message(), Some("custom"));
    }
}

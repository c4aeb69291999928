//! Classifier registry.
//!
//! # Responsibilities
//! - Hold the active classifiers in dispatch order
//! - Register/unregister classifiers as protocol plugins start and stop
//! - Hand out immutable snapshots to orchestration runs
//!
//! # Design Decisions
//! - Copy-on-write via `ArcSwap`: writers publish a new sorted list, readers
//!   load an `Arc` and never block
//! - Higher priority first; equal priority keeps registration order
//! - A snapshot keeps every classifier it names alive until the run ends

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::classify::Classifier;

/// Handle returned by [`ClassifierRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassifierId(u64);

impl fmt::Display for ClassifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered classifier.
pub struct ClassifierEntry {
    id: ClassifierId,
    priority: i32,
    active: bool,
    classifier: Arc<dyn Classifier>,
}

impl ClassifierEntry {
    pub fn id(&self) -> ClassifierId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.classifier.name()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    fn with_active(&self, active: bool) -> Self {
        Self {
            id: self.id,
            priority: self.priority,
            active,
            classifier: self.classifier.clone(),
        }
    }
}

impl fmt::Debug for ClassifierEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierEntry")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("priority", &self.priority)
            .field("active", &self.active)
            .finish()
    }
}

/// Serializable description of an entry, for the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierDescriptor {
    pub id: ClassifierId,
    pub name: String,
    pub priority: i32,
    pub active: bool,
}

/// Immutable, dispatch-ordered view of the registry.
pub type Snapshot = Arc<Vec<Arc<ClassifierEntry>>>;

/// Priority-ordered, copy-on-write set of classifiers.
pub struct ClassifierRegistry {
    entries: ArcSwap<Vec<Arc<ClassifierEntry>>>,
    next_id: AtomicU64,
}

impl ClassifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a classifier. Higher `priority` is tried first.
    pub fn register(&self, classifier: Arc<dyn Classifier>, priority: i32) -> ClassifierId {
        let id = ClassifierId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Arc::new(ClassifierEntry {
            id,
            priority,
            active: true,
            classifier,
        });

        self.entries.rcu(|current| {
            let mut next: Vec<_> = current.iter().cloned().collect();
            next.push(entry.clone());
            // Ids grow with registration order, so this is stable for equal priorities.
            next.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
            next
        });

        tracing::info!(id = %id, name = %entry.name(), priority, "Classifier registered");
        id
    }

    /// Remove a classifier. Returns false if it was not registered.
    pub fn unregister(&self, id: ClassifierId) -> bool {
        let previous = self.entries.rcu(|current| {
            current
                .iter()
                .filter(|e| e.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });

        let removed = previous.iter().any(|e| e.id == id);
        if removed {
            tracing::info!(id = %id, "Classifier unregistered");
        }
        removed
    }

    /// Enable or disable a classifier without changing its position.
    /// Returns false if it was not registered.
    pub fn set_active(&self, id: ClassifierId, active: bool) -> bool {
        let previous = self.entries.rcu(|current| {
            current
                .iter()
                .map(|e| {
                    if e.id == id {
                        Arc::new(e.with_active(active))
                    } else {
                        e.clone()
                    }
                })
                .collect::<Vec<_>>()
        });

        let found = previous.iter().any(|e| e.id == id);
        if found {
            tracing::info!(id = %id, active, "Classifier state changed");
        }
        found
    }

    /// Current dispatch order. Later mutations do not affect the returned snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.entries.load_full()
    }

    /// Describe all entries in dispatch order.
    pub fn describe(&self) -> Vec<ClassifierDescriptor> {
        self.entries
            .load()
            .iter()
            .map(|e| ClassifierDescriptor {
                id: e.id,
                name: e.name().to_string(),
                priority: e.priority,
                active: e.active,
            })
            .collect()
    }

    /// Number of registered classifiers, active or not.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRegistry")
            .field("entries", &**self.entries.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassifyError, RequestView};
    use crate::segment::Classification;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Classifier for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn classify(&self, _view: &RequestView) -> Result<Classification, ClassifyError> {
            Ok(Classification::NotApplicable)
        }
    }

    fn names(registry: &ClassifierRegistry) -> Vec<String> {
        registry.describe().into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_priority_order() {
        let registry = ClassifierRegistry::new();
        registry.register(Arc::new(Named("low")), 1);
        registry.register(Arc::new(Named("high")), 10);
        registry.register(Arc::new(Named("low-later")), 1);
        registry.register(Arc::new(Named("mid")), 5);

        assert_eq!(names(&registry), ["high", "mid", "low", "low-later"]);
    }

    #[test]
    fn test_unregister() {
        let registry = ClassifierRegistry::new();
        let a = registry.register(Arc::new(Named("a")), 1);
        registry.register(Arc::new(Named("b")), 1);

        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));
        assert_eq!(names(&registry), ["b"]);
    }

    #[test]
    fn test_snapshot_is_isolated_from_mutation() {
        let registry = ClassifierRegistry::new();
        let a = registry.register(Arc::new(Named("a")), 1);
        let snapshot = registry.snapshot();

        registry.unregister(a);
        registry.register(Arc::new(Named("b")), 1);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "a");
        assert_eq!(names(&registry), ["b"]);
    }

    #[test]
    fn test_set_active_keeps_position() {
        let registry = ClassifierRegistry::new();
        let a = registry.register(Arc::new(Named("a")), 2);
        registry.register(Arc::new(Named("b")), 1);

        assert!(registry.set_active(a, false));
        let described = registry.describe();
        assert_eq!(described[0].name, "a");
        assert!(!described[0].active);
        assert!(described[1].active);
        assert!(!registry.set_active(ClassifierId(999), true));
    }
}

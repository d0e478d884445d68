//! Ownership tracking for GPU resources.
//!
//! Every GPU object the renderer creates is wrapped in a [`Tracked`] guard
//! registered with a [`ResourceLedger`]. Dropping the guard records the
//! release, so constructors that fail halfway release what they already
//! created simply by returning early.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

/// Category of a tracked resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// Texture (volume, transfer function, attachments).
    Texture,
    /// Texture view.
    TextureView,
    /// Sampler.
    Sampler,
    /// Vertex, index, uniform or readback buffer.
    Buffer,
    /// Offscreen render surface (color + depth attachments).
    Surface,
    /// Shader module.
    Shader,
    /// Render pipeline.
    Pipeline,
    /// Bind group or bind group layout.
    BindGroup,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Texture => "texture",
            Self::TextureView => "texture view",
            Self::Sampler => "sampler",
            Self::Buffer => "buffer",
            Self::Surface => "surface",
            Self::Shader => "shader",
            Self::Pipeline => "pipeline",
            Self::BindGroup => "bind group",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    live: BTreeMap<ResourceKind, usize>,
    created: usize,
    destroyed: usize,
}

/// Shared counter of live resources per kind.
///
/// Cloning the ledger shares the same counters.
#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl ResourceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // A panic while holding the lock leaves counters that are still valid.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Registers a freshly created resource and returns its guard.
    pub fn track<T>(&self, kind: ResourceKind, label: impl Into<String>, value: T) -> Tracked<T> {
        let label = label.into();
        {
            let mut state = self.lock();
            *state.live.entry(kind).or_insert(0) += 1;
            state.created += 1;
        }
        log::debug!("created {kind} '{label}'");
        Tracked {
            value: Some(value),
            kind,
            label,
            ledger: self.clone(),
        }
    }

    fn release(&self, kind: ResourceKind, label: &str) {
        {
            let mut state = self.lock();
            if let Some(count) = state.live.get_mut(&kind) {
                *count = count.saturating_sub(1);
            }
            state.destroyed += 1;
        }
        log::debug!("destroyed {kind} '{label}'");
    }

    /// Number of live resources of one kind.
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.lock().live.get(&kind).copied().unwrap_or(0)
    }

    /// Number of live resources of every kind.
    pub fn live_total(&self) -> usize {
        self.lock().live.values().sum()
    }

    /// Total number of resources ever created.
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Total number of resources ever destroyed.
    pub fn destroyed(&self) -> usize {
        self.lock().destroyed
    }
}

/// RAII guard owning one tracked resource.
///
/// Dereferences to the wrapped value. The ledger records the release when
/// the guard is dropped or explicitly destroyed, exactly once.
pub struct Tracked<T> {
    value: Option<T>,
    kind: ResourceKind,
    label: String,
    ledger: ResourceLedger,
}

impl<T> Tracked<T> {
    /// Resource category.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Debug label given at creation.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Releases the resource now.
    pub fn destroy(self) {
        drop(self);
    }

    /// Releases the resource through a custom destructor (for example
    /// `wgpu::Texture::destroy`) before the ledger records it.
    pub fn destroy_with(mut self, f: impl FnOnce(T)) {
        if let Some(value) = self.value.take() {
            f(value);
        }
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            // `value` is only taken by `destroy_with`, which consumes self.
            None => unreachable!("tracked resource accessed after destroy"),
        }
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        drop(self.value.take());
        self.ledger.release(self.kind, &self.label);
    }
}

impl<T> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<u32>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_track_and_drop() {
        let ledger = ResourceLedger::new();
        let texture = ledger.track(ResourceKind::Texture, "volume", 42u32);
        assert_eq!(*texture, 42);
        assert_eq!(texture.label(), "volume");
        assert_eq!(ledger.live(ResourceKind::Texture), 1);
        drop(texture);
        assert_eq!(ledger.live(ResourceKind::Texture), 0);
        assert_eq!(ledger.created(), 1);
        assert_eq!(ledger.destroyed(), 1);
    }

    #[test]
    fn test_destroy_releases_once() {
        let ledger = ResourceLedger::new();
        let drops = Rc::new(Cell::new(0));
        let buffer = ledger.track(ResourceKind::Buffer, "vertices", DropCounter(drops.clone()));
        buffer.destroy();
        assert_eq!(drops.get(), 1);
        assert_eq!(ledger.destroyed(), 1);
        assert_eq!(ledger.live_total(), 0);
    }

    #[test]
    fn test_destroy_with_runs_destructor() {
        let ledger = ResourceLedger::new();
        let called = Rc::new(Cell::new(0));
        let sampler = ledger.track(ResourceKind::Sampler, "clamp", DropCounter(called.clone()));
        sampler.destroy_with(|value| {
            assert_eq!(value.0.get(), 0);
        });
        assert_eq!(called.get(), 1);
        assert_eq!(ledger.live(ResourceKind::Sampler), 0);
        assert_eq!(ledger.destroyed(), 1);
    }

    #[test]
    fn test_partial_construction_releases_created() {
        fn build(ledger: &ResourceLedger, fail: bool) -> Result<Vec<Tracked<u8>>, &'static str> {
            let color = ledger.track(ResourceKind::Texture, "color", 0);
            let depth = ledger.track(ResourceKind::Texture, "depth", 1);
            if fail {
                return Err("attachment rejected");
            }
            Ok(vec![color, depth])
        }

        let ledger = ResourceLedger::new();
        assert!(build(&ledger, true).is_err());
        assert_eq!(ledger.created(), 2);
        assert_eq!(ledger.live_total(), 0);

        let ok = build(&ledger, false).unwrap();
        assert_eq!(ledger.live(ResourceKind::Texture), 2);
        drop(ok);
        assert_eq!(ledger.created(), ledger.destroyed());
    }

    #[test]
    fn test_cloned_ledger_shares_counts() {
        let ledger = ResourceLedger::new();
        let other = ledger.clone();
        let _pipeline = other.track(ResourceKind::Pipeline, "raycast", ());
        assert_eq!(ledger.live(ResourceKind::Pipeline), 1);
    }
}

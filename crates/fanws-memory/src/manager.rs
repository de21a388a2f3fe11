use crate::config::{MemoryConfig, MB};
use crate::eviction::{EvictionRequest, MemoryEvictor};
use crate::monitor::MonitorHandle;
use crate::pressure::MemoryPressure;
use crate::process::HostSampler;
use crate::reclaim;
use crate::report::{ComponentUsage, MemoryReport};
use crate::types::{MemoryBreakdown, MemoryCategory, MemoryStats};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type MemoryEventListener = Arc<dyn Fn(MemoryEvent) + Send + Sync>;
type EvictorEntry = (MemoryCategory, Arc<AtomicU64>, Arc<dyn MemoryEvictor>);

struct RegistrationEntry {
    name: String,
    category: MemoryCategory,
    usage_bytes: Arc<AtomicU64>,
    evictor: Weak<dyn MemoryEvictor>,
}

pub(crate) struct Inner {
    config: MemoryConfig,
    auto_cleanup_on_critical: AtomicBool,
    next_id: AtomicU64,
    registrations: Mutex<HashMap<u64, RegistrationEntry>>,
    sampler: Mutex<HostSampler>,
    pressure: Mutex<MemoryPressure>,
    listeners: Mutex<Vec<MemoryEventListener>>,
    pub(crate) monitor: Mutex<Option<MonitorHandle>>,
}

/// Emitted by [`MemoryManager::enforce`] when the pressure band changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryEvent {
    pub previous_pressure: MemoryPressure,
    pub pressure: MemoryPressure,
    pub stats: MemoryStats,
}

/// Central coordinator for memory sampling, thresholds and cache eviction.
///
/// Cloning is cheap and yields a handle to the same manager. Construct one in
/// the composition root and share clones.
#[derive(Clone)]
pub struct MemoryManager {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("config", &self.inner.config)
            .field("registrations", &self.inner.registrations.lock().len())
            .field("monitoring", &self.is_monitoring())
            .finish()
    }
}

impl MemoryManager {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                auto_cleanup_on_critical: AtomicBool::new(true),
                next_id: AtomicU64::new(1),
                registrations: Mutex::new(HashMap::new()),
                sampler: Mutex::new(HostSampler::new()),
                pressure: Mutex::new(MemoryPressure::Normal),
                listeners: Mutex::new(Vec::new()),
                monitor: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> MemoryConfig {
        self.inner.config
    }

    /// Whether [`MemoryManager::enforce`] runs [`MemoryManager::cleanup`] at `Critical`.
    /// Enabled by default.
    pub fn set_auto_cleanup_on_critical(&self, enabled: bool) {
        self.inner
            .auto_cleanup_on_critical
            .store(enabled, Ordering::Relaxed);
    }

    pub fn auto_cleanup_on_critical(&self) -> bool {
        self.inner.auto_cleanup_on_critical.load(Ordering::Relaxed)
    }

    /// Subscribe to pressure band changes observed by [`MemoryManager::enforce`].
    pub fn subscribe(&self, listener: MemoryEventListener) {
        self.inner.listeners.lock().push(listener);
    }

    /// Register a component for memory accounting and eviction participation.
    ///
    /// Only a weak reference to `evictor` is kept, so a component may own its
    /// own registration; dropping the component unregisters it.
    pub fn register_evictor(
        &self,
        name: impl Into<String>,
        category: MemoryCategory,
        evictor: Arc<dyn MemoryEvictor>,
    ) -> MemoryRegistration {
        self.register_inner(name.into(), category, evictor)
    }

    fn register_inner(
        &self,
        name: String,
        category: MemoryCategory,
        evictor: Arc<dyn MemoryEvictor>,
    ) -> MemoryRegistration {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let usage_bytes = Arc::new(AtomicU64::new(0));

        self.inner.registrations.lock().insert(
            id,
            RegistrationEntry {
                name: name.clone(),
                category,
                usage_bytes: usage_bytes.clone(),
                evictor: Arc::downgrade(&evictor),
            },
        );
        tracing::trace!(target = "fanws.memory", id, name = %name, ?category, "registered component");

        MemoryRegistration {
            id,
            name,
            category,
            usage_bytes,
            manager: Arc::downgrade(&self.inner),
        }
    }

    /// Sample a fresh stats snapshot. Never fails; unavailable sources read as zero.
    pub fn get_memory_stats(&self) -> MemoryStats {
        let sample = self.inner.sampler.lock().sample();
        MemoryStats {
            process_memory_mb: sample.rss_bytes.map(bytes_to_mb).unwrap_or(0.0),
            system_memory_percent: sample.system_used_percent.unwrap_or(0.0),
            cache_memory_mb: bytes_to_mb(self.usage_breakdown().total()),
            gc_collections: reclaim::collection_count(),
        }
    }

    /// Current pressure band. Samples stats but performs no eviction.
    pub fn check_thresholds(&self) -> MemoryPressure {
        self.inner.config.pressure_for(&self.get_memory_stats())
    }

    /// Snapshot of stats, pressure band and per-component usage (no eviction).
    pub fn report(&self) -> MemoryReport {
        let stats = self.get_memory_stats();
        let pressure = self.inner.config.pressure_for(&stats);

        let mut usage = MemoryBreakdown::default();
        let mut components: Vec<ComponentUsage> = {
            let registrations = self.inner.registrations.lock();
            registrations
                .values()
                .map(|entry| ComponentUsage {
                    name: entry.name.clone(),
                    category: entry.category,
                    bytes: entry.usage_bytes.load(Ordering::Relaxed),
                })
                .collect()
        };
        for component in &components {
            let prev = usage.get(component.category);
            usage.set(component.category, prev.saturating_add(component.bytes));
        }
        components.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));

        MemoryReport {
            stats,
            pressure,
            usage,
            components,
        }
    }

    /// Shrink registered caches according to the current pressure band.
    ///
    /// Caches are brought within `max_cache_mb` scaled by the band (full budget
    /// at `Normal`, half at `Warning`, nothing at `Critical`). At `Warning` and
    /// above, lazy-text chunk buffers are compacted when lazy loading is enabled.
    pub fn optimize_memory(&self) -> MemoryStats {
        let pressure = self.check_thresholds();
        self.optimize_for(pressure);
        self.get_memory_stats()
    }

    fn optimize_for(&self, pressure: MemoryPressure) {
        let budget = self.inner.config.max_cache_bytes();
        let target = ((budget as f64) * pressure.cache_target_ratio()).round() as u64;
        let entries = self.collect_evictor_entries();
        if entries.is_empty() {
            return;
        }

        if pressure >= MemoryPressure::Warning && self.inner.config.enable_lazy_loading() {
            for (category, _usage, evictor) in &entries {
                if *category == MemoryCategory::LazyText {
                    evictor.evict(EvictionRequest {
                        pressure,
                        target_bytes: 0,
                    });
                }
            }
        }

        // A few passes give evictors a chance to converge without long stalls.
        for _round in 0..3 {
            let total: u64 = entries
                .iter()
                .map(|(_, usage, _)| usage.load(Ordering::Relaxed))
                .fold(0u64, u64::saturating_add);
            if total <= target {
                break;
            }
            evict_proportionally(pressure, total, target, &entries);
        }
    }

    /// Drop everything registered caches hold, then run a reclamation cycle.
    ///
    /// Idempotent: calling it with nothing to free is a no-op apart from the cycle.
    pub fn cleanup(&self) -> MemoryStats {
        let mut freed = 0u64;
        for (_category, _usage, evictor) in self.collect_evictor_entries() {
            let result = evictor.evict(EvictionRequest {
                pressure: MemoryPressure::Critical,
                target_bytes: 0,
            });
            freed = freed.saturating_add(result.freed_bytes());
        }
        reclaim::collect();
        tracing::debug!(target = "fanws.memory", freed_bytes = freed, "cleanup complete");
        self.get_memory_stats()
    }

    /// Run a reclamation cycle and return stats reflecting it.
    pub fn force_garbage_collection(&self) -> MemoryStats {
        reclaim::collect();
        self.get_memory_stats()
    }

    /// Sample, remediate according to the pressure band and notify listeners.
    ///
    /// `Critical` runs [`MemoryManager::cleanup`] when auto-cleanup is enabled
    /// (and falls back to [`MemoryManager::optimize_memory`] otherwise); lower
    /// bands run `optimize_memory`. Driven by the monitor thread, or directly by
    /// the host after large allocations.
    pub fn enforce(&self) -> MemoryReport {
        let before = self.check_thresholds();
        match before {
            MemoryPressure::Critical if self.auto_cleanup_on_critical() => {
                tracing::warn!(
                    target = "fanws.memory",
                    "memory pressure critical; clearing caches"
                );
                self.cleanup();
            }
            pressure => self.optimize_for(pressure),
        }

        let report = self.report();
        self.maybe_emit_event(&report);
        report
    }

    fn maybe_emit_event(&self, report: &MemoryReport) {
        let previous = {
            let mut state = self.inner.pressure.lock();
            if *state == report.pressure {
                return;
            }
            std::mem::replace(&mut *state, report.pressure)
        };

        tracing::info!(
            target = "fanws.memory",
            previous = ?previous,
            pressure = ?report.pressure,
            process_memory_mb = report.stats.process_memory_mb,
            "memory pressure changed"
        );

        let listeners = self.inner.listeners.lock().clone();
        let event = MemoryEvent {
            previous_pressure: previous,
            pressure: report.pressure,
            stats: report.stats,
        };
        for listener in listeners {
            listener(event.clone());
        }
    }

    fn collect_evictor_entries(&self) -> Vec<EvictorEntry> {
        let registrations = self.inner.registrations.lock();
        registrations
            .values()
            .filter_map(|entry| {
                let evictor = entry.evictor.upgrade()?;
                Some((entry.category, entry.usage_bytes.clone(), evictor))
            })
            .collect()
    }

    fn usage_breakdown(&self) -> MemoryBreakdown {
        let registrations = self.inner.registrations.lock();
        let mut breakdown = MemoryBreakdown::default();
        for entry in registrations.values() {
            let bytes = entry.usage_bytes.load(Ordering::Relaxed);
            let prev = breakdown.get(entry.category);
            breakdown.set(entry.category, prev.saturating_add(bytes));
        }
        breakdown
    }
}

fn evict_proportionally(
    pressure: MemoryPressure,
    total: u64,
    target: u64,
    entries: &[EvictorEntry],
) {
    for (_category, usage, evictor) in entries {
        let component_usage = usage.load(Ordering::Relaxed);
        if component_usage == 0 {
            continue;
        }
        // Proportional share of the target.
        let numer = (component_usage as u128) * (target as u128);
        let share = (numer / (total.max(1) as u128)) as u64;
        evictor.evict(EvictionRequest {
            pressure,
            target_bytes: share,
        });
    }
}

fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / MB as f64
}

/// Handle kept by the registering component; dropping it unregisters the
/// component and removes its contribution from memory accounting.
pub struct MemoryRegistration {
    id: u64,
    name: String,
    category: MemoryCategory,
    usage_bytes: Arc<AtomicU64>,
    manager: Weak<Inner>,
}

impl MemoryRegistration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> MemoryCategory {
        self.category
    }

    pub fn tracker(&self) -> MemoryTracker {
        MemoryTracker {
            usage_bytes: self.usage_bytes.clone(),
        }
    }
}

impl std::fmt::Debug for MemoryRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegistration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("usage_bytes", &self.usage_bytes.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for MemoryRegistration {
    fn drop(&mut self) {
        self.usage_bytes.store(0, Ordering::Relaxed);
        if let Some(manager) = self.manager.upgrade() {
            manager.registrations.lock().remove(&self.id);
        }
    }
}

/// Lightweight per-component memory accounting handle.
#[derive(Clone)]
pub struct MemoryTracker {
    usage_bytes: Arc<AtomicU64>,
}

impl MemoryTracker {
    pub fn set_bytes(&self, bytes: u64) {
        self.usage_bytes.store(bytes, Ordering::Relaxed);
    }

    pub fn add_bytes(&self, delta: i64) {
        let mut current = self.usage_bytes.load(Ordering::Relaxed);
        loop {
            let next = if delta >= 0 {
                current.saturating_add(delta as u64)
            } else {
                current.saturating_sub(delta.unsigned_abs())
            };
            match self.usage_bytes.compare_exchange(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn bytes(&self) -> u64 {
        self.usage_bytes.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MemoryTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTracker")
            .field("bytes", &self.bytes())
            .finish()
    }
}

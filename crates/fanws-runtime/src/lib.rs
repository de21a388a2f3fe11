//! Composition root for the FANWS core.
//!
//! A [`Runtime`] owns the single memory manager, the per-project cache
//! registry and the permission manager, all built from one [`FanwsConfig`].
//! Hosts construct one explicitly and pass it (or clones of its parts) to the
//! code that needs them; [`Runtime::shared`] exists for hosts that cannot.

use fanws_cache::{CacheError, LazyTextLoader, ProjectCaches, ProjectFileCache};
use fanws_config::{ConfigError, FanwsConfig};
use fanws_memory::{MemoryConfigError, MemoryManager, MemoryStats};
use fanws_permissions::PermissionManager;
use parking_lot::Mutex;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Values held in project caches.
pub type CachedValue = Value;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid memory configuration: {0}")]
    Memory(#[from] MemoryConfigError),
}

pub struct Runtime {
    config: FanwsConfig,
    memory: MemoryManager,
    projects: ProjectCaches<CachedValue>,
    permissions: Arc<PermissionManager>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("memory", &self.memory)
            .field("projects", &self.projects.project_names())
            .field("permissions", &self.permissions)
            .finish()
    }
}

static SHARED: OnceLock<Runtime> = OnceLock::new();
static SHARED_INIT: Mutex<()> = parking_lot::const_mutex(());

impl Runtime {
    /// Build every component from `config`. Starts the memory monitor when
    /// `memory.monitor_interval_ms` is non-zero.
    pub fn new(config: FanwsConfig) -> Result<Self, RuntimeError> {
        let memory = MemoryManager::new(config.memory_config()?);
        memory.set_auto_cleanup_on_critical(config.memory.auto_cleanup_on_critical);

        let projects = ProjectCaches::with_manager(config.memory.max_cache_mb, memory.clone())
            .with_entry_ttl(config.cache.entry_ttl());
        let permissions = Arc::new(
            PermissionManager::with_settings(config.permission_settings())
                .with_default_evaluators(),
        );

        if let Some(interval) = config.memory.monitor_interval() {
            memory.start_monitoring(interval);
        }
        tracing::info!(
            target = "fanws.runtime",
            max_memory_mb = config.memory.max_memory_mb,
            max_cache_mb = config.memory.max_cache_mb,
            "runtime started"
        );

        Ok(Self {
            config,
            memory,
            projects,
            permissions,
        })
    }

    /// Load `path`, install logging from its `[logging]` table and build a
    /// runtime. Config diagnostics are logged, not fatal, except where they
    /// make the memory configuration invalid.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, RuntimeError> {
        let (config, diagnostics) = FanwsConfig::load_from_path_with_diagnostics(path)?;
        fanws_config::init_tracing(&config.logging);
        for warning in &diagnostics.warnings {
            tracing::warn!(target = "fanws.runtime", ?warning, "config warning");
        }
        for error in &diagnostics.errors {
            tracing::error!(target = "fanws.runtime", ?error, "config error");
        }
        Self::new(config)
    }

    /// The process-wide runtime, built from `init()` on first access.
    ///
    /// Racing first calls build exactly one instance; later calls ignore
    /// `init`. If building fails, nothing is stored and the next call retries.
    pub fn shared(init: impl FnOnce() -> FanwsConfig) -> Result<&'static Runtime, RuntimeError> {
        if let Some(runtime) = SHARED.get() {
            return Ok(runtime);
        }
        let _guard = SHARED_INIT.lock();
        if let Some(runtime) = SHARED.get() {
            return Ok(runtime);
        }
        let runtime = Runtime::new(init())?;
        Ok(SHARED.get_or_init(|| runtime))
    }

    pub fn config(&self) -> &FanwsConfig {
        &self.config
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn projects(&self) -> &ProjectCaches<CachedValue> {
        &self.projects
    }

    pub fn permissions(&self) -> &Arc<PermissionManager> {
        &self.permissions
    }

    /// The cache for `name`, created and registered on first use.
    pub fn open_project(&self, name: &str) -> Arc<ProjectFileCache<CachedValue>> {
        self.projects.get_or_create(name)
    }

    pub fn close_project(&self, name: &str) -> bool {
        self.projects.close_project(name)
    }

    /// Open a text file for lazy reading. When lazy loading is enabled its
    /// chunk cache is registered with the memory manager.
    pub fn open_text(&self, path: impl AsRef<Path>) -> Result<Arc<LazyTextLoader>, CacheError> {
        let loader = Arc::new(LazyTextLoader::with_chunk_size(
            path,
            self.config.cache.lazy_chunk_size,
        )?);
        if self.config.memory.enable_lazy_loading {
            loader.register_with(&self.memory);
        }
        Ok(loader)
    }

    /// Stop background monitoring, empty every project cache and run a
    /// cleanup pass. Safe to call more than once.
    pub fn shutdown(&self) -> MemoryStats {
        self.memory.stop_monitoring();
        self.projects.clear_all();
        let stats = self.memory.cleanup();
        tracing::info!(target = "fanws.runtime", "runtime shut down");
        stats
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.memory.stop_monitoring();
    }
}

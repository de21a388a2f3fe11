use crate::file_cache::{CacheStats, FileCache};
use fanws_memory::MemoryManager;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A [`FileCache`] scoped to a single project.
///
/// Each project owns its own cache instance, so keys never collide across
/// projects and eviction in one project never touches another.
#[derive(Debug)]
pub struct ProjectFileCache<V> {
    project_name: String,
    cache: Arc<FileCache<V>>,
}

impl<V> ProjectFileCache<V> {
    pub fn new(project_name: impl Into<String>, max_size_mb: u64) -> Self {
        Self::with_ttl(project_name, max_size_mb, None)
    }

    /// Like [`Self::new`], expiring entries `ttl` after insertion when set.
    pub fn with_ttl(project_name: impl Into<String>, max_size_mb: u64, ttl: Option<Duration>) -> Self {
        let project_name = project_name.into();
        let mut cache = FileCache::new(max_size_mb).named(format!("project:{project_name}"));
        if let Some(ttl) = ttl {
            cache = cache.with_ttl(ttl);
        }
        Self {
            project_name,
            cache: Arc::new(cache),
        }
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.cache.get(key)
    }

    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        self.cache.remove(key)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn current_size_mb(&self) -> f64 {
        self.cache.current_size_mb()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The underlying cache, for operations not mirrored here.
    pub fn cache(&self) -> &Arc<FileCache<V>> {
        &self.cache
    }
}

impl<V: Serialize> ProjectFileCache<V> {
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.cache.set(key, value);
    }
}

/// Registry of per-project caches, created lazily on first use.
///
/// Caches are registered with the memory manager (when one is supplied) so
/// pressure-driven eviction reaches every open project.
pub struct ProjectCaches<V> {
    max_size_mb: u64,
    entry_ttl: Option<Duration>,
    manager: Option<MemoryManager>,
    projects: RwLock<HashMap<String, Arc<ProjectFileCache<V>>>>,
}

impl<V: Send + Sync + 'static> ProjectCaches<V> {
    pub fn new(max_size_mb: u64) -> Self {
        Self {
            max_size_mb,
            entry_ttl: None,
            manager: None,
            projects: RwLock::new(HashMap::new()),
        }
    }

    /// Expire entries in caches created from now on `ttl` after insertion.
    pub fn with_entry_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.entry_ttl = ttl;
        self
    }

    pub fn with_manager(max_size_mb: u64, manager: MemoryManager) -> Self {
        Self {
            manager: Some(manager),
            ..Self::new(max_size_mb)
        }
    }

    /// The cache for `project_name`, creating it on first access.
    pub fn get_or_create(&self, project_name: &str) -> Arc<ProjectFileCache<V>> {
        if let Some(cache) = self.projects.read().get(project_name) {
            return cache.clone();
        }

        let mut projects = self.projects.write();
        // Another thread may have created it between the locks.
        if let Some(cache) = projects.get(project_name) {
            return cache.clone();
        }

        let cache = Arc::new(ProjectFileCache::with_ttl(
            project_name,
            self.max_size_mb,
            self.entry_ttl,
        ));
        if let Some(manager) = &self.manager {
            cache.cache().register_with(manager);
        }
        projects.insert(project_name.to_string(), cache.clone());
        tracing::debug!(target = "fanws.cache", project = %project_name, "opened project cache");
        cache
    }

    pub fn get(&self, project_name: &str) -> Option<Arc<ProjectFileCache<V>>> {
        self.projects.read().get(project_name).cloned()
    }

    /// Drop the registry's reference to a project's cache. Its memory is
    /// released (and its manager registration dropped) once no caller holds it.
    pub fn close_project(&self, project_name: &str) -> bool {
        let removed = self.projects.write().remove(project_name);
        if let Some(cache) = &removed {
            cache.clear();
            tracing::debug!(target = "fanws.cache", project = %project_name, "closed project cache");
        }
        removed.is_some()
    }

    pub fn project_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.projects.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.projects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear_all(&self) {
        for cache in self.projects.read().values() {
            cache.clear();
        }
    }

    pub fn total_size_mb(&self) -> f64 {
        self.projects
            .read()
            .values()
            .map(|cache| cache.current_size_mb())
            .sum()
    }
}

//! Ordered registry of rendering backends
//!
//! Registration order is the order backends are benchmarked and reported in.

use crate::adapter::RenderBackend;
use crate::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Validate a backend name before registration.
///
/// Names become directory names, so they must be non-empty and free of
/// whitespace and path separators.
fn validate_backend_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Registration("Backend name cannot be empty".to_string()));
    }

    if name.contains(char::is_whitespace) {
        return Err(Error::Registration(format!(
            "Backend name '{}' cannot contain whitespace",
            name
        )));
    }

    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Registration(format!(
            "Backend name '{}' is not a valid directory name",
            name
        )));
    }

    Ok(())
}

/// Backends in registration order, keyed by name
#[derive(Default)]
pub struct BackendRegistry {
    backends: IndexMap<String, Arc<dyn RenderBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend at the end of the run order
    ///
    /// # Errors
    ///
    /// Returns [`Error::Registration`] for invalid or duplicate names.
    pub fn register(&mut self, backend: Arc<dyn RenderBackend>) -> Result<()> {
        let name = backend.name().to_string();

        validate_backend_name(&name)?;

        if self.backends.contains_key(&name) {
            return Err(Error::Registration(format!("Backend '{}' is already registered", name)));
        }

        // Output directories are lowercased, so names must be unique ignoring case.
        let folded = name.to_lowercase();
        if let Some(existing) = self.backends.keys().find(|key| key.to_lowercase() == folded) {
            return Err(Error::Registration(format!(
                "Backend '{}' clashes with registered backend '{}' (names are case-insensitive)",
                name, existing
            )));
        }

        self.backends.insert(name, backend);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RenderBackend>> {
        self.backends.get(name).cloned()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }

    /// Backends in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn RenderBackend>)> {
        self.backends.iter().map(|(name, backend)| (name.as_str(), backend))
    }

    /// Keep only the named backends, preserving registration order
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] for the first unknown name; the
    /// registry is left unchanged in that case.
    pub fn retain_named(&mut self, names: &[String]) -> Result<()> {
        if let Some(unknown) = names.iter().find(|name| !self.backends.contains_key(name.as_str())) {
            return Err(Error::BackendNotFound(unknown.clone()));
        }

        self.backends.retain(|name, _| names.contains(name));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

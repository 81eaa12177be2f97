//! Registry of managed resources.
//!
//! Built once before serving begins, then shared read-only through an `Arc`.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use super::ManagedResource;

/// Errors raised while registering resources at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Two resources share a name.
    #[error("resource name '{name}' is already registered")]
    Conflict { name: String },

    /// A resource reported a blank name.
    #[error("resource name must not be empty")]
    EmptyName,

    /// Leading or trailing whitespace would make " db" and "db" distinct keys.
    #[error("resource name '{name}' has surrounding whitespace")]
    PaddedName { name: String },
}

/// Name-unique set of resources, in registration order.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: Vec<Arc<dyn ManagedResource>>,
    names: HashSet<String>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. Duplicate, blank or padded names are rejected.
    pub fn register(&mut self, resource: Arc<dyn ManagedResource>) -> Result<(), RegistrationError> {
        let name = resource.name();
        if name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if name.trim() != name {
            return Err(RegistrationError::PaddedName {
                name: name.to_string(),
            });
        }
        if !self.names.insert(name.to_string()) {
            return Err(RegistrationError::Conflict {
                name: name.to_string(),
            });
        }

        tracing::info!(name, "Registering resource");
        self.resources.push(resource);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ManagedResource>> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name()).collect()
    }
}

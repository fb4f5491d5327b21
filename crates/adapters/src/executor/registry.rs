// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named executor providers

use super::Executor;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("executor already registered: {0}")]
    Duplicate(String),
    #[error("unknown executor: {0}")]
    Unknown(String),
}

/// Factory for one kind of executor
pub trait ExecutorProvider: Send + Sync {
    fn name(&self) -> &str;

    /// A fresh executor for one job attempt
    fn create(&self) -> Box<dyn Executor>;
}

/// Providers by name. Built once at startup and passed to the runner.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    providers: BTreeMap<String, Arc<dyn ExecutorProvider>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn ExecutorProvider>) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ExecutorProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Executor>, RegistryError> {
        self.providers
            .get(name)
            .map(|p| p.create())
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

//! Mock cluster client for unit testing
//!
//! Stores KluctlDeployments in memory, records every call, and can be told to
//! fail specific operations so reconciler error paths can be exercised without
//! an API server.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use crds::KluctlDeployment;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    List,
    Create(String),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Operation {
    Create,
    Delete,
}

/// In-memory cluster client
///
/// Clones share state, so a test can keep a handle while the reconciler owns
/// another.
#[derive(Debug, Clone)]
pub struct MockClusterClient {
    namespace: String,
    // Insertion order doubles as API listing order
    objects: Arc<Mutex<Vec<KluctlDeployment>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
    failures: Arc<Mutex<HashMap<(Operation, String), ClusterError>>>,
    list_failure: Arc<Mutex<Option<ClusterError>>>,
}

impl MockClusterClient {
    /// Create an empty mock scoped to `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            objects: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            list_failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Seed the store with bare objects (for test setup)
    pub fn with_names<'a>(namespace: impl Into<String>, names: impl IntoIterator<Item = &'a str>) -> Self {
        let mock = Self::new(namespace);
        for name in names {
            mock.add_object(Self::bare_object(name));
        }
        mock
    }

    /// Add an object to the store without recording a call (for test setup)
    pub fn add_object(&self, deployment: KluctlDeployment) {
        self.objects.lock().unwrap().push(deployment);
    }

    /// Remove an object behind the reconciler's back (simulates external drift)
    pub fn remove_object(&self, name: &str) {
        self.objects
            .lock()
            .unwrap()
            .retain(|d| d.metadata.name.as_deref() != Some(name));
    }

    /// Make the next create of `name` fail with `error`
    pub fn fail_create(&self, name: &str, error: ClusterError) {
        self.failures
            .lock()
            .unwrap()
            .insert((Operation::Create, name.to_string()), error);
    }

    /// Make the next delete of `name` fail with `error`
    pub fn fail_delete(&self, name: &str, error: ClusterError) {
        self.failures
            .lock()
            .unwrap()
            .insert((Operation::Delete, name.to_string()), error);
    }

    /// Make the next list fail with `error`
    pub fn fail_list(&self, error: ClusterError) {
        *self.list_failure.lock().unwrap() = Some(error);
    }

    /// Names currently stored, in listing order
    pub fn names(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|d| d.metadata.name.clone())
            .collect()
    }

    /// Stored object by name
    pub fn get(&self, name: &str) -> Option<KluctlDeployment> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.metadata.name.as_deref() == Some(name))
            .cloned()
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that changed cluster state
    pub fn mutations(&self) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, MockCall::List))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn bare_object(name: &str) -> KluctlDeployment {
        let spec = crds::KluctlDeploymentSpec {
            interval: "5m".to_string(),
            source: crds::ProjectSource {
                git: crds::GitProjectSource {
                    url: "https://git.example.com/gitops.git".to_string(),
                    git_ref: None,
                    path: None,
                },
            },
            target: Some(name.to_string()),
            context: None,
            prune: true,
            delete: true,
        };
        KluctlDeployment::new(name, spec)
    }

    fn take_failure(&self, operation: Operation, name: &str) -> Option<ClusterError> {
        self.failures
            .lock()
            .unwrap()
            .remove(&(operation, name.to_string()))
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn list_controller_names(&self) -> Result<Vec<String>, ClusterError> {
        self.calls.lock().unwrap().push(MockCall::List);
        if let Some(error) = self.list_failure.lock().unwrap().take() {
            return Err(error);
        }
        Ok(self.names())
    }

    async fn create_controller(&self, deployment: &KluctlDeployment) -> Result<(), ClusterError> {
        let name = deployment.metadata.name.clone().unwrap_or_default();
        self.calls.lock().unwrap().push(MockCall::Create(name.clone()));

        if let Some(error) = self.take_failure(Operation::Create, &name) {
            return Err(error);
        }
        if self.get(&name).is_some() {
            return Err(ClusterError::AlreadyExists(name));
        }
        self.add_object(deployment.clone());
        Ok(())
    }

    async fn delete_controller(&self, name: &str) -> Result<(), ClusterError> {
        self.calls.lock().unwrap().push(MockCall::Delete(name.to_string()));

        if let Some(error) = self.take_failure(Operation::Delete, name) {
            return Err(error);
        }
        if self.get(name).is_none() {
            return Err(ClusterError::NotFound(name.to_string()));
        }
        self.remove_object(name);
        Ok(())
    }
}

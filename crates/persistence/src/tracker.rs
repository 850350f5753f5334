//! Change tracking shared by the store implementations.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use common::EntityId;
use domain::{Entity, ServiceRequest, ServiceRequestRecord};

/// A change staged by a repository and applied on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Insert(ServiceRequestRecord),
    Update(ServiceRequestRecord),
    Delete(EntityId),
}

impl Change {
    pub fn id(&self) -> EntityId {
        match self {
            Change::Insert(record) | Change::Update(record) => record.id,
            Change::Delete(id) => *id,
        }
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    tracked: HashSet<EntityId>,
    changes: Vec<Change>,
}

/// Staged changes and the set of instances a unit of work knows about.
///
/// Updates are only staged for tracked instances, i.e. ones created or read
/// through the same unit of work.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    state: Mutex<TrackerState>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assigns an identity if needed and stages the insert.
    pub fn stage_insert(&self, mut service_request: ServiceRequest) -> ServiceRequest {
        if service_request.is_transient() {
            // a fresh v4 id is never nil, so assignment cannot fail here
            let _ = service_request.assign_id(EntityId::new());
        }
        let mut state = self.state();
        state.tracked.insert(service_request.id());
        state.changes.push(Change::Insert(service_request.to_record()));
        service_request
    }

    /// Marks instances as tracked after they were read from the store.
    pub fn track<'a>(&self, service_requests: impl IntoIterator<Item = &'a ServiceRequest>) {
        let mut state = self.state();
        state
            .tracked
            .extend(service_requests.into_iter().map(|request| request.id()));
    }

    #[cfg(test)]
    fn is_tracked(&self, id: EntityId) -> bool {
        self.state().tracked.contains(&id)
    }

    /// Stages an update. Returns false when the instance is not tracked.
    pub fn stage_update(&self, service_request: &ServiceRequest) -> bool {
        let mut state = self.state();
        if !state.tracked.contains(&service_request.id()) {
            return false;
        }
        let record = service_request.to_record();
        // an update after an insert in the same unit folds into the insert
        if let Some(Change::Insert(pending)) = state
            .changes
            .iter_mut()
            .find(|change| matches!(change, Change::Insert(r) if r.id == record.id))
        {
            *pending = record;
        } else {
            state.changes.push(Change::Update(record));
        }
        true
    }

    pub fn stage_delete(&self, service_request: &ServiceRequest) {
        let id = service_request.id();
        let mut state = self.state();
        let staged_insert = state
            .changes
            .iter()
            .any(|change| matches!(change, Change::Insert(r) if r.id == id));
        state.changes.retain(|change| change.id() != id);
        state.tracked.remove(&id);
        if !staged_insert {
            state.changes.push(Change::Delete(id));
        }
    }

    pub fn pending(&self) -> Vec<Change> {
        self.state().changes.clone()
    }

    /// Removes and returns the staged changes, leaving tracking intact.
    pub fn take_changes(&self) -> Vec<Change> {
        std::mem::take(&mut self.state().changes)
    }

    /// Forgets staged changes and tracked instances.
    pub fn clear(&self) {
        let mut state = self.state();
        state.changes.clear();
        state.tracked.clear();
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{EntityId, RequestContext};
use domain::{
    DomainError, Entity, ExecutionStrategy, RepositoryFactory, ServiceRequest, ServiceRequestRecord,
    ServiceRequestRepository, TransactionHandle, UnitOfWork,
};
use tokio::sync::RwLock;

use crate::PersistenceError;
use crate::tracker::{Change, ChangeTracker};

/// Counts of transaction outcomes observed by an in-memory database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Default)]
struct DatabaseInner {
    rows: RwLock<HashMap<EntityId, ServiceRequestRecord>>,
    strategy: ExecutionStrategy,
    failing_begins: AtomicU32,
    failing_commits: AtomicU32,
    lost_commit_acks: AtomicU32,
    begun: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
}

/// In-memory service request store for tests and local runs.
///
/// Holds the committed table shared by every scope it creates. Each scope gets
/// its own [`InMemoryContext`] whose staged changes stay invisible to the others
/// until committed. Transient failures can be injected into `begin` and
/// `commit` to exercise rollback and retry.
#[derive(Clone)]
pub struct InMemoryDatabase {
    inner: Arc<DatabaseInner>,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatabase {
    /// Creates a new empty database that runs units of work once.
    pub fn new() -> Self {
        Self::with_execution_strategy(ExecutionStrategy::no_retry())
    }

    /// Creates a new empty database whose contexts report `strategy`.
    pub fn with_execution_strategy(strategy: ExecutionStrategy) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                strategy,
                ..DatabaseInner::default()
            }),
        }
    }

    /// Opens a new unit of work against this database.
    pub fn create_context(&self) -> Arc<InMemoryContext> {
        Arc::new(InMemoryContext {
            database: self.clone(),
            transaction: Mutex::new(None),
            tracker: ChangeTracker::new(),
        })
    }

    /// Makes the next `count` calls to `begin_transaction` fail transiently.
    pub fn fail_next_begins(&self, count: u32) {
        self.inner.failing_begins.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` commits fail transiently after the transaction began.
    pub fn fail_next_commits(&self, count: u32) {
        self.inner.failing_commits.store(count, Ordering::SeqCst);
    }

    /// Makes the next `count` commits apply their changes and then fail
    /// transiently, as when the acknowledgement of a commit is lost.
    pub fn lose_next_commit_acks(&self, count: u32) {
        self.inner.lost_commit_acks.store(count, Ordering::SeqCst);
    }

    /// Inserts committed rows directly, bypassing any unit of work.
    pub async fn seed(&self, records: impl IntoIterator<Item = ServiceRequestRecord>) {
        let mut rows = self.inner.rows.write().await;
        rows.extend(records.into_iter().map(|record| (record.id, record)));
    }

    /// Returns the committed row for `id`.
    pub async fn get(&self, id: EntityId) -> Option<ServiceRequestRecord> {
        self.inner.rows.read().await.get(&id).cloned()
    }

    /// Returns the number of committed rows.
    pub async fn count(&self) -> usize {
        self.inner.rows.read().await.len()
    }

    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            begun: self.inner.begun.load(Ordering::SeqCst),
            committed: self.inner.committed.load(Ordering::SeqCst),
            rolled_back: self.inner.rolled_back.load(Ordering::SeqCst),
        }
    }

    fn take_fault(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    async fn apply(&self, changes: Vec<Change>) -> Result<(), PersistenceError> {
        let mut rows = self.inner.rows.write().await;
        let mut next = rows.clone();
        for change in changes {
            match change {
                Change::Insert(record) => {
                    next.insert(record.id, record);
                }
                Change::Update(record) => match next.get_mut(&record.id) {
                    Some(row) => *row = record,
                    None => return Err(PersistenceError::Missing(record.id)),
                },
                Change::Delete(id) => {
                    if next.remove(&id).is_none() {
                        return Err(PersistenceError::Missing(id));
                    }
                }
            }
        }
        *rows = next;
        Ok(())
    }
}

impl RepositoryFactory for InMemoryDatabase {
    fn create_scope(&self) -> Arc<dyn ServiceRequestRepository> {
        Arc::new(InMemoryServiceRequestRepository::new(self.create_context()))
    }
}

/// One unit of work over an [`InMemoryDatabase`].
pub struct InMemoryContext {
    database: InMemoryDatabase,
    transaction: Mutex<Option<TransactionHandle>>,
    tracker: ChangeTracker,
}

impl InMemoryContext {
    fn transaction(&self) -> MutexGuard<'_, Option<TransactionHandle>> {
        self.transaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the changes staged but not yet committed.
    pub fn pending_changes(&self) -> Vec<Change> {
        self.tracker.pending()
    }

    fn discard(&self) {
        self.tracker.clear();
        self.database
            .inner
            .rolled_back
            .fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UnitOfWork for InMemoryContext {
    fn has_active_transaction(&self) -> bool {
        self.transaction().is_some()
    }

    fn current_transaction(&self) -> Option<TransactionHandle> {
        self.transaction().clone()
    }

    fn execution_strategy(&self) -> ExecutionStrategy {
        self.database.inner.strategy
    }

    async fn begin_transaction(
        &self,
        ctx: &RequestContext,
    ) -> Result<Option<TransactionHandle>, DomainError> {
        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if InMemoryDatabase::take_fault(&self.database.inner.failing_begins) {
            return Err(PersistenceError::Unavailable("injected begin failure".into()).into());
        }

        let mut slot = self.transaction();
        if slot.is_some() {
            return Ok(None);
        }
        let handle = TransactionHandle::new();
        *slot = Some(handle.clone());
        self.database.inner.begun.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(transaction_id = %handle.id(), "in-memory transaction started");
        Ok(Some(handle))
    }

    async fn commit_transaction(&self, transaction: &TransactionHandle) -> Result<(), DomainError> {
        {
            let mut slot = self.transaction();
            if slot.as_ref() != Some(transaction) {
                return Err(DomainError::InvalidOperation(format!(
                    "transaction {} is not current",
                    transaction.id()
                )));
            }
            *slot = None;
        }

        if InMemoryDatabase::take_fault(&self.database.inner.failing_commits) {
            self.discard();
            return Err(PersistenceError::Unavailable("injected commit failure".into()).into());
        }

        let changes = self.tracker.take_changes();
        let count = changes.len();
        if let Err(err) = self.database.apply(changes).await {
            self.discard();
            return Err(err.into());
        }

        self.database.inner.committed.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("persistence_changes_saved_total", "store" => "memory")
            .increment(count as u64);

        if InMemoryDatabase::take_fault(&self.database.inner.lost_commit_acks) {
            return Err(PersistenceError::Unavailable("commit acknowledgement lost".into()).into());
        }

        tracing::debug!(transaction_id = %transaction.id(), changes = count, "in-memory transaction committed");
        Ok(())
    }

    async fn rollback_transaction(&self) {
        let released = self.transaction().take();
        if let Some(handle) = released {
            self.discard();
            tracing::debug!(transaction_id = %handle.id(), "in-memory transaction rolled back");
        } else {
            self.tracker.clear();
        }
    }
}

/// Service request repository over an [`InMemoryContext`].
pub struct InMemoryServiceRequestRepository {
    context: Arc<InMemoryContext>,
}

impl InMemoryServiceRequestRepository {
    pub fn new(context: Arc<InMemoryContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<InMemoryContext> {
        &self.context
    }
}

#[async_trait]
impl ServiceRequestRepository for InMemoryServiceRequestRepository {
    fn unit_of_work(&self) -> Arc<dyn UnitOfWork> {
        self.context.clone()
    }

    fn create(&self, service_request: ServiceRequest) -> Result<ServiceRequest, DomainError> {
        Ok(self.context.tracker.stage_insert(service_request))
    }

    async fn retrieve_all(&self) -> Result<Vec<ServiceRequest>, DomainError> {
        let rows = self.context.database.inner.rows.read().await;
        let requests: Vec<_> = rows
            .values()
            .cloned()
            .map(ServiceRequest::from_record)
            .collect();
        self.context.tracker.track(&requests);
        Ok(requests)
    }

    async fn retrieve_by_id(&self, id: EntityId) -> Result<Option<ServiceRequest>, DomainError> {
        let record = self.context.database.get(id).await;
        let request = record.map(ServiceRequest::from_record);
        self.context.tracker.track(request.iter());
        Ok(request)
    }

    fn update(&self, service_request: &ServiceRequest) {
        if !self.context.tracker.stage_update(service_request) {
            tracing::debug!(id = %service_request.id(), "ignoring update of untracked service request");
        }
    }

    fn delete(&self, service_request: &ServiceRequest) {
        self.context.tracker.stage_delete(service_request);
    }
}

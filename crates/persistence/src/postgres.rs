use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{EntityId, RequestContext};
use domain::{
    CurrentStatus, DomainError, Entity, ExecutionStrategy, RepositoryFactory, ServiceRequest,
    ServiceRequestRecord, ServiceRequestRepository, TransactionHandle, UnitOfWork,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::tracker::{Change, ChangeTracker};
use crate::{PersistenceError, Result};

const SELECT_COLUMNS: &str = r#"
    SELECT id, building_code, description, current_status, created_by, created_date,
           last_modified_by, last_modified_date
    FROM service_requests
"#;

/// PostgreSQL-backed service request store.
#[derive(Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
    strategy: ExecutionStrategy,
}

impl PostgresDatabase {
    /// Creates a new store over an existing pool.
    pub fn new(pool: PgPool, strategy: ExecutionStrategy) -> Self {
        Self { pool, strategy }
    }

    /// Connects a pool of at most `max_connections` to `database_url`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        strategy: ExecutionStrategy,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool, strategy))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Opens a new unit of work against this database.
    pub fn create_context(&self) -> Arc<PostgresContext> {
        Arc::new(PostgresContext {
            pool: self.pool.clone(),
            strategy: self.strategy,
            connection: tokio::sync::Mutex::new(None),
            transaction: Mutex::new(None),
            tracker: ChangeTracker::new(),
        })
    }
}

impl RepositoryFactory for PostgresDatabase {
    fn create_scope(&self) -> Arc<dyn ServiceRequestRepository> {
        Arc::new(PostgresServiceRequestRepository::new(self.create_context()))
    }
}

/// One unit of work over a [`PostgresDatabase`].
///
/// Holds at most one open database transaction. Reads issued while it is open
/// run inside it; staged changes are written to it on commit.
pub struct PostgresContext {
    pool: PgPool,
    strategy: ExecutionStrategy,
    connection: tokio::sync::Mutex<Option<Transaction<'static, Postgres>>>,
    transaction: Mutex<Option<TransactionHandle>>,
    tracker: ChangeTracker,
}

impl PostgresContext {
    fn transaction(&self) -> MutexGuard<'_, Option<TransactionHandle>> {
        self.transaction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_all(&self) -> Result<Vec<ServiceRequestRecord>> {
        let mut connection = self.connection.lock().await;
        let query = sqlx::query(SELECT_COLUMNS);
        let rows = match connection.as_mut() {
            Some(tx) => query.fetch_all(&mut **tx).await?,
            None => query.fetch_all(&self.pool).await?,
        };
        rows.into_iter().map(row_to_record).collect()
    }

    async fn fetch_one(&self, id: EntityId) -> Result<Option<ServiceRequestRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let mut connection = self.connection.lock().await;
        let query = sqlx::query(&sql).bind(id.as_uuid());
        let row = match connection.as_mut() {
            Some(tx) => query.fetch_optional(&mut **tx).await?,
            None => query.fetch_optional(&self.pool).await?,
        };
        row.map(row_to_record).transpose()
    }
}

#[async_trait]
impl UnitOfWork for PostgresContext {
    fn has_active_transaction(&self) -> bool {
        self.transaction().is_some()
    }

    fn current_transaction(&self) -> Option<TransactionHandle> {
        self.transaction().clone()
    }

    fn execution_strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    #[tracing::instrument(skip(self, ctx), fields(correlation_id = %ctx.correlation_id()))]
    async fn begin_transaction(
        &self,
        ctx: &RequestContext,
    ) -> std::result::Result<Option<TransactionHandle>, DomainError> {
        if ctx.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self.has_active_transaction() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await.map_err(PersistenceError::from)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await
            .map_err(PersistenceError::from)?;

        *self.connection.lock().await = Some(tx);
        let handle = TransactionHandle::new();
        *self.transaction() = Some(handle.clone());
        Ok(Some(handle))
    }

    #[tracing::instrument(skip(self, transaction), fields(transaction_id = %transaction.id()))]
    async fn commit_transaction(
        &self,
        transaction: &TransactionHandle,
    ) -> std::result::Result<(), DomainError> {
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

        let Some(mut tx) = self.connection.lock().await.take() else {
            self.tracker.clear();
            return Err(DomainError::InvalidOperation(
                "no open database transaction".into(),
            ));
        };

        let changes = self.tracker.take_changes();
        if let Err(err) = apply_changes(&mut tx, &changes).await {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback after failed save did not complete");
            }
            self.tracker.clear();
            return Err(err.into());
        }

        tx.commit().await.map_err(|err| {
            self.tracker.clear();
            DomainError::from(PersistenceError::from(err))
        })?;
        metrics::counter!("persistence_changes_saved_total", "store" => "postgres")
            .increment(changes.len() as u64);
        tracing::debug!(changes = changes.len(), "transaction committed");
        Ok(())
    }

    async fn rollback_transaction(&self) {
        let released = self.transaction().take();
        let tx = self.connection.lock().await.take();
        self.tracker.clear();

        if let Some(tx) = tx
            && let Err(err) = tx.rollback().await
        {
            tracing::warn!(
                transaction_id = ?released.map(|handle| handle.id()),
                error = %err,
                "rollback did not complete; connection will discard the transaction"
            );
        }
    }
}

async fn apply_changes(connection: &mut PgConnection, changes: &[Change]) -> Result<()> {
    for change in changes {
        match change {
            Change::Insert(record) => {
                // replaces the row if a retried unit of work already wrote it
                sqlx::query(
                    r#"
                    INSERT INTO service_requests (id, building_code, description, current_status,
                        created_by, created_date, last_modified_by, last_modified_date)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    ON CONFLICT (id) DO UPDATE SET
                        building_code = EXCLUDED.building_code,
                        description = EXCLUDED.description,
                        current_status = EXCLUDED.current_status,
                        last_modified_by = EXCLUDED.last_modified_by,
                        last_modified_date = EXCLUDED.last_modified_date
                    "#,
                )
                .bind(record.id.as_uuid())
                .bind(&record.building_code)
                .bind(&record.description)
                .bind(record.current_status.code())
                .bind(&record.created_by)
                .bind(record.created_date)
                .bind(&record.last_modified_by)
                .bind(record.last_modified_date)
                .execute(&mut *connection)
                .await?;
            }
            Change::Update(record) => {
                let result = sqlx::query(
                    r#"
                    UPDATE service_requests
                    SET building_code = $2, description = $3, current_status = $4,
                        last_modified_by = $5, last_modified_date = $6
                    WHERE id = $1
                    "#,
                )
                .bind(record.id.as_uuid())
                .bind(&record.building_code)
                .bind(&record.description)
                .bind(record.current_status.code())
                .bind(&record.last_modified_by)
                .bind(record.last_modified_date)
                .execute(&mut *connection)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(PersistenceError::Missing(record.id));
                }
            }
            Change::Delete(id) => {
                let result = sqlx::query("DELETE FROM service_requests WHERE id = $1")
                    .bind(id.as_uuid())
                    .execute(&mut *connection)
                    .await?;

                if result.rows_affected() == 0 {
                    return Err(PersistenceError::Missing(*id));
                }
            }
        }
    }
    Ok(())
}

fn row_to_record(row: PgRow) -> Result<ServiceRequestRecord> {
    let id = EntityId::from_uuid(row.try_get::<Uuid, _>("id")?);
    let code: i32 = row.try_get("current_status")?;
    let current_status =
        CurrentStatus::try_from(code).map_err(|err| PersistenceError::InvalidRow {
            id,
            message: err.to_string(),
        })?;

    Ok(ServiceRequestRecord {
        id,
        building_code: row.try_get("building_code")?,
        description: row.try_get("description")?,
        current_status,
        created_by: row.try_get("created_by")?,
        created_date: row.try_get("created_date")?,
        last_modified_by: row.try_get("last_modified_by")?,
        last_modified_date: row.try_get("last_modified_date")?,
    })
}

/// Service request repository over a [`PostgresContext`].
pub struct PostgresServiceRequestRepository {
    context: Arc<PostgresContext>,
}

impl PostgresServiceRequestRepository {
    pub fn new(context: Arc<PostgresContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl ServiceRequestRepository for PostgresServiceRequestRepository {
    fn unit_of_work(&self) -> Arc<dyn UnitOfWork> {
        self.context.clone()
    }

    fn create(
        &self,
        service_request: ServiceRequest,
    ) -> std::result::Result<ServiceRequest, DomainError> {
        Ok(self.context.tracker.stage_insert(service_request))
    }

    async fn retrieve_all(&self) -> std::result::Result<Vec<ServiceRequest>, DomainError> {
        let records = self.context.fetch_all().await?;
        let requests: Vec<_> = records
            .into_iter()
            .map(ServiceRequest::from_record)
            .collect();
        self.context.tracker.track(&requests);
        Ok(requests)
    }

    async fn retrieve_by_id(
        &self,
        id: EntityId,
    ) -> std::result::Result<Option<ServiceRequest>, DomainError> {
        let request = self
            .context
            .fetch_one(id)
            .await?
            .map(ServiceRequest::from_record);
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

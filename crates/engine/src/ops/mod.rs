use std::{fmt, sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod audit;
mod categorized;
mod flows;
mod listing;
mod rooms;
mod store;
mod summary;

pub use listing::{CategorizedFilter, CategorizedPage, DEFAULT_PAGE_SIZE};

/// Default upper bound for one reconciling unit of work.
pub const DEFAULT_TX_TIMEOUT: Duration = Duration::from_secs(5);

/// Points inside a reconciling operation where a [`FaultHook`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultPoint {
    /// The ledger row is written (or deleted) and the room balance is not
    /// yet updated.
    AfterLedgerWrite { room_id: i32 },
}

/// Callback invoked at each [`FaultPoint`]; returning `Err` aborts the
/// enclosing transaction.
pub type FaultHook = Arc<dyn Fn(FaultPoint) -> ResultEngine<()> + Send + Sync>;

/// Run a block inside a DB transaction bounded by the engine timeout.
///
/// The block evaluates to a `ResultEngine`; `Ok` commits. An error, an early
/// `?` or hitting the timeout drops the transaction, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let timeout = $self.tx_timeout;
        let work = async {
            let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
            let result: $crate::ResultEngine<_> = $body;
            let value = result?;
            $tx.commit().await?;
            Ok::<_, $crate::EngineError>(value)
        };
        match tokio::time::timeout(timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(?timeout, "transaction timed out, rolled back");
                Err($crate::EngineError::Timeout(timeout))
            }
        }
    }};
}

pub(crate) use with_tx;

/// Entry point of the ledger: owns the store handle and runs every
/// operation as an explicit unit of work against it.
pub struct Engine {
    database: DatabaseConnection,
    tx_timeout: Duration,
    fault_hook: Option<FaultHook>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .field("tx_timeout", &self.tx_timeout)
            .field("fault_hook", &self.fault_hook.is_some())
            .finish()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn tx_timeout(&self) -> Duration {
        self.tx_timeout
    }

    fn inject_fault(&self, point: FaultPoint) -> ResultEngine<()> {
        match &self.fault_hook {
            Some(hook) => hook(point),
            None => Ok(()),
        }
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    tx_timeout: Duration,
    fault_hook: Option<FaultHook>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            tx_timeout: DEFAULT_TX_TIMEOUT,
            fault_hook: None,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn tx_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.tx_timeout = timeout;
        self
    }

    /// Install a hook that can fail an operation mid-transaction.
    pub fn fault_hook(mut self, hook: FaultHook) -> EngineBuilder {
        self.fault_hook = Some(hook);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.tx_timeout.is_zero() {
            return Err(crate::EngineError::Validation(
                "tx_timeout must be > 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            tx_timeout: self.tx_timeout,
            fault_hook: self.fault_hook,
        })
    }
}

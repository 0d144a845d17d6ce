// Admiral module - wires transport, state and executor into one session
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::client::{HttpTransport, Session, Transport};
use crate::config::{ConfigError, SyncConfig};
use crate::error::{ActionError, ApiError, StoreError};
use crate::models::{Agent, Contract, Ship, TransactionEvent};
use crate::operations::{
    fetch_snapshot, Action, ActionExecutor, ActionOutcome, Bootstrap, BootstrapError, CooldownPolicy, ShipActor,
    ShipActorHandle, ShipStatusUpdate,
};
use crate::storage::{CooldownTracker, EntityStore};

#[derive(Debug, Error)]
pub enum AdmiralError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] ApiError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

/// Point-in-time view of the session for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetStatus {
    pub agent: Option<Agent>,
    pub ships: Vec<Ship>,
    pub contracts: Vec<Contract>,
    pub cooldowns: Vec<(String, Duration)>,
}

/// Owns one logged-in session: the shared store and tracker, the executor
/// and any ship actors spawned on top of it.
pub struct Admiral {
    session: Option<Arc<Session>>,
    executor: Arc<ActionExecutor>,
    transactions: Option<mpsc::UnboundedReceiver<TransactionEvent>>,
    status_sender: mpsc::UnboundedSender<ShipStatusUpdate>,
    status_receiver: Option<mpsc::UnboundedReceiver<ShipStatusUpdate>>,
    actors: Mutex<HashMap<String, (ShipActorHandle, JoinHandle<()>)>>,
}

impl Admiral {
    /// Logs in with `token`, fetches the bootstrap snapshot and builds the
    /// executor with the configured cooldown policy.
    pub async fn connect(config: &SyncConfig, token: String) -> Result<Self, AdmiralError> {
        config.validate()?;

        let session = Arc::new(Session::login(token));
        let transport = HttpTransport::new(
            &config.api.base_url,
            session.clone(),
            config.api.request_timeout(),
            config.api.min_request_interval(),
        )?;
        let transport: Arc<dyn Transport> = Arc::new(transport);

        let bootstrap = fetch_snapshot(transport.as_ref(), config.bootstrap.page_limit).await?;
        let mut admiral = Self::from_bootstrap(transport, bootstrap, config.executor.cooldown_policy);
        admiral.session = Some(session);
        Ok(admiral)
    }

    pub fn from_bootstrap(transport: Arc<dyn Transport>, bootstrap: Bootstrap, policy: CooldownPolicy) -> Self {
        let (store, cooldowns) = bootstrap.seed();
        let (transaction_tx, transaction_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        let executor = ActionExecutor::new(transport, Arc::new(store), Arc::new(cooldowns))
            .with_policy(policy)
            .with_transaction_sink(transaction_tx);

        info!(?policy, "🎖️  admiral ready");

        Self {
            session: None,
            executor: Arc::new(executor),
            transactions: Some(transaction_rx),
            status_sender: status_tx,
            status_receiver: Some(status_rx),
            actors: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    pub fn executor(&self) -> &Arc<ActionExecutor> {
        &self.executor
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        self.executor.store()
    }

    pub fn cooldowns(&self) -> &Arc<CooldownTracker> {
        self.executor.cooldowns()
    }

    pub async fn execute(&self, action: Action) -> Result<ActionOutcome, ActionError> {
        self.executor.execute(action).await
    }

    /// Receiver for market, shipyard and mount transactions; available once.
    pub fn take_transactions(&mut self) -> Option<mpsc::UnboundedReceiver<TransactionEvent>> {
        self.transactions.take()
    }

    /// Receiver for ship actor status updates; available once.
    pub fn take_status_updates(&mut self) -> Option<mpsc::UnboundedReceiver<ShipStatusUpdate>> {
        self.status_receiver.take()
    }

    /// Returns the actor for `ship_symbol`, spawning it on first use.
    pub fn actor(&self, ship_symbol: &str) -> Result<ShipActorHandle, StoreError> {
        self.store().ship(ship_symbol)?;

        let mut actors = self.actors.lock().unwrap_or_else(PoisonError::into_inner);
        let (handle, _) = actors.entry(ship_symbol.to_string()).or_insert_with(|| {
            ShipActor::spawn(
                ship_symbol.to_string(),
                self.executor.clone(),
                self.status_sender.clone(),
            )
        });
        Ok(handle.clone())
    }

    pub fn fleet_status(&self) -> FleetStatus {
        let (snapshot, cooldowns) = self
            .store()
            .read_with(|state| (state.clone(), self.cooldowns().active()));
        FleetStatus {
            agent: snapshot.agent,
            ships: snapshot.ships.into_values().collect(),
            contracts: snapshot.contracts.into_values().collect(),
            cooldowns,
        }
    }

    /// Closes every actor's queue and waits for queued tasks to drain (callers
    /// must have dropped their handle clones), then ends the session.
    pub async fn shutdown(self) {
        let actors: Vec<(ShipActorHandle, JoinHandle<()>)> = self
            .actors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_values()
            .collect();

        for (handle, join) in actors {
            drop(handle);
            let _ = join.await;
        }

        if let Some(session) = &self.session {
            session.end();
        }
        info!("🎖️  admiral shut down");
    }
}

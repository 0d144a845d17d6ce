// Action executor - validate, gate, dispatch, apply
use std::collections::HashMap;
use std::future::{self, Future};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::client::Transport;
use crate::error::ActionError;
use crate::models::TransactionEvent;
use crate::operations::{Action, ActionOutcome, ResponsePlan};
use crate::storage::{CooldownTracker, EntityKey, EntityStore};

/// What to do when a gated action targets a ship that is still cooling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CooldownPolicy {
    /// Fail at once with `CooldownActive`.
    #[default]
    Reject,
    /// Suspend the action until the ship is ready (cancellable).
    Wait,
}

/// Runs actions against the shared store and cooldown tracker.
///
/// Actions touching the same ship or contract are serialized through
/// per-entity lanes; everything else runs concurrently. A failed action
/// writes nothing.
pub struct ActionExecutor {
    transport: Arc<dyn Transport>,
    store: Arc<EntityStore>,
    cooldowns: Arc<CooldownTracker>,
    policy: CooldownPolicy,
    lanes: Mutex<HashMap<EntityKey, Arc<AsyncMutex<()>>>>,
    transaction_sink: Option<mpsc::UnboundedSender<TransactionEvent>>,
}

impl ActionExecutor {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<EntityStore>, cooldowns: Arc<CooldownTracker>) -> Self {
        Self {
            transport,
            store,
            cooldowns,
            policy: CooldownPolicy::default(),
            lanes: Mutex::new(HashMap::new()),
            transaction_sink: None,
        }
    }

    pub fn with_policy(mut self, policy: CooldownPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Market, shipyard and mount transactions from applied actions are
    /// sent here as they land.
    pub fn with_transaction_sink(mut self, sink: mpsc::UnboundedSender<TransactionEvent>) -> Self {
        self.transaction_sink = Some(sink);
        self
    }

    pub fn policy(&self) -> CooldownPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn cooldowns(&self) -> &Arc<CooldownTracker> {
        &self.cooldowns
    }

    pub async fn execute(&self, action: Action) -> Result<ActionOutcome, ActionError> {
        self.execute_until(action, future::pending()).await
    }

    /// Like `execute`, but a `Wait`-policy cooldown wait is abandoned as soon
    /// as `cancel` resolves. Once dispatched, an action is never cancelled.
    pub async fn execute_until<C>(&self, action: Action, cancel: C) -> Result<ActionOutcome, ActionError>
    where
        C: Future<Output = ()>,
    {
        self.execute_with_policy(action, self.policy, cancel).await
    }

    pub(crate) async fn execute_with_policy<C>(
        &self,
        action: Action,
        policy: CooldownPolicy,
        cancel: C,
    ) -> Result<ActionOutcome, ActionError>
    where
        C: Future<Output = ()>,
    {
        let kind = action.kind();
        action.validate(Utc::now())?;

        let participants = action.participants();
        for key in &participants {
            if !self.store.contains(key) {
                debug!(action = %kind, %key, "target not in store");
                return Err(ActionError::NotFound {
                    kind: key.kind(),
                    key: key.id().to_string(),
                });
            }
        }

        tokio::pin!(cancel);
        let _lanes = loop {
            if let Some(ship) = action.gated_ship() {
                let remaining = self.cooldowns.remaining(ship);
                if !remaining.is_zero() {
                    if policy == CooldownPolicy::Reject {
                        return Err(ActionError::CooldownActive {
                            ship: ship.to_string(),
                            remaining,
                        });
                    }
                    info!(action = %kind, ship, remaining_secs = remaining.as_secs(), "⏳ waiting for cooldown");
                    tokio::select! {
                        _ = self.cooldowns.wait_ready(ship) => {}
                        _ = &mut cancel => {
                            info!(action = %kind, ship, "cooldown wait cancelled");
                            return Err(ActionError::Cancelled { ship: ship.to_string() });
                        }
                    }
                }
            }

            let lanes = self.acquire_lanes(&participants).await;

            // Another action on this ship may have armed a cooldown while we
            // queued for the lane.
            match action.gated_ship() {
                Some(ship) if !self.cooldowns.is_ready(ship) => {
                    drop(lanes);
                    if policy == CooldownPolicy::Reject {
                        return Err(ActionError::CooldownActive {
                            ship: ship.to_string(),
                            remaining: self.cooldowns.remaining(ship),
                        });
                    }
                }
                _ => break lanes,
            }
        };

        let request = action.request();
        debug!(action = %kind, method = %request.method, path = %request.path, "🚀 dispatching");

        let response = self
            .transport
            .call(&request.path, request.method, request.body)
            .await
            .map_err(|err| {
                warn!(action = %kind, code = err.code, message = %err.message, "action failed");
                ActionError::Transport(err)
            })?;

        let ResponsePlan {
            mutations,
            cooldown,
            transactions,
            outcome,
        } = action.plan(response).inspect_err(|err| {
            warn!(action = %kind, error = %err, "unusable response");
        })?;

        // The cooldown lands before the store lock is released, so a reader
        // using `read_with` never sees new state on a ship that looks ready.
        let mutation_count = mutations.len();
        self.store
            .apply_then(mutations, || match cooldown {
                Some((ship, 0)) => self.cooldowns.clear(&ship),
                Some((ship, remaining_seconds)) => self.cooldowns.arm(&ship, remaining_seconds),
                None => {}
            })
            .map_err(|err| ActionError::from_store(kind, err))?;

        if let Some(sink) = &self.transaction_sink {
            for event in transactions {
                if sink.send(event).is_err() {
                    debug!("transaction sink closed");
                    break;
                }
            }
        }

        info!(action = %kind, mutations = mutation_count, "✅ action applied");
        Ok(outcome)
    }

    fn lane(&self, key: &EntityKey) -> Arc<AsyncMutex<()>> {
        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    // Keys arrive sorted, so two actions sharing entities lock them in the
    // same order.
    async fn acquire_lanes(&self, keys: &[EntityKey]) -> Vec<OwnedMutexGuard<()>> {
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lane(key).lock_owned().await);
        }
        guards
    }
}

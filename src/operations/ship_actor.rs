// Ship Actor System - Per-ship asynchronous task queues
use std::future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ActionError;
use crate::operations::{Action, ActionExecutor, ActionKind, ActionOutcome, CooldownPolicy};

#[derive(Debug, Clone, PartialEq)]
pub enum ShipActorStatus {
    Idle,
    Working { task_id: u64, step: usize, action: ActionKind },
    OnCooldown { task_id: u64, step: usize, remaining: Duration },
    Completed { task_id: u64, steps: usize },
    Failed { task_id: u64, step: usize, error: ActionError },
    Cancelled { task_id: u64, step: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipStatusUpdate {
    pub ship_symbol: String,
    pub status: ShipActorStatus,
}

/// Result of one task: the outcomes of every step that applied, and the
/// error that stopped it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub task_id: u64,
    pub outcomes: Vec<ActionOutcome>,
    pub error: Option<ActionError>,
}

impl TaskReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShipActorError {
    #[error("actor for {0} has stopped")]
    Stopped(String),
    #[error("action {action} targets {target}, not {ship}")]
    WrongShip {
        ship: String,
        target: String,
        action: ActionKind,
    },
}

struct ShipTask {
    id: u64,
    actions: Vec<Action>,
    cancel: watch::Receiver<bool>,
    report: oneshot::Sender<TaskReport>,
}

/// Caller's side of a submitted task.
pub struct TaskHandle {
    id: u64,
    cancel: watch::Sender<bool>,
    report: oneshot::Receiver<TaskReport>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Abandons a pending cooldown wait and skips the remaining steps. A step
    /// already dispatched still completes.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub async fn wait(self) -> Result<TaskReport, ShipActorError> {
        // Keep the cancel sender alive until the report arrives
        let TaskHandle { cancel, report, id } = self;
        let result = report.await;
        drop(cancel);
        result.map_err(|_| ShipActorError::Stopped(format!("task {}", id)))
    }
}

/// Cloneable submission side of a running actor.
#[derive(Clone)]
pub struct ShipActorHandle {
    ship_symbol: String,
    sender: mpsc::UnboundedSender<ShipTask>,
    next_id: Arc<AtomicU64>,
}

impl ShipActorHandle {
    pub fn ship_symbol(&self) -> &str {
        &self.ship_symbol
    }

    /// Queues an ordered list of actions. Every action must act through this
    /// actor's ship.
    pub fn submit(&self, actions: Vec<Action>) -> Result<TaskHandle, ShipActorError> {
        for action in &actions {
            if let Some(target) = action.ship_symbol() {
                if target != self.ship_symbol {
                    return Err(ShipActorError::WrongShip {
                        ship: self.ship_symbol.clone(),
                        target: target.to_string(),
                        action: action.kind(),
                    });
                }
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (report_tx, report_rx) = oneshot::channel();

        self.sender
            .send(ShipTask {
                id,
                actions,
                cancel: cancel_rx,
                report: report_tx,
            })
            .map_err(|_| ShipActorError::Stopped(self.ship_symbol.clone()))?;

        Ok(TaskHandle {
            id,
            cancel: cancel_tx,
            report: report_rx,
        })
    }
}

/// Single writer for one ship: runs queued tasks one after another, waiting
/// out cooldowns between steps.
pub struct ShipActor {
    ship_symbol: String,
    executor: Arc<ActionExecutor>,
    task_receiver: mpsc::UnboundedReceiver<ShipTask>,
    status_sender: mpsc::UnboundedSender<ShipStatusUpdate>,
}

impl ShipActor {
    pub fn spawn(
        ship_symbol: String,
        executor: Arc<ActionExecutor>,
        status_sender: mpsc::UnboundedSender<ShipStatusUpdate>,
    ) -> (ShipActorHandle, JoinHandle<()>) {
        let (sender, task_receiver) = mpsc::unbounded_channel();
        let actor = ShipActor {
            ship_symbol: ship_symbol.clone(),
            executor,
            task_receiver,
            status_sender,
        };
        let join = tokio::spawn(actor.run());

        let handle = ShipActorHandle {
            ship_symbol,
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        };
        (handle, join)
    }

    pub async fn run(mut self) {
        info!(ship = %self.ship_symbol, "🤖 actor started");
        self.send_status(ShipActorStatus::Idle);

        while let Some(task) = self.task_receiver.recv().await {
            let report = self.run_task(task.id, task.actions, task.cancel).await;
            if task.report.send(report).is_err() {
                debug!(ship = %self.ship_symbol, "task handle dropped before report");
            }
            self.send_status(ShipActorStatus::Idle);
        }

        info!(ship = %self.ship_symbol, "🛑 actor stopping - channel closed");
    }

    async fn run_task(&self, task_id: u64, actions: Vec<Action>, cancel: watch::Receiver<bool>) -> TaskReport {
        let steps = actions.len();
        let mut outcomes = Vec::with_capacity(steps);

        for (step, action) in actions.into_iter().enumerate() {
            if *cancel.borrow() {
                self.send_status(ShipActorStatus::Cancelled { task_id, step });
                return TaskReport {
                    task_id,
                    outcomes,
                    error: Some(ActionError::Cancelled {
                        ship: self.ship_symbol.clone(),
                    }),
                };
            }

            if let Some(ship) = action.gated_ship() {
                let remaining = self.executor.cooldowns().remaining(ship);
                if !remaining.is_zero() {
                    self.send_status(ShipActorStatus::OnCooldown {
                        task_id,
                        step,
                        remaining,
                    });
                }
            }
            self.send_status(ShipActorStatus::Working {
                task_id,
                step,
                action: action.kind(),
            });

            let mut cancel_rx = cancel.clone();
            let cancelled = async move {
                loop {
                    if *cancel_rx.borrow_and_update() {
                        return;
                    }
                    // A dropped handle means nobody can cancel any more
                    if cancel_rx.changed().await.is_err() {
                        future::pending::<()>().await;
                    }
                }
            };

            match self
                .executor
                .execute_with_policy(action, CooldownPolicy::Wait, cancelled)
                .await
            {
                Ok(outcome) => outcomes.push(outcome),
                Err(ActionError::Cancelled { ship }) => {
                    self.send_status(ShipActorStatus::Cancelled { task_id, step });
                    return TaskReport {
                        task_id,
                        outcomes,
                        error: Some(ActionError::Cancelled { ship }),
                    };
                }
                Err(error) => {
                    warn!(ship = %self.ship_symbol, task_id, step, %error, "task stopped");
                    self.send_status(ShipActorStatus::Failed {
                        task_id,
                        step,
                        error: error.clone(),
                    });
                    return TaskReport {
                        task_id,
                        outcomes,
                        error: Some(error),
                    };
                }
            }
        }

        self.send_status(ShipActorStatus::Completed { task_id, steps });
        TaskReport {
            task_id,
            outcomes,
            error: None,
        }
    }

    fn send_status(&self, status: ShipActorStatus) {
        let update = ShipStatusUpdate {
            ship_symbol: self.ship_symbol.clone(),
            status,
        };
        if self.status_sender.send(update).is_err() {
            debug!(ship = %self.ship_symbol, "status receiver dropped");
        }
    }
}

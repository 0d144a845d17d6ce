// Initial snapshot of agent, fleet and contracts
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{Method, Transport};
use crate::error::ApiError;
use crate::models::{Agent, Contract, Envelope, Paged, Ship, ShipCooldown};
use crate::storage::{CooldownTracker, EntityStore};

/// Largest page the service accepts.
pub const MAX_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BootstrapError {
    #[error("bootstrap request to {path} failed: {source}")]
    Transport { path: String, source: ApiError },
    #[error("unexpected payload from {path}: {reason}")]
    Malformed { path: String, reason: String },
}

/// Everything needed to seed the store and the cooldown tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Bootstrap {
    pub agent: Agent,
    pub ships: Vec<Ship>,
    pub contracts: Vec<Contract>,
    pub cooldowns: Vec<ShipCooldown>,
}

impl Bootstrap {
    pub fn new(agent: Agent, ships: Vec<Ship>, contracts: Vec<Contract>) -> Self {
        Self {
            agent,
            ships,
            contracts,
            cooldowns: Vec::new(),
        }
    }

    pub fn with_cooldowns(mut self, cooldowns: Vec<ShipCooldown>) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    /// Builds the store and tracker. Explicit cooldowns win over the ones
    /// embedded in ship records.
    pub fn seed(self) -> (EntityStore, CooldownTracker) {
        let tracker = CooldownTracker::new();

        for ship in &self.ships {
            if let Some(cooldown) = &ship.cooldown {
                if cooldown.remaining_seconds > 0 {
                    tracker.arm(&ship.symbol, cooldown.remaining_seconds);
                }
            }
        }
        for cooldown in &self.cooldowns {
            if let Some(ship) = &cooldown.ship_symbol {
                tracker.arm(ship, cooldown.remaining_seconds);
            }
        }

        let store = EntityStore::seeded(self.agent, self.ships, self.contracts);
        (store, tracker)
    }
}

async fn get<T: DeserializeOwned>(transport: &dyn Transport, path: &str) -> Result<T, BootstrapError> {
    let value = get_raw(transport, path).await?;
    decode(path, value)
}

async fn get_raw(transport: &dyn Transport, path: &str) -> Result<Value, BootstrapError> {
    debug!(path, "bootstrap fetch");
    transport
        .call(path, Method::Get, None)
        .await
        .map_err(|source| BootstrapError::Transport {
            path: path.to_string(),
            source,
        })
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, BootstrapError> {
    serde_json::from_value(value).map_err(|e| BootstrapError::Malformed {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Walks `?limit=&page=` until `meta.total` items have been collected.
pub async fn fetch_all<T: DeserializeOwned>(
    transport: &dyn Transport,
    path: &str,
    page_limit: u32,
) -> Result<Vec<T>, BootstrapError> {
    let limit = page_limit.clamp(1, MAX_PAGE_LIMIT);
    let mut items = Vec::new();
    let mut page = 1;

    loop {
        let paged_path = format!("{}?limit={}&page={}", path, limit, page);
        let paged: Paged<T> = get(transport, &paged_path).await?;
        let received = paged.data.len();
        items.extend(paged.data);

        // An empty page means the total shrank underneath us
        if received == 0 || items.len() >= paged.meta.total as usize {
            break;
        }
        page += 1;
    }

    Ok(items)
}

/// Reads the ship's active cooldown; the service answers 204 when there is none.
pub async fn fetch_cooldown(
    transport: &dyn Transport,
    ship_symbol: &str,
) -> Result<Option<ShipCooldown>, BootstrapError> {
    let path = format!("my/ships/{}/cooldown", ship_symbol);
    match get_raw(transport, &path).await? {
        Value::Null => Ok(None),
        value => {
            let mut cooldown = decode::<Envelope<ShipCooldown>>(&path, value)?.data;
            cooldown.ship_symbol.get_or_insert_with(|| ship_symbol.to_string());
            Ok(Some(cooldown))
        }
    }
}

pub async fn fetch_snapshot(transport: &dyn Transport, page_limit: u32) -> Result<Bootstrap, BootstrapError> {
    let agent: Envelope<Agent> = get(transport, "my/agent").await?;
    let ships: Vec<Ship> = fetch_all(transport, "my/ships", page_limit).await?;
    let contracts: Vec<Contract> = fetch_all(transport, "my/contracts", page_limit).await?;

    let mut cooldowns = Vec::new();
    for ship in &ships {
        if let Some(cooldown) = fetch_cooldown(transport, &ship.symbol).await? {
            cooldowns.push(cooldown);
        }
    }

    info!(
        agent = %agent.data.symbol,
        credits = agent.data.credits,
        ships = ships.len(),
        contracts = contracts.len(),
        cooldowns = cooldowns.len(),
        "📋 bootstrap snapshot fetched"
    );

    Ok(Bootstrap {
        agent: agent.data,
        ships,
        contracts,
        cooldowns,
    })
}

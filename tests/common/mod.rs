#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use spacetraders_sync::models::{Agent, Contract, FlightMode, Ship};
use spacetraders_sync::operations::RefineProduce;
use spacetraders_sync::{
    Action, ActionExecutor, ActionKind, ApiError, CooldownPolicy, CooldownTracker, EntityStore, Method, Transport,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Scripted transport: responses are queued per (method, path) and handed
/// out in order. Unscripted calls fail with a 404-style error.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<(Method, String), VecDeque<Result<Value, ApiError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn respond(&self, method: Method, path: &str, response: Result<Value, ApiError>) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Queues `{"data": data}` as a success.
    pub fn ok(&self, method: Method, path: &str, data: Value) {
        self.respond(method, path, Ok(json!({ "data": data })));
    }

    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.respond(method, path, Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, path: &str, method: Method, body: Option<Value>) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&(method, path.to_string()))
            .and_then(|queue| queue.pop_front());

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response.unwrap_or_else(|| Err(ApiError::new(404, format!("no scripted response for {} {}", method, path))))
    }
}

pub fn agent_json(credits: i64) -> Value {
    json!({
        "accountId": "acc-1",
        "symbol": "TRADER",
        "headquarters": "X1-DF55-20250Z",
        "credits": credits,
        "startingFaction": "COSMIC",
        "shipCount": 2
    })
}

pub fn nav_json(waypoint: &str, status: &str) -> Value {
    json!({
        "systemSymbol": "X1-DF55",
        "waypointSymbol": waypoint,
        "route": {
            "destination": {"symbol": waypoint, "type": "ASTEROID_FIELD", "systemSymbol": "X1-DF55", "x": 10, "y": 4},
            "origin": {"symbol": waypoint, "type": "ASTEROID_FIELD", "systemSymbol": "X1-DF55", "x": 10, "y": 4},
            "departureTime": "2023-06-01T12:00:00.000Z",
            "arrival": "2023-06-01T12:00:00.000Z"
        },
        "status": status,
        "flightMode": "CRUISE"
    })
}

pub fn cargo_json(capacity: u32, lines: &[(&str, u32)]) -> Value {
    let units: u32 = lines.iter().map(|(_, units)| *units).sum();
    let inventory: Vec<Value> = lines
        .iter()
        .map(|(symbol, units)| json!({"symbol": symbol, "name": symbol, "description": "", "units": units}))
        .collect();
    json!({"capacity": capacity, "units": units, "inventory": inventory})
}

pub fn cooldown_json(ship: &str, remaining: u64) -> Value {
    json!({
        "shipSymbol": ship,
        "totalSeconds": remaining,
        "remainingSeconds": remaining,
        "expiration": "2023-06-01T12:01:20.000Z"
    })
}

pub fn ship_json(symbol: &str, cargo: Value) -> Value {
    json!({
        "symbol": symbol,
        "registration": {"name": symbol, "factionSymbol": "COSMIC", "role": "EXCAVATOR"},
        "nav": nav_json("X1-DF55-17335A", "IN_ORBIT"),
        "frame": {"symbol": "FRAME_MINER", "name": "Miner"},
        "reactor": {"symbol": "REACTOR_FISSION_I", "name": "Fission"},
        "engine": {"symbol": "ENGINE_ION_DRIVE_I", "name": "Ion"},
        "modules": [],
        "mounts": [{"symbol": "MOUNT_MINING_LASER_I", "name": "Mining Laser"}],
        "cargo": cargo,
        "fuel": {"current": 80, "capacity": 100}
    })
}

pub fn contract_json(id: &str, accepted: bool, fulfilled_units: u32) -> Value {
    json!({
        "id": id,
        "factionSymbol": "COSMIC",
        "type": "PROCUREMENT",
        "terms": {
            "deadline": "2030-01-01T00:00:00.000Z",
            "payment": {"onAccepted": 2000, "onFulfilled": 10000},
            "deliver": [{
                "tradeSymbol": "IRON_ORE",
                "destinationSymbol": "X1-DF55-20250Z",
                "unitsRequired": 30,
                "unitsFulfilled": fulfilled_units
            }]
        },
        "accepted": accepted,
        "fulfilled": false,
        "expiration": "2030-01-01T00:00:00.000Z",
        "deadlineToAccept": "2029-12-01T00:00:00.000Z"
    })
}

pub fn fuel_json(current: u32) -> Value {
    json!({"current": current, "capacity": 100})
}

pub fn waypoint_json(symbol: &str) -> Value {
    json!({"symbol": symbol, "type": "ASTEROID_FIELD", "systemSymbol": "X1-DF55", "x": 10, "y": 4})
}

pub fn market_transaction_json(ship: &str, kind: &str, units: u32, price: i64) -> Value {
    json!({
        "waypointSymbol": "X1-DF55-17335A",
        "shipSymbol": ship,
        "tradeSymbol": "IRON_ORE",
        "type": kind,
        "units": units,
        "pricePerUnit": price,
        "totalPrice": price * i64::from(units),
        "timestamp": "2023-06-01T12:00:00.000Z"
    })
}

pub fn modification_transaction_json(ship: &str, mount: &str, price: i64) -> Value {
    json!({
        "waypointSymbol": "X1-DF55-17335A",
        "shipSymbol": ship,
        "tradeSymbol": mount,
        "totalPrice": price,
        "timestamp": "2023-06-01T12:00:00.000Z"
    })
}

pub fn mount_json(symbol: &str) -> Value {
    json!({"symbol": symbol, "name": symbol})
}

/// One well-formed action of `kind` against ship S1 (S2 receives transfers)
/// and contract C1, with a success payload carrying every optional part.
pub fn sample_action(kind: ActionKind) -> (Action, Value) {
    let s1 = || "S1".to_string();
    let c1 = || "C1".to_string();
    let cargo = || cargo_json(40, &[("IRON_ORE", 10)]);

    match kind {
        ActionKind::Orbit => (
            Action::Orbit { ship_symbol: s1() },
            json!({"nav": nav_json("X1-DF55-17335A", "IN_ORBIT")}),
        ),
        ActionKind::Dock => (
            Action::Dock { ship_symbol: s1() },
            json!({"nav": nav_json("X1-DF55-17335A", "DOCKED")}),
        ),
        ActionKind::Navigate => (
            Action::Navigate {
                ship_symbol: s1(),
                waypoint_symbol: "X1-DF55-69207D".to_string(),
            },
            json!({"nav": nav_json("X1-DF55-69207D", "IN_TRANSIT"), "fuel": fuel_json(60)}),
        ),
        ActionKind::Warp => (
            Action::Warp {
                ship_symbol: s1(),
                waypoint_symbol: "X1-KK12-A1".to_string(),
            },
            json!({"nav": nav_json("X1-KK12-A1", "IN_TRANSIT"), "fuel": fuel_json(20)}),
        ),
        ActionKind::Jump => (
            Action::Jump {
                ship_symbol: s1(),
                system_symbol: "X1-KK12".to_string(),
            },
            json!({
                "nav": nav_json("X1-KK12-GATE", "IN_ORBIT"),
                "cooldown": cooldown_json("S1", 60),
                "agent": agent_json(99_000)
            }),
        ),
        ActionKind::PatchNav => (
            Action::PatchNav {
                ship_symbol: s1(),
                flight_mode: FlightMode::Burn,
            },
            json!({"nav": nav_json("X1-DF55-17335A", "IN_ORBIT"), "fuel": fuel_json(80)}),
        ),
        ActionKind::Extract => (
            Action::Extract {
                ship_symbol: s1(),
                survey: None,
            },
            json!({
                "cooldown": cooldown_json("S1", 80),
                "extraction": {"shipSymbol": "S1", "yield": {"symbol": "IRON_ORE", "units": 10}},
                "cargo": cargo()
            }),
        ),
        ActionKind::Survey => (
            Action::Survey { ship_symbol: s1() },
            json!({
                "cooldown": cooldown_json("S1", 70),
                "surveys": [{
                    "signature": "X1-DF55-17335A-BD5E4A",
                    "symbol": "X1-DF55-17335A",
                    "deposits": [{"symbol": "IRON_ORE"}, {"symbol": "QUARTZ_SAND"}],
                    "expiration": "2030-01-01T00:00:00.000Z",
                    "size": "MODERATE"
                }]
            }),
        ),
        ActionKind::Chart => (
            Action::Chart { ship_symbol: s1() },
            json!({
                "chart": {"waypointSymbol": "X1-DF55-17335A", "submittedBy": "COSMIC", "submittedOn": "2023-06-01T12:00:00.000Z"},
                "waypoint": waypoint_json("X1-DF55-17335A")
            }),
        ),
        ActionKind::ScanSystems => (
            Action::ScanSystems { ship_symbol: s1() },
            json!({
                "cooldown": cooldown_json("S1", 50),
                "systems": [{"symbol": "X1-KK12", "sectorSymbol": "X1", "type": "RED_STAR", "x": 3, "y": 7, "distance": 40}]
            }),
        ),
        ActionKind::ScanWaypoints => (
            Action::ScanWaypoints { ship_symbol: s1() },
            json!({"cooldown": cooldown_json("S1", 50), "waypoints": [waypoint_json("X1-DF55-69207D")]}),
        ),
        ActionKind::ScanShips => (
            Action::ScanShips { ship_symbol: s1() },
            json!({
                "cooldown": cooldown_json("S1", 50),
                "ships": [{
                    "symbol": "RIVAL-1",
                    "registration": {"name": "RIVAL-1", "factionSymbol": "VOID", "role": "HAULER"},
                    "nav": nav_json("X1-DF55-17335A", "IN_ORBIT"),
                    "engine": {"symbol": "ENGINE_ION_DRIVE_I"}
                }]
            }),
        ),
        ActionKind::PurchaseCargo => (
            Action::PurchaseCargo {
                ship_symbol: s1(),
                trade_symbol: "IRON_ORE".to_string(),
                units: 10,
            },
            json!({
                "agent": agent_json(99_500),
                "cargo": cargo(),
                "transaction": market_transaction_json("S1", "PURCHASE", 10, 50)
            }),
        ),
        ActionKind::SellCargo => (
            Action::SellCargo {
                ship_symbol: s1(),
                trade_symbol: "IRON_ORE".to_string(),
                units: 10,
            },
            json!({
                "agent": agent_json(100_500),
                "cargo": cargo_json(40, &[]),
                "transaction": market_transaction_json("S1", "SELL", 10, 50)
            }),
        ),
        ActionKind::JettisonCargo => (
            Action::JettisonCargo {
                ship_symbol: s1(),
                trade_symbol: "IRON_ORE".to_string(),
                units: 10,
            },
            json!({"cargo": cargo_json(40, &[])}),
        ),
        ActionKind::TransferCargo => (
            Action::TransferCargo {
                ship_symbol: s1(),
                target_ship: "S2".to_string(),
                trade_symbol: "IRON_ORE".to_string(),
                units: 10,
            },
            json!({"cargo": cargo_json(40, &[]), "targetCargo": cargo()}),
        ),
        ActionKind::Refuel => (
            Action::Refuel {
                ship_symbol: s1(),
                units: None,
            },
            json!({
                "agent": agent_json(99_900),
                "fuel": fuel_json(100),
                "transaction": market_transaction_json("S1", "PURCHASE", 20, 5)
            }),
        ),
        ActionKind::InstallMount => (
            Action::InstallMount {
                ship_symbol: s1(),
                mount_symbol: "MOUNT_SURVEYOR_I".to_string(),
            },
            json!({
                "agent": agent_json(95_000),
                "mounts": [mount_json("MOUNT_MINING_LASER_I"), mount_json("MOUNT_SURVEYOR_I")],
                "cargo": cargo_json(40, &[]),
                "transaction": modification_transaction_json("S1", "MOUNT_SURVEYOR_I", 5_000)
            }),
        ),
        ActionKind::RemoveMount => (
            Action::RemoveMount {
                ship_symbol: s1(),
                mount_symbol: "MOUNT_MINING_LASER_I".to_string(),
            },
            json!({
                "agent": agent_json(99_000),
                "mounts": [],
                "cargo": cargo_json(40, &[("MOUNT_MINING_LASER_I", 1)]),
                "transaction": modification_transaction_json("S1", "MOUNT_MINING_LASER_I", 1_000)
            }),
        ),
        ActionKind::Refine => (
            Action::Refine {
                ship_symbol: s1(),
                produce: RefineProduce::Iron,
            },
            json!({
                "cargo": cargo_json(40, &[("IRON", 10), ("IRON_ORE", 0)]),
                "cooldown": cooldown_json("S1", 90),
                "produced": [{"tradeSymbol": "IRON", "units": 10}],
                "consumed": [{"tradeSymbol": "IRON_ORE", "units": 30}]
            }),
        ),
        ActionKind::NegotiateContract => (
            Action::NegotiateContract { ship_symbol: s1() },
            json!({"contract": contract_json("C-NEW", false, 0)}),
        ),
        ActionKind::AcceptContract => (
            Action::AcceptContract { contract_id: c1() },
            json!({"agent": agent_json(102_000), "contract": contract_json("C1", true, 0)}),
        ),
        ActionKind::FulfillContract => {
            let mut contract = contract_json("C1", true, 30);
            contract["fulfilled"] = json!(true);
            (
                Action::FulfillContract { contract_id: c1() },
                json!({"agent": agent_json(110_000), "contract": contract}),
            )
        }
        ActionKind::DeliverContract => (
            Action::DeliverContract {
                contract_id: c1(),
                ship_symbol: s1(),
                trade_symbol: "IRON_ORE".to_string(),
                units: 10,
            },
            json!({"contract": contract_json("C1", true, 10), "cargo": cargo_json(40, &[])}),
        ),
        ActionKind::PurchaseShip => (
            Action::PurchaseShip {
                ship_type: "SHIP_MINING_DRONE".to_string(),
                waypoint_symbol: "X1-DF55-20250Z".to_string(),
            },
            json!({
                "agent": agent_json(20_000),
                "ship": ship_json("S9", cargo_json(30, &[])),
                "transaction": {
                    "waypointSymbol": "X1-DF55-20250Z",
                    "shipSymbol": "S9",
                    "shipType": "SHIP_MINING_DRONE",
                    "price": 80_000,
                    "agentSymbol": "TRADER",
                    "timestamp": "2023-06-01T12:00:00.000Z"
                }
            }),
        ),
        ActionKind::RefreshAgent => (Action::RefreshAgent, agent_json(123_456)),
        ActionKind::RefreshShip => {
            let mut refreshed = ship_json("S1", cargo());
            refreshed["cooldown"] = cooldown_json("S1", 15);
            (Action::RefreshShip { ship_symbol: s1() }, refreshed)
        }
        ActionKind::RefreshContract => (
            Action::RefreshContract { contract_id: c1() },
            contract_json("C1", true, 12),
        ),
    }
}

pub fn agent(credits: i64) -> Agent {
    serde_json::from_value(agent_json(credits)).unwrap()
}

pub fn ship(symbol: &str, lines: &[(&str, u32)]) -> Ship {
    serde_json::from_value(ship_json(symbol, cargo_json(40, lines))).unwrap()
}

pub fn contract(id: &str, accepted: bool, fulfilled_units: u32) -> Contract {
    serde_json::from_value(contract_json(id, accepted, fulfilled_units)).unwrap()
}

/// Executor over a store seeded with the given ships and contracts.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub executor: Arc<ActionExecutor>,
}

impl Harness {
    pub fn new(transport: MockTransport, ships: Vec<Ship>, contracts: Vec<Contract>) -> Self {
        Self::with_policy(transport, ships, contracts, CooldownPolicy::Reject)
    }

    pub fn with_policy(
        transport: MockTransport,
        ships: Vec<Ship>,
        contracts: Vec<Contract>,
        policy: CooldownPolicy,
    ) -> Self {
        let transport = Arc::new(transport);
        let store = Arc::new(EntityStore::seeded(agent(100_000), ships, contracts));
        let executor = ActionExecutor::new(transport.clone(), store, Arc::new(CooldownTracker::new())).with_policy(policy);
        Self {
            transport,
            executor: Arc::new(executor),
        }
    }

    pub fn store(&self) -> &EntityStore {
        self.executor.store()
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        self.executor.cooldowns()
    }
}

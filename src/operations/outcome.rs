// Response decoding and the mutation plan derived from it
use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ActionError;
use crate::models::*;
use crate::operations::{Action, ActionKind, ActionSpec};
use crate::storage::{ContractPatch, EntityKind, Mutation, ShipPatch};

/// Typed success value handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Nav(ShipNav),
    Navigation {
        nav: ShipNav,
        fuel: ShipFuel,
    },
    Jump {
        nav: ShipNav,
        cooldown: ShipCooldown,
    },
    FlightMode {
        nav: ShipNav,
        fuel: Option<ShipFuel>,
    },
    Extraction {
        extraction: Extraction,
        cargo: ShipCargo,
        cooldown: ShipCooldown,
    },
    Surveys {
        surveys: Vec<Survey>,
        cooldown: ShipCooldown,
    },
    Chart {
        chart: Chart,
        waypoint: Waypoint,
    },
    SystemScan {
        systems: Vec<ScannedSystem>,
        cooldown: ShipCooldown,
    },
    WaypointScan {
        waypoints: Vec<Waypoint>,
        cooldown: ShipCooldown,
    },
    ShipScan {
        ships: Vec<ScannedShip>,
        cooldown: ShipCooldown,
    },
    Trade {
        agent: Agent,
        cargo: ShipCargo,
        transaction: MarketTransaction,
    },
    Cargo(ShipCargo),
    Transfer {
        cargo: ShipCargo,
        target_cargo: Option<ShipCargo>,
    },
    Refuel {
        agent: Agent,
        fuel: ShipFuel,
        transaction: MarketTransaction,
    },
    MountChange {
        agent: Agent,
        mounts: Vec<ShipMount>,
        cargo: ShipCargo,
        transaction: ShipModificationTransaction,
    },
    Refine {
        cargo: ShipCargo,
        produced: Vec<RefineItem>,
        consumed: Vec<RefineItem>,
        cooldown: ShipCooldown,
    },
    Contract(Contract),
    ContractUpdate {
        agent: Agent,
        contract: Contract,
    },
    Delivery {
        contract: Contract,
        cargo: ShipCargo,
    },
    ShipPurchase {
        agent: Agent,
        ship: Box<Ship>,
        transaction: ShipyardTransaction,
    },
    Agent(Agent),
    Ship(Box<Ship>),
}

/// Everything an applied action writes: the store batch, then the cooldown.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePlan {
    pub mutations: Vec<Mutation>,
    /// (ship symbol, remaining seconds) to arm after the batch lands.
    pub cooldown: Option<(String, u64)>,
    pub transactions: Vec<TransactionEvent>,
    pub outcome: ActionOutcome,
}

impl ResponsePlan {
    fn new(outcome: ActionOutcome) -> Self {
        Self {
            mutations: Vec::new(),
            cooldown: None,
            transactions: Vec::new(),
            outcome,
        }
    }

    fn mutate(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    fn patch_ship(self, symbol: &str, patch: ShipPatch) -> Self {
        self.mutate(Mutation::PatchShip {
            symbol: symbol.to_string(),
            patch,
        })
    }

    fn agent(self, agent: &Agent) -> Self {
        self.mutate(Mutation::ReplaceAgent(agent.clone()))
    }

    fn arm(mut self, ship: &str, cooldown: &ShipCooldown) -> Self {
        self.cooldown = Some((ship.to_string(), cooldown.remaining_seconds));
        self
    }

    fn publish(mut self, event: TransactionEvent) -> Self {
        self.transactions.push(event);
        self
    }

    /// Fields the store batch replaces: slice names for patches, `agent` for
    /// an agent replacement, `ship` / `contract` for whole-record upserts.
    pub fn touched_fields(&self) -> BTreeSet<&'static str> {
        let mut fields = BTreeSet::new();
        for mutation in &self.mutations {
            match mutation {
                Mutation::ReplaceAgent(_) => {
                    fields.insert("agent");
                }
                Mutation::UpsertShip(_) => {
                    fields.insert("ship");
                }
                Mutation::UpsertContract(_) => {
                    fields.insert("contract");
                }
                Mutation::PatchShip { patch, .. } => fields.extend(patch.field_names()),
                Mutation::PatchContract { patch, .. } => fields.extend(patch.field_names()),
            }
        }
        fields
    }

    /// Checks the plan against the catalog entry for its kind. Ship cargo
    /// may be written by a contract action that declares `cargo` (delivery).
    pub fn conforms_to(&self, spec: &ActionSpec) -> Result<(), String> {
        if self.cooldown.is_some() != spec.arms_cooldown {
            return Err(format!(
                "{} declares arms_cooldown={} but the plan disagrees",
                spec.kind, spec.arms_cooldown
            ));
        }

        for field in self.touched_fields() {
            let declared = spec.mutates.contains(&field) || (field == "agent" && spec.replaces_agent);
            if !declared {
                return Err(format!("{} writes undeclared field `{}`", spec.kind, field));
            }
        }

        for mutation in &self.mutations {
            let kind = mutation.key().kind();
            let allowed = kind == spec.target
                || kind == EntityKind::Agent
                || (kind == EntityKind::Ship && spec.mutates.contains(&"cargo"));
            if !allowed {
                return Err(format!("{} writes a {} but targets a {}", spec.kind, kind, spec.target));
            }
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(kind: ActionKind, response: Value) -> Result<T, ActionError> {
    serde_json::from_value::<Envelope<T>>(response)
        .map(|envelope| envelope.data)
        .map_err(|e| ActionError::MalformedResponse {
            kind,
            reason: e.to_string(),
        })
}

fn malformed(kind: ActionKind, reason: impl Into<String>) -> ActionError {
    ActionError::MalformedResponse {
        kind,
        reason: reason.into(),
    }
}

// A cooldown without a ship symbol belongs to the ship that acted; one
// naming another ship is a mismatch.
fn check_cooldown(kind: ActionKind, ship: &str, cooldown: &ShipCooldown) -> Result<(), ActionError> {
    match cooldown.ship_symbol.as_deref() {
        Some(reported) if reported != ship => Err(malformed(
            kind,
            format!("cooldown reported for {} instead of {}", reported, ship),
        )),
        _ => Ok(()),
    }
}

fn nav_patch(nav: ShipNav) -> ShipPatch {
    ShipPatch {
        nav: Some(nav),
        ..Default::default()
    }
}

fn cargo_patch(cargo: ShipCargo) -> ShipPatch {
    ShipPatch {
        cargo: Some(cargo),
        ..Default::default()
    }
}

impl Action {
    /// Maps a success payload to the writes this kind declares. Nothing is
    /// applied here; a decode failure means nothing will be.
    pub fn plan(&self, response: Value) -> Result<ResponsePlan, ActionError> {
        let kind = self.kind();

        let plan = match self {
            Action::Orbit { ship_symbol } | Action::Dock { ship_symbol } => {
                let data: NavData = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Nav(data.nav.clone()))
                    .patch_ship(ship_symbol, nav_patch(data.nav))
            }

            Action::Navigate { ship_symbol, .. } | Action::Warp { ship_symbol, .. } => {
                let data: NavigationData = decode(kind, response)?;
                let patch = ShipPatch {
                    nav: Some(data.nav.clone()),
                    fuel: Some(data.fuel.clone()),
                    ..Default::default()
                };
                ResponsePlan::new(ActionOutcome::Navigation {
                    nav: data.nav,
                    fuel: data.fuel,
                })
                .patch_ship(ship_symbol, patch)
            }

            Action::Jump { ship_symbol, .. } => {
                let data: JumpData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                let mut plan = ResponsePlan::new(ActionOutcome::Jump {
                    nav: data.nav.clone(),
                    cooldown: data.cooldown.clone(),
                })
                .patch_ship(ship_symbol, nav_patch(data.nav))
                .arm(ship_symbol, &data.cooldown);
                if let Some(agent) = &data.agent {
                    plan = plan.agent(agent);
                }
                plan
            }

            Action::PatchNav { ship_symbol, .. } => {
                let data: PatchNavData = decode(kind, response)?;
                let (nav, fuel) = data.into_parts();
                let patch = ShipPatch {
                    nav: Some(nav.clone()),
                    fuel: fuel.clone(),
                    ..Default::default()
                };
                ResponsePlan::new(ActionOutcome::FlightMode { nav, fuel }).patch_ship(ship_symbol, patch)
            }

            Action::Extract { ship_symbol, .. } => {
                let data: ExtractionData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                ResponsePlan::new(ActionOutcome::Extraction {
                    extraction: data.extraction,
                    cargo: data.cargo.clone(),
                    cooldown: data.cooldown.clone(),
                })
                .patch_ship(ship_symbol, cargo_patch(data.cargo))
                .arm(ship_symbol, &data.cooldown)
            }

            Action::Survey { ship_symbol } => {
                let data: SurveyData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                ResponsePlan::new(ActionOutcome::Surveys {
                    surveys: data.surveys,
                    cooldown: data.cooldown.clone(),
                })
                .arm(ship_symbol, &data.cooldown)
            }

            Action::Chart { .. } => {
                let data: ChartData = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Chart {
                    chart: data.chart,
                    waypoint: data.waypoint,
                })
            }

            Action::ScanSystems { ship_symbol } => {
                let data: SystemScanData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                ResponsePlan::new(ActionOutcome::SystemScan {
                    systems: data.systems,
                    cooldown: data.cooldown.clone(),
                })
                .arm(ship_symbol, &data.cooldown)
            }

            Action::ScanWaypoints { ship_symbol } => {
                let data: WaypointScanData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                ResponsePlan::new(ActionOutcome::WaypointScan {
                    waypoints: data.waypoints,
                    cooldown: data.cooldown.clone(),
                })
                .arm(ship_symbol, &data.cooldown)
            }

            Action::ScanShips { ship_symbol } => {
                let data: ShipScanData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                ResponsePlan::new(ActionOutcome::ShipScan {
                    ships: data.ships,
                    cooldown: data.cooldown.clone(),
                })
                .arm(ship_symbol, &data.cooldown)
            }

            Action::PurchaseCargo { ship_symbol, .. } | Action::SellCargo { ship_symbol, .. } => {
                let data: TradeData = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Trade {
                    agent: data.agent.clone(),
                    cargo: data.cargo.clone(),
                    transaction: data.transaction.clone(),
                })
                .patch_ship(ship_symbol, cargo_patch(data.cargo))
                .agent(&data.agent)
                .publish(TransactionEvent::Market(data.transaction))
            }

            Action::JettisonCargo { ship_symbol, .. } => {
                let data: CargoData = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Cargo(data.cargo.clone()))
                    .patch_ship(ship_symbol, cargo_patch(data.cargo))
            }

            Action::TransferCargo {
                ship_symbol,
                target_ship,
                ..
            } => {
                let data: TransferCargoData = decode(kind, response)?;
                let mut plan = ResponsePlan::new(ActionOutcome::Transfer {
                    cargo: data.cargo.clone(),
                    target_cargo: data.target_cargo.clone(),
                })
                .patch_ship(ship_symbol, cargo_patch(data.cargo));
                // The receiver is only touched when the service reports its hold
                if let Some(target_cargo) = data.target_cargo {
                    plan = plan.patch_ship(target_ship, cargo_patch(target_cargo));
                }
                plan
            }

            Action::Refuel { ship_symbol, .. } => {
                let data: RefuelData = decode(kind, response)?;
                let patch = ShipPatch {
                    fuel: Some(data.fuel.clone()),
                    ..Default::default()
                };
                ResponsePlan::new(ActionOutcome::Refuel {
                    agent: data.agent.clone(),
                    fuel: data.fuel,
                    transaction: data.transaction.clone(),
                })
                .patch_ship(ship_symbol, patch)
                .agent(&data.agent)
                .publish(TransactionEvent::Market(data.transaction))
            }

            Action::InstallMount { ship_symbol, .. } | Action::RemoveMount { ship_symbol, .. } => {
                let data: MountChangeData = decode(kind, response)?;
                let patch = ShipPatch {
                    mounts: Some(data.mounts.clone()),
                    cargo: Some(data.cargo.clone()),
                    ..Default::default()
                };
                ResponsePlan::new(ActionOutcome::MountChange {
                    agent: data.agent.clone(),
                    mounts: data.mounts,
                    cargo: data.cargo,
                    transaction: data.transaction.clone(),
                })
                .patch_ship(ship_symbol, patch)
                .agent(&data.agent)
                .publish(TransactionEvent::Modification(data.transaction))
            }

            Action::Refine { ship_symbol, .. } => {
                let data: RefineData = decode(kind, response)?;
                check_cooldown(kind, ship_symbol, &data.cooldown)?;
                ResponsePlan::new(ActionOutcome::Refine {
                    cargo: data.cargo.clone(),
                    produced: data.produced,
                    consumed: data.consumed,
                    cooldown: data.cooldown.clone(),
                })
                .patch_ship(ship_symbol, cargo_patch(data.cargo))
                .arm(ship_symbol, &data.cooldown)
            }

            Action::NegotiateContract { .. } => {
                let data: NegotiateContractData = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Contract(data.contract.clone()))
                    .mutate(Mutation::UpsertContract(data.contract))
            }

            Action::AcceptContract { contract_id } | Action::FulfillContract { contract_id } => {
                let data: ContractAgentData = decode(kind, response)?;
                if &data.contract.id != contract_id {
                    return Err(malformed(
                        kind,
                        format!("response is for contract {} instead of {}", data.contract.id, contract_id),
                    ));
                }
                let contract = data.contract.clone();
                let patch = match kind {
                    ActionKind::AcceptContract => ContractPatch {
                        terms: Some(contract.terms),
                        accepted: Some(contract.accepted),
                        ..Default::default()
                    },
                    _ => ContractPatch {
                        terms: Some(contract.terms),
                        fulfilled: Some(contract.fulfilled),
                        ..Default::default()
                    },
                };
                ResponsePlan::new(ActionOutcome::ContractUpdate {
                    agent: data.agent.clone(),
                    contract: data.contract,
                })
                .mutate(Mutation::PatchContract {
                    id: contract_id.clone(),
                    patch,
                })
                .agent(&data.agent)
            }

            Action::DeliverContract {
                contract_id,
                ship_symbol,
                ..
            } => {
                let data: DeliverCargoData = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Delivery {
                    contract: data.contract.clone(),
                    cargo: data.cargo.clone(),
                })
                .mutate(Mutation::PatchContract {
                    id: contract_id.clone(),
                    patch: ContractPatch {
                        terms: Some(data.contract.terms),
                        ..Default::default()
                    },
                })
                .patch_ship(ship_symbol, cargo_patch(data.cargo))
            }

            Action::PurchaseShip { .. } => {
                let data: ShipPurchaseData = decode(kind, response)?;
                let ship = Box::new(data.ship);
                ResponsePlan::new(ActionOutcome::ShipPurchase {
                    agent: data.agent.clone(),
                    ship: ship.clone(),
                    transaction: data.transaction.clone(),
                })
                .mutate(Mutation::UpsertShip(ship))
                .agent(&data.agent)
                .publish(TransactionEvent::Shipyard(data.transaction))
            }

            Action::RefreshAgent => {
                let agent: Agent = decode(kind, response)?;
                ResponsePlan::new(ActionOutcome::Agent(agent.clone())).agent(&agent)
            }

            Action::RefreshShip { ship_symbol } => {
                let ship: Ship = decode(kind, response)?;
                if &ship.symbol != ship_symbol {
                    return Err(malformed(
                        kind,
                        format!("response is for ship {} instead of {}", ship.symbol, ship_symbol),
                    ));
                }
                // Re-arm from the server's view; zero remaining clears the wait
                let remaining = ship.cooldown.as_ref().map_or(0, |c| c.remaining_seconds);
                let mut plan = ResponsePlan::new(ActionOutcome::Ship(Box::new(ship.clone())))
                    .patch_ship(ship_symbol, ShipPatch::from_ship(ship));
                plan.cooldown = Some((ship_symbol.clone(), remaining));
                plan
            }

            Action::RefreshContract { contract_id } => {
                let contract: Contract = decode(kind, response)?;
                if &contract.id != contract_id {
                    return Err(malformed(
                        kind,
                        format!("response is for contract {} instead of {}", contract.id, contract_id),
                    ));
                }
                ResponsePlan::new(ActionOutcome::Contract(contract.clone())).mutate(Mutation::PatchContract {
                    id: contract_id.clone(),
                    patch: ContractPatch::from_contract(contract),
                })
            }
        };

        plan.conforms_to(&kind.spec()).map_err(|reason| malformed(kind, reason))?;
        Ok(plan)
    }
}

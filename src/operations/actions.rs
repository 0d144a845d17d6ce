// Action catalog - the closed set of things a caller can ask the engine to do
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::Method;
use crate::error::ActionError;
use crate::models::{FlightMode, Survey};
use crate::storage::{EntityKey, EntityKind};

/// Goods a refinery module can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefineProduce {
    Iron,
    Copper,
    Silver,
    Gold,
    Aluminum,
    Platinum,
    Uranite,
    Meritium,
    Fuel,
}

/// A request to change (or re-read) server state. Serialized as
/// `{"kind": "extract", "shipSymbol": "S1", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Action {
    Orbit {
        ship_symbol: String,
    },
    Dock {
        ship_symbol: String,
    },
    Navigate {
        ship_symbol: String,
        waypoint_symbol: String,
    },
    Warp {
        ship_symbol: String,
        waypoint_symbol: String,
    },
    Jump {
        ship_symbol: String,
        system_symbol: String,
    },
    PatchNav {
        ship_symbol: String,
        flight_mode: FlightMode,
    },
    Extract {
        ship_symbol: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        survey: Option<Survey>,
    },
    Survey {
        ship_symbol: String,
    },
    Chart {
        ship_symbol: String,
    },
    ScanSystems {
        ship_symbol: String,
    },
    ScanWaypoints {
        ship_symbol: String,
    },
    ScanShips {
        ship_symbol: String,
    },
    PurchaseCargo {
        ship_symbol: String,
        trade_symbol: String,
        units: u32,
    },
    SellCargo {
        ship_symbol: String,
        trade_symbol: String,
        units: u32,
    },
    JettisonCargo {
        ship_symbol: String,
        trade_symbol: String,
        units: u32,
    },
    TransferCargo {
        ship_symbol: String,
        target_ship: String,
        trade_symbol: String,
        units: u32,
    },
    Refuel {
        ship_symbol: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        units: Option<u32>,
    },
    InstallMount {
        ship_symbol: String,
        mount_symbol: String,
    },
    RemoveMount {
        ship_symbol: String,
        mount_symbol: String,
    },
    Refine {
        ship_symbol: String,
        produce: RefineProduce,
    },
    NegotiateContract {
        ship_symbol: String,
    },
    AcceptContract {
        contract_id: String,
    },
    FulfillContract {
        contract_id: String,
    },
    DeliverContract {
        contract_id: String,
        ship_symbol: String,
        trade_symbol: String,
        units: u32,
    },
    PurchaseShip {
        ship_type: String,
        waypoint_symbol: String,
    },
    RefreshAgent,
    RefreshShip {
        ship_symbol: String,
    },
    RefreshContract {
        contract_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Orbit,
    Dock,
    Navigate,
    Warp,
    Jump,
    PatchNav,
    Extract,
    Survey,
    Chart,
    ScanSystems,
    ScanWaypoints,
    ScanShips,
    PurchaseCargo,
    SellCargo,
    JettisonCargo,
    TransferCargo,
    Refuel,
    InstallMount,
    RemoveMount,
    Refine,
    NegotiateContract,
    AcceptContract,
    FulfillContract,
    DeliverContract,
    PurchaseShip,
    RefreshAgent,
    RefreshShip,
    RefreshContract,
}

/// Static description of one action kind: where it goes and what it may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub kind: ActionKind,
    pub target: EntityKind,
    pub method: Method,
    /// Endpoint with `{ship}` / `{contract}` placeholders.
    pub path: &'static str,
    /// Top-level fields replaced on the target(s) when applied.
    pub mutates: &'static [&'static str],
    pub arms_cooldown: bool,
    pub replaces_agent: bool,
    /// Refused (or delayed) while the acting ship is cooling down.
    pub cooldown_gated: bool,
}

const fn ship_write(
    kind: ActionKind,
    path: &'static str,
    mutates: &'static [&'static str],
    arms_cooldown: bool,
    replaces_agent: bool,
) -> ActionSpec {
    ActionSpec {
        kind,
        target: EntityKind::Ship,
        method: Method::Post,
        path,
        mutates,
        arms_cooldown,
        replaces_agent,
        cooldown_gated: true,
    }
}

const fn contract_write(kind: ActionKind, path: &'static str, mutates: &'static [&'static str]) -> ActionSpec {
    ActionSpec {
        kind,
        target: EntityKind::Contract,
        method: Method::Post,
        path,
        mutates,
        arms_cooldown: false,
        replaces_agent: true,
        cooldown_gated: false,
    }
}

impl ActionKind {
    pub const ALL: [ActionKind; 28] = [
        ActionKind::Orbit,
        ActionKind::Dock,
        ActionKind::Navigate,
        ActionKind::Warp,
        ActionKind::Jump,
        ActionKind::PatchNav,
        ActionKind::Extract,
        ActionKind::Survey,
        ActionKind::Chart,
        ActionKind::ScanSystems,
        ActionKind::ScanWaypoints,
        ActionKind::ScanShips,
        ActionKind::PurchaseCargo,
        ActionKind::SellCargo,
        ActionKind::JettisonCargo,
        ActionKind::TransferCargo,
        ActionKind::Refuel,
        ActionKind::InstallMount,
        ActionKind::RemoveMount,
        ActionKind::Refine,
        ActionKind::NegotiateContract,
        ActionKind::AcceptContract,
        ActionKind::FulfillContract,
        ActionKind::DeliverContract,
        ActionKind::PurchaseShip,
        ActionKind::RefreshAgent,
        ActionKind::RefreshShip,
        ActionKind::RefreshContract,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Orbit => "orbit",
            ActionKind::Dock => "dock",
            ActionKind::Navigate => "navigate",
            ActionKind::Warp => "warp",
            ActionKind::Jump => "jump",
            ActionKind::PatchNav => "patch-nav",
            ActionKind::Extract => "extract",
            ActionKind::Survey => "survey",
            ActionKind::Chart => "chart",
            ActionKind::ScanSystems => "scan-systems",
            ActionKind::ScanWaypoints => "scan-waypoints",
            ActionKind::ScanShips => "scan-ships",
            ActionKind::PurchaseCargo => "purchase-cargo",
            ActionKind::SellCargo => "sell-cargo",
            ActionKind::JettisonCargo => "jettison-cargo",
            ActionKind::TransferCargo => "transfer-cargo",
            ActionKind::Refuel => "refuel",
            ActionKind::InstallMount => "install-mount",
            ActionKind::RemoveMount => "remove-mount",
            ActionKind::Refine => "refine",
            ActionKind::NegotiateContract => "negotiate-contract",
            ActionKind::AcceptContract => "accept-contract",
            ActionKind::FulfillContract => "fulfill-contract",
            ActionKind::DeliverContract => "deliver-contract",
            ActionKind::PurchaseShip => "purchase-ship",
            ActionKind::RefreshAgent => "refresh-agent",
            ActionKind::RefreshShip => "refresh-ship",
            ActionKind::RefreshContract => "refresh-contract",
        }
    }

    pub fn spec(self) -> ActionSpec {
        use ActionKind as K;
        match self {
            K::Orbit => ship_write(self, "my/ships/{ship}/orbit", &["nav"], false, false),
            K::Dock => ship_write(self, "my/ships/{ship}/dock", &["nav"], false, false),
            K::Navigate => ship_write(self, "my/ships/{ship}/navigate", &["nav", "fuel"], false, false),
            K::Warp => ship_write(self, "my/ships/{ship}/warp", &["nav", "fuel"], false, false),
            K::Jump => ship_write(self, "my/ships/{ship}/jump", &["nav"], true, true),
            K::PatchNav => ActionSpec {
                method: Method::Patch,
                ..ship_write(self, "my/ships/{ship}/nav", &["nav", "fuel"], false, false)
            },
            K::Extract => ship_write(self, "my/ships/{ship}/extract", &["cargo"], true, false),
            K::Survey => ship_write(self, "my/ships/{ship}/survey", &[], true, false),
            K::Chart => ship_write(self, "my/ships/{ship}/chart", &[], false, false),
            K::ScanSystems => ship_write(self, "my/ships/{ship}/scan/systems", &[], true, false),
            K::ScanWaypoints => ship_write(self, "my/ships/{ship}/scan/waypoints", &[], true, false),
            K::ScanShips => ship_write(self, "my/ships/{ship}/scan/ships", &[], true, false),
            K::PurchaseCargo => ship_write(self, "my/ships/{ship}/purchase", &["cargo"], false, true),
            K::SellCargo => ship_write(self, "my/ships/{ship}/sell", &["cargo"], false, true),
            K::JettisonCargo => ship_write(self, "my/ships/{ship}/jettison", &["cargo"], false, false),
            K::TransferCargo => ship_write(self, "my/ships/{ship}/transfer", &["cargo"], false, false),
            K::Refuel => ship_write(self, "my/ships/{ship}/refuel", &["fuel"], false, true),
            K::InstallMount => ship_write(self, "my/ships/{ship}/mounts/install", &["mounts", "cargo"], false, true),
            K::RemoveMount => ship_write(self, "my/ships/{ship}/mounts/remove", &["mounts", "cargo"], false, true),
            K::Refine => ship_write(self, "my/ships/{ship}/refine", &["cargo"], true, false),
            K::NegotiateContract => ActionSpec {
                target: EntityKind::Contract,
                ..ship_write(self, "my/ships/{ship}/negotiate/contract", &["contract"], false, false)
            },
            K::AcceptContract => contract_write(self, "my/contracts/{contract}/accept", &["terms", "accepted"]),
            K::FulfillContract => contract_write(self, "my/contracts/{contract}/fulfill", &["terms", "fulfilled"]),
            K::DeliverContract => ActionSpec {
                replaces_agent: false,
                ..contract_write(self, "my/contracts/{contract}/deliver", &["terms", "cargo"])
            },
            K::PurchaseShip => ActionSpec {
                kind: self,
                target: EntityKind::Ship,
                method: Method::Post,
                path: "my/ships",
                mutates: &["ship"],
                arms_cooldown: false,
                replaces_agent: true,
                cooldown_gated: false,
            },
            K::RefreshAgent => ActionSpec {
                kind: self,
                target: EntityKind::Agent,
                method: Method::Get,
                path: "my/agent",
                mutates: &["agent"],
                arms_cooldown: false,
                replaces_agent: true,
                cooldown_gated: false,
            },
            K::RefreshShip => ActionSpec {
                kind: self,
                target: EntityKind::Ship,
                method: Method::Get,
                path: "my/ships/{ship}",
                mutates: &["nav", "fuel", "cargo", "mounts", "modules"],
                arms_cooldown: true,
                replaces_agent: false,
                cooldown_gated: false,
            },
            K::RefreshContract => ActionSpec {
                kind: self,
                target: EntityKind::Contract,
                method: Method::Get,
                path: "my/contracts/{contract}",
                mutates: &["terms", "accepted", "fulfilled", "expiration", "deadlineToAccept"],
                arms_cooldown: false,
                replaces_agent: false,
                cooldown_gated: false,
            },
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method, resolved path and body for one transport call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Orbit { .. } => ActionKind::Orbit,
            Action::Dock { .. } => ActionKind::Dock,
            Action::Navigate { .. } => ActionKind::Navigate,
            Action::Warp { .. } => ActionKind::Warp,
            Action::Jump { .. } => ActionKind::Jump,
            Action::PatchNav { .. } => ActionKind::PatchNav,
            Action::Extract { .. } => ActionKind::Extract,
            Action::Survey { .. } => ActionKind::Survey,
            Action::Chart { .. } => ActionKind::Chart,
            Action::ScanSystems { .. } => ActionKind::ScanSystems,
            Action::ScanWaypoints { .. } => ActionKind::ScanWaypoints,
            Action::ScanShips { .. } => ActionKind::ScanShips,
            Action::PurchaseCargo { .. } => ActionKind::PurchaseCargo,
            Action::SellCargo { .. } => ActionKind::SellCargo,
            Action::JettisonCargo { .. } => ActionKind::JettisonCargo,
            Action::TransferCargo { .. } => ActionKind::TransferCargo,
            Action::Refuel { .. } => ActionKind::Refuel,
            Action::InstallMount { .. } => ActionKind::InstallMount,
            Action::RemoveMount { .. } => ActionKind::RemoveMount,
            Action::Refine { .. } => ActionKind::Refine,
            Action::NegotiateContract { .. } => ActionKind::NegotiateContract,
            Action::AcceptContract { .. } => ActionKind::AcceptContract,
            Action::FulfillContract { .. } => ActionKind::FulfillContract,
            Action::DeliverContract { .. } => ActionKind::DeliverContract,
            Action::PurchaseShip { .. } => ActionKind::PurchaseShip,
            Action::RefreshAgent => ActionKind::RefreshAgent,
            Action::RefreshShip { .. } => ActionKind::RefreshShip,
            Action::RefreshContract { .. } => ActionKind::RefreshContract,
        }
    }

    pub fn spec(&self) -> ActionSpec {
        self.kind().spec()
    }

    /// The ship whose symbol appears in the endpoint, if any.
    pub fn ship_symbol(&self) -> Option<&str> {
        match self {
            Action::Orbit { ship_symbol }
            | Action::Dock { ship_symbol }
            | Action::Navigate { ship_symbol, .. }
            | Action::Warp { ship_symbol, .. }
            | Action::Jump { ship_symbol, .. }
            | Action::PatchNav { ship_symbol, .. }
            | Action::Extract { ship_symbol, .. }
            | Action::Survey { ship_symbol }
            | Action::Chart { ship_symbol }
            | Action::ScanSystems { ship_symbol }
            | Action::ScanWaypoints { ship_symbol }
            | Action::ScanShips { ship_symbol }
            | Action::PurchaseCargo { ship_symbol, .. }
            | Action::SellCargo { ship_symbol, .. }
            | Action::JettisonCargo { ship_symbol, .. }
            | Action::TransferCargo { ship_symbol, .. }
            | Action::Refuel { ship_symbol, .. }
            | Action::InstallMount { ship_symbol, .. }
            | Action::RemoveMount { ship_symbol, .. }
            | Action::Refine { ship_symbol, .. }
            | Action::NegotiateContract { ship_symbol }
            | Action::DeliverContract { ship_symbol, .. }
            | Action::RefreshShip { ship_symbol } => Some(ship_symbol),
            Action::AcceptContract { .. }
            | Action::FulfillContract { .. }
            | Action::PurchaseShip { .. }
            | Action::RefreshAgent
            | Action::RefreshContract { .. } => None,
        }
    }

    pub fn contract_id(&self) -> Option<&str> {
        match self {
            Action::AcceptContract { contract_id }
            | Action::FulfillContract { contract_id }
            | Action::DeliverContract { contract_id, .. }
            | Action::RefreshContract { contract_id } => Some(contract_id),
            _ => None,
        }
    }

    /// Ship that must be off cooldown before this action may be dispatched.
    pub fn gated_ship(&self) -> Option<&str> {
        if self.spec().cooldown_gated {
            self.ship_symbol()
        } else {
            None
        }
    }

    /// Entities that must already exist in the store. They are also the
    /// keys the executor serializes on, in this (sorted) order.
    pub fn participants(&self) -> Vec<EntityKey> {
        let mut keys = Vec::with_capacity(2);
        if let Some(ship) = self.ship_symbol() {
            keys.push(EntityKey::ship(ship));
        }
        if let Action::TransferCargo { target_ship, .. } = self {
            keys.push(EntityKey::ship(target_ship.as_str()));
        }
        if let Some(id) = self.contract_id() {
            keys.push(EntityKey::contract(id));
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Shape checks that need no store access. Expired surveys are judged
    /// against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ActionError> {
        let kind = self.kind();
        let require = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(ActionError::invalid(kind, format!("{} must not be empty", field)))
            } else {
                Ok(())
            }
        };
        let positive = |units: u32| {
            if units == 0 {
                Err(ActionError::invalid(kind, "units must be greater than zero"))
            } else {
                Ok(())
            }
        };

        if let Some(ship) = self.ship_symbol() {
            require("shipSymbol", ship)?;
        }
        if let Some(id) = self.contract_id() {
            require("contractId", id)?;
        }

        match self {
            Action::Navigate { waypoint_symbol, .. } | Action::Warp { waypoint_symbol, .. } => {
                require("waypointSymbol", waypoint_symbol)
            }
            Action::Jump { system_symbol, .. } => require("systemSymbol", system_symbol),
            Action::Extract {
                survey: Some(survey), ..
            } => {
                require("survey.signature", &survey.signature)?;
                if survey.is_expired_at(now) {
                    return Err(ActionError::invalid(
                        kind,
                        format!("survey {} expired at {}", survey.signature, survey.expiration),
                    ));
                }
                Ok(())
            }
            Action::PurchaseCargo {
                trade_symbol, units, ..
            }
            | Action::SellCargo {
                trade_symbol, units, ..
            }
            | Action::JettisonCargo {
                trade_symbol, units, ..
            } => {
                require("tradeSymbol", trade_symbol)?;
                positive(*units)
            }
            Action::TransferCargo {
                ship_symbol,
                target_ship,
                trade_symbol,
                units,
            } => {
                require("targetShip", target_ship)?;
                require("tradeSymbol", trade_symbol)?;
                positive(*units)?;
                if ship_symbol == target_ship {
                    return Err(ActionError::invalid(kind, "cannot transfer cargo to the same ship"));
                }
                Ok(())
            }
            Action::Refuel { units: Some(units), .. } => positive(*units),
            Action::InstallMount { mount_symbol, .. } | Action::RemoveMount { mount_symbol, .. } => {
                require("mountSymbol", mount_symbol)
            }
            Action::DeliverContract {
                trade_symbol, units, ..
            } => {
                require("tradeSymbol", trade_symbol)?;
                positive(*units)
            }
            Action::PurchaseShip {
                ship_type,
                waypoint_symbol,
            } => {
                require("shipType", ship_type)?;
                require("waypointSymbol", waypoint_symbol)
            }
            _ => Ok(()),
        }
    }

    pub fn request(&self) -> ActionRequest {
        let spec = self.spec();
        let mut path = spec.path.to_string();
        if let Some(ship) = self.ship_symbol() {
            path = path.replace("{ship}", ship);
        }
        if let Some(id) = self.contract_id() {
            path = path.replace("{contract}", id);
        }

        let body = match self {
            Action::Navigate { waypoint_symbol, .. } | Action::Warp { waypoint_symbol, .. } => {
                Some(json!({ "waypointSymbol": waypoint_symbol }))
            }
            Action::Jump { system_symbol, .. } => Some(json!({ "systemSymbol": system_symbol })),
            Action::PatchNav { flight_mode, .. } => Some(json!({ "flightMode": flight_mode })),
            Action::Extract {
                survey: Some(survey), ..
            } => Some(json!({ "survey": survey })),
            Action::PurchaseCargo {
                trade_symbol, units, ..
            }
            | Action::SellCargo {
                trade_symbol, units, ..
            }
            | Action::JettisonCargo {
                trade_symbol, units, ..
            } => Some(json!({ "symbol": trade_symbol, "units": units })),
            Action::TransferCargo {
                target_ship,
                trade_symbol,
                units,
                ..
            } => Some(json!({
                "tradeSymbol": trade_symbol,
                "units": units,
                "shipSymbol": target_ship,
            })),
            Action::Refuel { units: Some(units), .. } => Some(json!({ "units": units })),
            Action::InstallMount { mount_symbol, .. } | Action::RemoveMount { mount_symbol, .. } => {
                Some(json!({ "symbol": mount_symbol }))
            }
            Action::Refine { produce, .. } => Some(json!({ "produce": produce })),
            Action::DeliverContract {
                ship_symbol,
                trade_symbol,
                units,
                ..
            } => Some(json!({
                "shipSymbol": ship_symbol,
                "tradeSymbol": trade_symbol,
                "units": units,
            })),
            Action::PurchaseShip {
                ship_type,
                waypoint_symbol,
            } => Some(json!({ "shipType": ship_type, "waypointSymbol": waypoint_symbol })),
            _ => None,
        };

        ActionRequest {
            method: spec.method,
            path,
            body,
        }
    }
}

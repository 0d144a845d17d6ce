use serde::{Deserialize, Serialize};

use crate::models::{
    Agent, Contract, Extraction, MarketTransaction, RefineItem, ScannedShip, ScannedSystem, Ship,
    ShipCargo, ShipCooldown, ShipFuel, ShipModificationTransaction, ShipMount, ShipNav,
    ShipyardTransaction, Survey, Waypoint,
};

// API Response wrappers
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Meta {
    pub total: u32,
    pub page: u32,
    pub limit: u32,
}

// Per-action `data` payloads
#[derive(Debug, Deserialize)]
pub struct NavData {
    pub nav: ShipNav,
}

#[derive(Debug, Deserialize)]
pub struct NavigationData {
    pub fuel: ShipFuel,
    pub nav: ShipNav,
}

#[derive(Debug, Deserialize)]
pub struct JumpData {
    pub cooldown: ShipCooldown,
    pub nav: ShipNav,
    pub agent: Option<Agent>,
}

/// The nav endpoint has answered both with a bare nav and with a wrapper
/// that also carries fuel.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PatchNavData {
    Wrapped { nav: ShipNav, fuel: Option<ShipFuel> },
    Bare(ShipNav),
}

impl PatchNavData {
    pub fn into_parts(self) -> (ShipNav, Option<ShipFuel>) {
        match self {
            PatchNavData::Wrapped { nav, fuel } => (nav, fuel),
            PatchNavData::Bare(nav) => (nav, None),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExtractionData {
    pub cooldown: ShipCooldown,
    pub extraction: Extraction,
    pub cargo: ShipCargo,
}

#[derive(Debug, Deserialize)]
pub struct SurveyData {
    pub cooldown: ShipCooldown,
    pub surveys: Vec<Survey>,
}

#[derive(Debug, Deserialize)]
pub struct ChartData {
    pub chart: crate::models::waypoint::Chart,
    pub waypoint: Waypoint,
}

#[derive(Debug, Deserialize)]
pub struct SystemScanData {
    pub cooldown: ShipCooldown,
    pub systems: Vec<ScannedSystem>,
}

#[derive(Debug, Deserialize)]
pub struct WaypointScanData {
    pub cooldown: ShipCooldown,
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Deserialize)]
pub struct ShipScanData {
    pub cooldown: ShipCooldown,
    pub ships: Vec<ScannedShip>,
}

#[derive(Debug, Deserialize)]
pub struct TradeData {
    pub agent: Agent,
    pub cargo: ShipCargo,
    pub transaction: MarketTransaction,
}

#[derive(Debug, Deserialize)]
pub struct CargoData {
    pub cargo: ShipCargo,
}

#[derive(Debug, Deserialize)]
pub struct TransferCargoData {
    pub cargo: ShipCargo,
    #[serde(rename = "targetCargo")]
    pub target_cargo: Option<ShipCargo>,
}

#[derive(Debug, Deserialize)]
pub struct RefuelData {
    pub agent: Agent,
    pub fuel: ShipFuel,
    pub transaction: MarketTransaction,
}

#[derive(Debug, Deserialize)]
pub struct MountChangeData {
    pub agent: Agent,
    pub mounts: Vec<ShipMount>,
    pub cargo: ShipCargo,
    pub transaction: ShipModificationTransaction,
}

#[derive(Debug, Deserialize)]
pub struct RefineData {
    pub cargo: ShipCargo,
    pub cooldown: ShipCooldown,
    pub produced: Vec<RefineItem>,
    pub consumed: Vec<RefineItem>,
}

#[derive(Debug, Deserialize)]
pub struct NegotiateContractData {
    pub contract: Contract,
}

#[derive(Debug, Deserialize)]
pub struct ContractAgentData {
    pub agent: Agent,
    pub contract: Contract,
}

#[derive(Debug, Deserialize)]
pub struct DeliverCargoData {
    pub contract: Contract,
    pub cargo: ShipCargo,
}

#[derive(Debug, Deserialize)]
pub struct ShipPurchaseData {
    pub agent: Agent,
    pub ship: Ship,
    pub transaction: ShipyardTransaction,
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Ship {
    pub symbol: String,
    #[serde(default)]
    pub registration: ShipRegistration,
    pub nav: ShipNav,
    #[serde(default)]
    pub crew: ShipCrew,
    #[serde(default)]
    pub frame: ShipComponent,
    #[serde(default)]
    pub reactor: ShipComponent,
    #[serde(default)]
    pub engine: ShipComponent,
    #[serde(default)]
    pub cooldown: Option<ShipCooldown>,
    #[serde(default)]
    pub modules: Vec<ShipModule>,
    #[serde(default)]
    pub mounts: Vec<ShipMount>,
    pub cargo: ShipCargo,
    pub fuel: ShipFuel,
}

impl Ship {
    pub fn is_docked(&self) -> bool {
        self.nav.status == ShipNavStatus::Docked
    }

    pub fn has_mount(&self, mount_symbol: &str) -> bool {
        self.mounts.iter().any(|m| m.symbol == mount_symbol)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipRegistration {
    pub name: String,
    #[serde(rename = "factionSymbol")]
    pub faction_symbol: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipNavStatus {
    InTransit,
    InOrbit,
    #[default]
    Docked,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightMode {
    Drift,
    Stealth,
    #[default]
    Cruise,
    Burn,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipNav {
    #[serde(rename = "systemSymbol")]
    pub system_symbol: String,
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    #[serde(default)]
    pub route: ShipRoute,
    pub status: ShipNavStatus,
    #[serde(rename = "flightMode", default)]
    pub flight_mode: FlightMode,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipRoute {
    pub destination: ShipRouteWaypoint,
    // Older API revisions call the origin "departure"
    #[serde(alias = "departure")]
    pub origin: ShipRouteWaypoint,
    #[serde(rename = "departureTime")]
    pub departure_time: String,
    pub arrival: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipRouteWaypoint {
    pub symbol: String,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    #[serde(rename = "systemSymbol")]
    pub system_symbol: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipCrew {
    pub current: i32,
    pub required: i32,
    pub capacity: i32,
    pub rotation: String,
    pub morale: i32,
    pub wages: i32,
}

/// Frame, reactor and engine share the fields this crate cares about.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipComponent {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub condition: Option<f64>,
    pub integrity: Option<f64>,
    #[serde(default)]
    pub requirements: ShipRequirements,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipModule {
    pub symbol: String,
    pub capacity: Option<i32>,
    pub range: Option<i32>,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: ShipRequirements,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipMount {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub strength: Option<i32>,
    pub deposits: Option<Vec<String>>,
    #[serde(default)]
    pub requirements: ShipRequirements,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipRequirements {
    pub power: Option<i32>,
    pub crew: Option<i32>,
    pub slots: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShipCooldown {
    /// Action responses may leave this out; the acting ship is implied.
    #[serde(rename = "shipSymbol", default, skip_serializing_if = "Option::is_none")]
    pub ship_symbol: Option<String>,
    #[serde(rename = "totalSeconds", default)]
    pub total_seconds: u64,
    #[serde(rename = "remainingSeconds")]
    pub remaining_seconds: u64,
    #[serde(default)]
    pub expiration: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipCargo {
    pub capacity: u32,
    pub units: u32,
    #[serde(default)]
    pub inventory: Vec<CargoItem>,
}

impl ShipCargo {
    /// Sum of units across inventory lines.
    pub fn used_units(&self) -> u64 {
        self.inventory.iter().map(|item| u64::from(item.units)).sum()
    }

    pub fn units_of(&self, trade_symbol: &str) -> u32 {
        self.inventory
            .iter()
            .filter(|item| item.symbol == trade_symbol)
            .map(|item| item.units)
            .sum()
    }

    /// Drops empty lines and checks that the hold is not over capacity.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.inventory.retain(|item| item.units > 0);

        let used = self.used_units();
        if used > u64::from(self.capacity) {
            return Err(format!(
                "cargo holds {} units but capacity is {}",
                used, self.capacity
            ));
        }
        if u64::from(self.units) > u64::from(self.capacity) {
            return Err(format!(
                "cargo reports {} units but capacity is {}",
                self.units, self.capacity
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CargoItem {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub units: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ShipFuel {
    pub current: u32,
    pub capacity: u32,
    pub consumed: Option<ShipFuelConsumed>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShipFuelConsumed {
    pub amount: u32,
    pub timestamp: String,
}

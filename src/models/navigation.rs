use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScannedShip {
    pub symbol: String,
    pub registration: crate::models::ship::ShipRegistration,
    pub nav: crate::models::ship::ShipNav,
    pub frame: Option<ScannedComponent>,
    pub reactor: Option<ScannedComponent>,
    pub engine: ScannedComponent,
    pub mounts: Option<Vec<ScannedComponent>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScannedComponent {
    pub symbol: String,
}

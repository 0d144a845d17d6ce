use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Agent {
    #[serde(rename = "accountId")]
    pub account_id: Option<String>,
    pub symbol: String,
    pub headquarters: String,
    pub credits: i64,
    #[serde(rename = "startingFaction", default)]
    pub starting_faction: String,
    #[serde(rename = "shipCount", default)]
    pub ship_count: i32,
}

impl Agent {
    /// System part of the headquarters waypoint ("X1-DF55-20250Z" -> "X1-DF55").
    pub fn home_system(&self) -> String {
        self.headquarters
            .split('-')
            .take(2)
            .collect::<Vec<&str>>()
            .join("-")
    }
}

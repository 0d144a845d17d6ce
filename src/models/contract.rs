use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Contract {
    pub id: String,
    #[serde(rename = "factionSymbol")]
    pub faction_symbol: String,
    #[serde(rename = "type")]
    pub contract_type: ContractType,
    pub terms: ContractTerms,
    pub accepted: bool,
    pub fulfilled: bool,
    #[serde(default)]
    pub expiration: String,
    #[serde(rename = "deadlineToAccept")]
    pub deadline_to_accept: Option<String>,
}

impl Contract {
    pub fn delivery(&self, trade_symbol: &str) -> Option<&DeliveryItem> {
        self.terms
            .deliver
            .iter()
            .find(|d| d.trade_symbol == trade_symbol)
    }

    /// All deliveries have reached their required units.
    pub fn deliveries_complete(&self) -> bool {
        self.terms
            .deliver
            .iter()
            .all(|d| d.units_fulfilled >= d.units_required)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    Procurement,
    Transport,
    Shuttle,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ContractTerms {
    pub deadline: String,
    pub payment: Payment,
    #[serde(default)]
    pub deliver: Vec<DeliveryItem>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Payment {
    #[serde(rename = "onAccepted")]
    pub on_accepted: i64,
    #[serde(rename = "onFulfilled")]
    pub on_fulfilled: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeliveryItem {
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    #[serde(rename = "destinationSymbol")]
    pub destination_symbol: String,
    #[serde(rename = "unitsRequired")]
    pub units_required: u32,
    #[serde(rename = "unitsFulfilled")]
    pub units_fulfilled: u32,
}

impl DeliveryItem {
    pub fn units_remaining(&self) -> u32 {
        self.units_required.saturating_sub(self.units_fulfilled)
    }
}

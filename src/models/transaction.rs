use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Mining and Survey structures
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Survey {
    pub signature: String,
    pub symbol: String,
    pub deposits: Vec<SurveyDeposit>,
    pub expiration: DateTime<Utc>,
    pub size: SurveySize,
}

impl Survey {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration <= now
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SurveyDeposit {
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveySize {
    Small,
    Moderate,
    Large,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Extraction {
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "yield")]
    pub extraction_yield: ExtractionYield,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtractionYield {
    pub symbol: String,
    pub units: u32,
}

/// One side of a refinery run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RefineItem {
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    pub units: u32,
}

// Trading structures
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketTransactionType {
    Purchase,
    Sell,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MarketTransaction {
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    #[serde(rename = "type")]
    pub transaction_type: MarketTransactionType,
    pub units: u32,
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: i64,
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
    pub timestamp: String,
}

// Shipyard structures
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShipyardTransaction {
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "shipType")]
    pub ship_type: Option<String>,
    pub price: i64,
    #[serde(rename = "agentSymbol")]
    pub agent_symbol: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ShipModificationTransaction {
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    #[serde(rename = "totalPrice")]
    pub total_price: i64,
    pub timestamp: String,
}

/// Credit-moving side effect of an action, published to the transaction sink.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEvent {
    Market(MarketTransaction),
    Shipyard(ShipyardTransaction),
    Modification(ShipModificationTransaction),
}

impl TransactionEvent {
    pub fn ship_symbol(&self) -> &str {
        match self {
            TransactionEvent::Market(tx) => &tx.ship_symbol,
            TransactionEvent::Shipyard(tx) => &tx.ship_symbol,
            TransactionEvent::Modification(tx) => &tx.ship_symbol,
        }
    }
}

//! Procurement domain types: intents, the agent's decision, vendor offers.

use serde::{Deserialize, Deserializer, Serialize};

/// What the user is trying to do with one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Teach the assistant a rule or fact
    StoreFact,
    /// Ask the assistant to buy something
    ProcurementRequest,
    /// Anything else
    Chat,
    /// Answer to a pending approval request
    ApprovalReply,
}

impl Intent {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::StoreFact => "STORE_FACT",
            Self::ProcurementRequest => "PROCUREMENT_REQUEST",
            Self::Chat => "CHAT",
            Self::ApprovalReply => "APPROVAL_REPLY",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// The outcome the agent reports for a procurement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    OrderPlaced,
    PauseApprovalNeeded,
}

impl OrderStatus {
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::OrderPlaced => "ORDER_PLACED",
            Self::PauseApprovalNeeded => "PAUSE_APPROVAL_NEEDED",
        }
    }
}

/// The structured decision block the agent ends its answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub selected_vendor: String,

    #[serde(deserialize_with = "number_or_numeric_string")]
    pub price_per_unit: f64,

    #[serde(deserialize_with = "number_or_numeric_string")]
    pub total_cost: f64,

    pub status: OrderStatus,

    #[serde(default)]
    pub reasoning: String,
}

impl Decision {
    pub fn needs_approval(&self) -> bool {
        self.status == OrderStatus::PauseApprovalNeeded
    }
}

/// A decision waiting on the user's yes/no. One slot per session.
pub type PendingOrder = Decision;

/// Currency markers tolerated around a quoted amount.
const CURRENCY_MARKERS: &[&str] = &["Rs.", "Rs", "INR", "USD", "₹", "$", "€", "£"];

/// Models sometimes quote numbers ("1800", "₹1,800", "Rs. 400"); accept those too.
/// Anything besides currency markers, grouping commas and whitespace is rejected.
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => parse_amount(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("not a number: {s:?}"))),
    }
}

fn parse_amount(text: &str) -> Option<f64> {
    let mut rest = text.trim();
    while let Some(marker) = CURRENCY_MARKERS.iter().find(|m| rest.starts_with(*m)) {
        rest = rest[marker.len()..].trim_start();
    }
    while let Some(marker) = CURRENCY_MARKERS.iter().find(|m| rest.ends_with(*m)) {
        rest = rest[..rest.len() - marker.len()].trim_end();
    }

    let digits: String = rest.chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return None;
    }
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// One vendor offer from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor: String,
    pub product: String,
    pub price: f64,
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::{UtcDateTime, ValidationError};

/// Chain or venue a call trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Solana,
    Bsc,
    Ethereum,
    Base,
    Ton,
    Tron,
    Sui,
    Cex,
}

impl Network {
    pub const ALL: [Self; 8] = [
        Self::Solana,
        Self::Bsc,
        Self::Ethereum,
        Self::Base,
        Self::Ton,
        Self::Tron,
        Self::Sui,
        Self::Cex,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solana => "solana",
            Self::Bsc => "bsc",
            Self::Ethereum => "ethereum",
            Self::Base => "base",
            Self::Ton => "ton",
            Self::Tron => "tron",
            Self::Sui => "sui",
            Self::Cex => "cex",
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|network| network.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidNetwork {
                value: value.to_owned(),
            })
    }
}

/// Holding horizon of a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Flip,
    Medium,
    Long,
}

impl Strategy {
    pub const ALL: [Self; 3] = [Self::Flip, Self::Medium, Self::Long];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flip => "flip",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flip" => Ok(Self::Flip),
            "medium" => Ok(Self::Medium),
            "long" => Ok(Self::Long),
            _ => Err(ValidationError::InvalidStrategy {
                value: value.to_owned(),
            }),
        }
    }
}

/// Lifecycle state of a call. Only `Active` calls take part in the active
/// window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    #[default]
    Active,
    Completed,
    Cancelled,
    Reviewed,
}

impl CallStatus {
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::Completed,
        Self::Cancelled,
        Self::Reviewed,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Reviewed => "reviewed",
        }
    }
}

impl Display for CallStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "reviewed" => Ok(Self::Reviewed),
            _ => Err(ValidationError::InvalidStatus {
                value: value.to_owned(),
            }),
        }
    }
}

/// Externally sourced display metrics. Passed through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_profit: Option<f64>,
    #[serde(rename = "currentPnL", skip_serializing_if = "Option::is_none")]
    pub current_pnl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
}

/// A trader's published trade recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: String,
    pub trader_id: String,
    /// `None` when the stored value is missing or outside the enumeration;
    /// serialized as an empty string.
    #[serde(serialize_with = "network_or_empty")]
    pub network: Option<Network>,
    pub ticker: String,
    pub pair: String,
    pub entry_point: String,
    pub target: String,
    pub risks: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_conditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub strategy: Strategy,
    pub status: CallStatus,
    pub created_at: UtcDateTime,
    #[serde(flatten)]
    pub metrics: CallMetrics,
}

impl Call {
    pub fn is_active(&self) -> bool {
        self.status == CallStatus::Active
    }
}

fn network_or_empty<S>(network: &Option<Network>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(network.map_or("", Network::as_str))
}

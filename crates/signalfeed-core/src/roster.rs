//! Static trader reference data.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CoreError, ValidationError};

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trader {
    pub id: String,
    pub display_name: String,
    /// Opaque credential reference; never serialized back out.
    #[serde(default, skip_serializing)]
    pub credentials: Option<String>,
}

impl Trader {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            credentials: None,
        }
    }
}

/// Read-only roster resolving trader ids to display names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraderRoster {
    traders: BTreeMap<String, Trader>,
}

impl TraderRoster {
    /// Builds a roster, rejecting empty and duplicate ids.
    pub fn new(traders: impl IntoIterator<Item = Trader>) -> Result<Self, ValidationError> {
        let mut by_id = BTreeMap::new();
        for trader in traders {
            if trader.id.trim().is_empty() {
                return Err(ValidationError::EmptyTraderId);
            }
            if by_id.contains_key(&trader.id) {
                return Err(ValidationError::DuplicateTraderId { id: trader.id });
            }
            by_id.insert(trader.id.clone(), trader);
        }
        Ok(Self { traders: by_id })
    }

    pub fn from_json(payload: &str) -> Result<Self, CoreError> {
        let traders: Vec<Trader> = serde_json::from_str(payload)?;
        Ok(Self::new(traders)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CoreError> {
        let payload = std::fs::read_to_string(path)?;
        let roster = Self::from_json(&payload)?;
        debug!(path = %path.display(), traders = roster.len(), "trader roster loaded");
        Ok(roster)
    }

    /// Roster used when no roster file is configured.
    pub fn builtin() -> Self {
        let traders = [
            ("trader-1", "Alpha Caller"),
            ("trader-2", "Degen Scout"),
            ("trader-3", "Chart Monk"),
            ("trader-4", "Whale Watcher"),
        ]
        .into_iter()
        .map(|(id, display_name)| (id.to_owned(), Trader::new(id, display_name)))
        .collect();

        Self { traders }
    }

    pub fn get(&self, id: &str) -> Option<&Trader> {
        self.traders.get(id)
    }

    /// Display name for `id`, or the id itself when the trader is unknown.
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map_or(id, |trader| trader.display_name.as_str())
    }

    /// Traders ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Trader> {
        self.traders.values()
    }

    pub fn len(&self) -> usize {
        self.traders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_roster_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id": "t-1", "displayName": "Nova", "credentials": "vault://t-1"}}]"#
        )
        .expect("write roster");

        let roster = TraderRoster::from_path(file.path()).expect("roster");

        assert_eq!(roster.len(), 1);
        assert_eq!(roster.display_name("t-1"), "Nova");
        assert_eq!(
            roster.get("t-1").and_then(|t| t.credentials.as_deref()),
            Some("vault://t-1")
        );
    }

    #[test]
    fn unknown_trader_falls_back_to_id() {
        assert_eq!(TraderRoster::builtin().display_name("ghost"), "ghost");
    }

    #[test]
    fn rejects_duplicate_and_empty_ids() {
        let duplicate = TraderRoster::new([Trader::new("t-1", "A"), Trader::new("t-1", "B")]);
        assert_eq!(
            duplicate,
            Err(ValidationError::DuplicateTraderId {
                id: String::from("t-1")
            })
        );

        let empty = TraderRoster::new([Trader::new(" ", "A")]);
        assert_eq!(empty, Err(ValidationError::EmptyTraderId));
    }

    #[test]
    fn credentials_are_not_serialized() {
        let mut trader = Trader::new("t-1", "Nova");
        trader.credentials = Some(String::from("secret"));

        let value = serde_json::to_value(&trader).expect("serialize");

        assert_eq!(value, serde_json::json!({ "id": "t-1", "displayName": "Nova" }));
    }
}

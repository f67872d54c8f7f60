//! Persistence for the billing document.
use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::account::{PUBLIC_KEY, PersonalAccount, PublicAccount, normalize_name};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed ledger document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Malformed account record '{key}': {source}")]
    Account {
        key: String,
        source: serde_json::Error,
    },
    #[error("Ledger has no '{PUBLIC_KEY}' account")]
    MissingPublic,
    #[error("User '{0}' not found in the ledger")]
    UserNotFound(String),
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    current_period: BTreeMap<String, Value>,
    #[serde(default)]
    record: Value,
}

/// The persisted billing document: the current period's public account and
/// per-user catalog, plus the historical record blob that is carried forward
/// unchanged on every save.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub public: PublicAccount,
    pub catalog: BTreeMap<String, PersonalAccount>,
    pub record: Value,
}

impl Ledger {
    /// Reads and decodes the ledger file at `path`.
    #[instrument(skip(path))]
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Decodes a ledger document. The `PUBLIC` key is decoded as the shared
    /// account; every remaining `current_period` key is decoded uniformly as
    /// a personal account under its normalized name.
    pub fn from_json(content: &str) -> Result<Self, LedgerError> {
        let raw: RawDocument = serde_json::from_str(content)?;

        let mut public = None;
        let mut catalog = BTreeMap::new();
        for (key, value) in raw.current_period {
            if key.eq_ignore_ascii_case(PUBLIC_KEY) {
                let account = serde_json::from_value(value)
                    .map_err(|source| LedgerError::Account {
                        key: PUBLIC_KEY.to_string(),
                        source,
                    })?;
                public = Some(account);
            } else {
                let account = serde_json::from_value(value).map_err(|source| {
                    LedgerError::Account {
                        key: key.clone(),
                        source,
                    }
                })?;
                catalog.insert(normalize_name(&key), account);
            }
        }

        Ok(Self {
            public: public.ok_or(LedgerError::MissingPublic)?,
            catalog,
            record: raw.record,
        })
    }

    /// Serializes the document and overwrites the file at `path`.
    ///
    /// A crash mid-write can leave a truncated file; callers accept that.
    #[instrument(skip(self, path))]
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let content = self.to_json()?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, LedgerError> {
        let mut period = serde_json::Map::new();
        period.insert(PUBLIC_KEY.to_string(), serde_json::to_value(&self.public)?);
        for (name, account) in &self.catalog {
            period.insert(name.clone(), serde_json::to_value(account)?);
        }

        let document = serde_json::json!({
            "current_period": period,
            "record": self.record,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Looks up one user's record in the catalog by normalized name.
    pub fn user(&self, name: &str) -> Result<&PersonalAccount, LedgerError> {
        let key = normalize_name(name);
        self.catalog
            .get(&key)
            .ok_or(LedgerError::UserNotFound(key))
    }

    pub fn user_names(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LEDGER: &str = r#"
    {
        "current_period": {
            "PUBLIC": {
                "subsidy": 100.0,
                "water_fee": 0.0,
                "public_electric_fee": 0.0,
                "network_fee": 0.0,
                "gass_fee": 0.0,
                "balance": 250.5
            },
            "ALICE": {
                "last_period_meter_read": 1200.0,
                "personal_electric_fee": 0.0,
                "total_electric_fee": 0.0,
                "water_fee": 0.0,
                "network_fee": 0.0,
                "gas_fee": 0.0,
                "tenat_fee": 4500.0,
                "total_fee": 0.0
            },
            "BOB": {
                "last_period_meter_read": 800.0,
                "tenat_fee": 4200.0
            }
        },
        "record": { "2025-06": { "note": "carried" } }
    }
    "#;

    #[test]
    fn test_load_decodes_public_and_users() {
        let ledger = Ledger::from_json(SAMPLE_LEDGER).unwrap();
        assert_eq!(ledger.public.subsidy, 100.0);
        assert_eq!(ledger.public.balance, 250.5);
        assert_eq!(ledger.catalog.len(), 2);
        assert_eq!(ledger.catalog["ALICE"].last_period_meter_read, 1200.0);
        assert_eq!(ledger.catalog["BOB"].tenant_fee, 4200.0);
    }

    #[test]
    fn test_load_normalizes_user_keys() {
        let content = r#"{"current_period":{"PUBLIC":{}," bob ":{"tenat_fee":1.0}}}"#;
        let ledger = Ledger::from_json(content).unwrap();
        assert!(ledger.catalog.contains_key("BOB"));
    }

    #[test]
    fn test_load_requires_public_account() {
        let content = r#"{"current_period":{"ALICE":{}}}"#;
        let err = Ledger::from_json(content).unwrap_err();
        assert!(matches!(err, LedgerError::MissingPublic));
    }

    #[test]
    fn test_load_names_malformed_account() {
        let content = r#"{"current_period":{"PUBLIC":{},"ALICE":{"water_fee":"wet"}}}"#;
        let err = Ledger::from_json(content).unwrap_err();
        assert!(matches!(err, LedgerError::Account { ref key, .. } if key == "ALICE"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let err = Ledger::from_json("{ nope").unwrap_err();
        assert!(matches!(err, LedgerError::Parse(_)));
    }

    #[test]
    fn test_round_trip_preserves_document() {
        let ledger = Ledger::from_json(SAMPLE_LEDGER).unwrap();
        let reloaded = Ledger::from_json(&ledger.to_json().unwrap()).unwrap();
        assert_eq!(ledger, reloaded);
    }

    #[test]
    fn test_record_carried_forward() {
        let ledger = Ledger::from_json(SAMPLE_LEDGER).unwrap();
        let out = ledger.to_json().unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["record"]["2025-06"]["note"], "carried");
    }

    #[test]
    fn test_missing_record_serialized_as_null() {
        let ledger = Ledger::from_json(r#"{"current_period":{"PUBLIC":{}}}"#).unwrap();
        assert_eq!(ledger.record, Value::Null);
    }

    #[test]
    fn test_user_lookup_normalizes() {
        let ledger = Ledger::from_json(SAMPLE_LEDGER).unwrap();
        assert!(ledger.user("alice").is_ok());
        assert!(ledger.user(" Alice ").is_ok());
        assert!(ledger.user("ALICE").is_ok());
    }

    #[test]
    fn test_user_lookup_unknown() {
        let ledger = Ledger::from_json(SAMPLE_LEDGER).unwrap();
        let err = ledger.user("carol").unwrap_err();
        assert!(matches!(err, LedgerError::UserNotFound(ref name) if name == "CAROL"));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let ledger = Ledger::from_json(SAMPLE_LEDGER).unwrap();
        ledger.save(&path).unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(ledger, reloaded);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Ledger::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, LedgerError::Io(_)));
    }
}

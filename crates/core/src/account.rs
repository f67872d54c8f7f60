//! Account records for one billing period.
use serde::{Deserialize, Serialize};

/// Fixed key of the shared-cost ledger entry in the persisted document.
pub const PUBLIC_KEY: &str = "PUBLIC";

/// Normalizes a roommate name for use as a ledger key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Shared-cost ledger for the current period. Amounts not attributed to any
/// individual roommate end up here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicAccount {
    pub subsidy: f64,
    pub water_fee: f64,
    pub public_electric_fee: f64,
    pub network_fee: f64,
    // Existing ledger files spell this key "gass_fee"; keep the wire name.
    #[serde(rename = "gass_fee")]
    pub gas_fee: f64,
    pub balance: f64,
}

/// One tracked roommate's per-category fees and electricity meter history.
///
/// `total_fee` is a running accumulator: every applied bill adds the user's
/// share into it, and it is never reset within a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalAccount {
    pub last_period_meter_read: f64,
    pub personal_electric_fee: f64,
    pub total_electric_fee: f64,
    pub water_fee: f64,
    pub network_fee: f64,
    pub gas_fee: f64,
    // Wire name predates this implementation, same as "gass_fee" above.
    #[serde(rename = "tenat_fee")]
    pub tenant_fee: f64,
    pub total_fee: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("alice"), "ALICE");
        assert_eq!(normalize_name(" Alice "), "ALICE");
        assert_eq!(normalize_name("ALICE"), "ALICE");
    }

    #[test]
    fn test_normalize_name_idempotent() {
        let once = normalize_name(" bob ");
        assert_eq!(normalize_name(&once), once);
    }

    #[test]
    fn test_public_account_legacy_gas_key() {
        let json = r#"{"subsidy":1.0,"water_fee":2.0,"public_electric_fee":3.0,"network_fee":4.0,"gass_fee":5.0,"balance":6.0}"#;
        let account: PublicAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.gas_fee, 5.0);

        let out = serde_json::to_string(&account).unwrap();
        assert!(out.contains("\"gass_fee\":5.0"));
        assert!(!out.contains("\"gas_fee\""));
    }

    #[test]
    fn test_personal_account_legacy_tenant_key() {
        let json = r#"{"tenat_fee":1200.0,"total_fee":1300.0}"#;
        let account: PersonalAccount = serde_json::from_str(json).unwrap();
        assert_eq!(account.tenant_fee, 1200.0);
        assert_eq!(account.total_fee, 1300.0);
        // Fields absent from the document default to zero.
        assert_eq!(account.water_fee, 0.0);

        let out = serde_json::to_string(&account).unwrap();
        assert!(out.contains("\"tenat_fee\":1200.0"));
    }

    #[test]
    fn test_personal_account_rejects_non_numeric_fields() {
        let json = r#"{"water_fee":"lots"}"#;
        assert!(serde_json::from_str::<PersonalAccount>(json).is_err());
    }
}

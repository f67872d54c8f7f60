//! Bill-splitting arithmetic over the tracked roster.
//!
//! All validation happens before any account is touched: a failed split
//! leaves the public account and every personal account unchanged.
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::account::{PersonalAccount, PublicAccount, normalize_name};

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("No users are tracked in this session")]
    EmptyRoster,
    #[error("Share list is empty")]
    EmptyShareList,
    #[error("User '{0}' is not tracked in this session")]
    UnknownMember(String),
    #[error("Missing meter reading for '{0}'")]
    MissingReading(String),
}

/// Policy for dividing a shared cost.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule {
    /// Even split across every tracked user.
    All,
    /// Even split across the named users only; every other tracked user's
    /// fee for the category is zeroed.
    Among(Vec<String>),
}

impl SplitRule {
    /// Resolves the rule against the roster, returning the set of users
    /// that carry a share. Names are normalized before matching.
    fn resolve(&self, roster: &BTreeSet<String>) -> Result<BTreeSet<String>, SplitError> {
        if roster.is_empty() {
            return Err(SplitError::EmptyRoster);
        }
        match self {
            SplitRule::All => Ok(roster.clone()),
            SplitRule::Among(names) => {
                if names.is_empty() {
                    return Err(SplitError::EmptyShareList);
                }
                let mut members = BTreeSet::new();
                for name in names {
                    let key = normalize_name(name);
                    if !roster.contains(&key) {
                        return Err(SplitError::UnknownMember(key));
                    }
                    members.insert(key);
                }
                Ok(members)
            }
        }
    }
}

/// Bill categories that are split without per-user metering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedUtility {
    Water,
    Gas,
    Network,
}

impl SharedUtility {
    pub fn label(&self) -> &'static str {
        match self {
            SharedUtility::Water => "water",
            SharedUtility::Gas => "gas",
            SharedUtility::Network => "network",
        }
    }

    fn personal_fee_mut<'a>(&self, account: &'a mut PersonalAccount) -> &'a mut f64 {
        match self {
            SharedUtility::Water => &mut account.water_fee,
            SharedUtility::Gas => &mut account.gas_fee,
            SharedUtility::Network => &mut account.network_fee,
        }
    }

    fn public_total_mut<'a>(&self, public: &'a mut PublicAccount) -> &'a mut f64 {
        match self {
            SharedUtility::Water => &mut public.water_fee,
            SharedUtility::Gas => &mut public.gas_fee,
            SharedUtility::Network => &mut public.network_fee,
        }
    }
}

/// One user's share of an applied bill.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub name: String,
    pub amount: f64,
}

/// Inputs for an electricity bill: declared total usage for the period,
/// a current meter reading per tracked user, and the average unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricBill {
    pub total_kwh: f64,
    pub unit_price: f64,
    pub readings: BTreeMap<String, f64>,
}

/// One user's electricity breakdown after applying a bill.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricShare {
    pub name: String,
    pub current_read: f64,
    pub last_read: f64,
    pub personal_fee: f64,
    pub shared_fee: f64,
    pub total_fee: f64,
}

/// Result of applying an electricity bill.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricOutcome {
    pub shares: Vec<ElectricShare>,
    pub remainder_kwh: f64,
    pub public_fee: f64,
}

fn check_amount(value: f64, what: &str) -> Result<(), SplitError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SplitError::InvalidAmount(format!(
            "{what} must be a non-negative number"
        )));
    }
    Ok(())
}

fn check_roster_known(
    users: &BTreeMap<String, PersonalAccount>,
    roster: &BTreeSet<String>,
) -> Result<(), SplitError> {
    for name in roster {
        if !users.contains_key(name) {
            return Err(SplitError::UnknownMember(name.clone()));
        }
    }
    Ok(())
}

/// Applies a uniform shared bill: records the total on the public account
/// and assigns each selected user an even share, added into their running
/// `total_fee`. Non-selected users have the category fee zeroed.
pub fn apply_shared_bill(
    public: &mut PublicAccount,
    users: &mut BTreeMap<String, PersonalAccount>,
    roster: &BTreeSet<String>,
    utility: SharedUtility,
    total: f64,
    rule: &SplitRule,
) -> Result<Vec<Share>, SplitError> {
    check_amount(total, "total")?;
    let members = rule.resolve(roster)?;
    check_roster_known(users, roster)?;

    let share = total / members.len() as f64;
    *utility.public_total_mut(public) = total;

    let mut shares = Vec::with_capacity(roster.len());
    for name in roster {
        if let Some(account) = users.get_mut(name) {
            let amount = if members.contains(name) { share } else { 0.0 };
            *utility.personal_fee_mut(account) = amount;
            account.total_fee += amount;
            shares.push(Share {
                name: name.clone(),
                amount,
            });
        }
    }
    Ok(shares)
}

/// Applies an electricity bill.
///
/// Each user's personal fee is their metered delta times the unit price.
/// Whatever part of the declared total usage no personal meter accounts for
/// is billed to the public account at the same unit price, then divided per
/// the split rule on top of the personal fees. Every tracked user's meter
/// advances to the newly entered reading.
pub fn apply_electric_bill(
    public: &mut PublicAccount,
    users: &mut BTreeMap<String, PersonalAccount>,
    roster: &BTreeSet<String>,
    bill: &ElectricBill,
    rule: &SplitRule,
) -> Result<ElectricOutcome, SplitError> {
    check_amount(bill.total_kwh, "total usage")?;
    check_amount(bill.unit_price, "unit price")?;
    let members = rule.resolve(roster)?;
    check_roster_known(users, roster)?;

    let mut readings = BTreeMap::new();
    for (name, value) in &bill.readings {
        if !value.is_finite() {
            return Err(SplitError::InvalidAmount(format!(
                "meter reading for '{name}' must be a number"
            )));
        }
        readings.insert(normalize_name(name), *value);
    }
    for name in roster {
        if !readings.contains_key(name) {
            return Err(SplitError::MissingReading(name.clone()));
        }
    }

    let mut metered_kwh = 0.0;
    for name in roster {
        if let (Some(account), Some(&reading)) = (users.get(name), readings.get(name)) {
            metered_kwh += reading - account.last_period_meter_read;
        }
    }
    let remainder_kwh = bill.total_kwh - metered_kwh;
    let public_fee = remainder_kwh * bill.unit_price;
    public.public_electric_fee = public_fee;

    let share = public_fee / members.len() as f64;
    let mut shares = Vec::with_capacity(roster.len());
    for name in roster {
        let Some(account) = users.get_mut(name) else {
            continue;
        };
        let Some(&current) = readings.get(name) else {
            continue;
        };
        let last = account.last_period_meter_read;
        let personal = (current - last) * bill.unit_price;
        let shared = if members.contains(name) { share } else { 0.0 };

        account.personal_electric_fee = personal;
        account.total_electric_fee = personal + shared;
        account.total_fee += account.total_electric_fee;
        account.last_period_meter_read = current;

        shares.push(ElectricShare {
            name: name.clone(),
            current_read: current,
            last_read: last,
            personal_fee: personal,
            shared_fee: shared,
            total_fee: personal + shared,
        });
    }

    Ok(ElectricOutcome {
        shares,
        remainder_kwh,
        public_fee,
    })
}

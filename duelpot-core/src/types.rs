use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Money in indivisible ledger units. All balances, stakes and transfers
/// are denominated in this type; arithmetic is checked so custody math
/// can never silently wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_units(units: u64) -> Self {
        Amount(units)
    }

    pub const fn to_units(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn checked_mul(self, factor: u64) -> Option<Amount> {
        self.0.checked_mul(factor).map(Amount)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} units", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Units created out of nothing (faucet-style credit).
    Issue,
    /// Units moved between two accounts.
    Transfer,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Issue => "issue",
            EntryKind::Transfer => "transfer",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "issue" => EntryKind::Issue,
            _ => EntryKind::Transfer,
        }
    }
}

/// One side of a ledger movement as seen by a single account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub txid: String,
    pub account: Uuid,
    pub amount: i64, // +ve for incoming, -ve for outgoing
    pub counterparty: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_checked_arithmetic() {
        let a = Amount::from_units(3);
        let b = Amount::from_units(4);

        assert_eq!(a.checked_add(b), Some(Amount::from_units(7)));
        assert_eq!(b.checked_sub(a), Some(Amount::from_units(1)));
        assert_eq!(a.checked_sub(b), None);
        assert_eq!(a.checked_mul(2), Some(Amount::from_units(6)));
        assert_eq!(Amount::from_units(u64::MAX).checked_add(a), None);
        assert_eq!(Amount::from_units(u64::MAX).checked_mul(2), None);
    }

    #[test]
    fn amount_display() {
        assert_eq!(Amount::from_units(2).to_string(), "2 units");
        assert!(Amount::ZERO.is_zero());
    }

    #[test]
    fn entry_kind_round_trip() {
        assert_eq!(EntryKind::parse(EntryKind::Issue.as_str()), EntryKind::Issue);
        assert_eq!(
            EntryKind::parse(EntryKind::Transfer.as_str()),
            EntryKind::Transfer
        );
    }
}

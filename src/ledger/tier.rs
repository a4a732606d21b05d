//! Dashboard tier buckets derived from token balance.
//! Display only; nothing in the ledger depends on tiers.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Basic,
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    pub fn from_balance(balance: u64) -> Self {
        match balance {
            1000.. => Tier::Gold,
            500.. => Tier::Silver,
            100.. => Tier::Bronze,
            _ => Tier::Basic,
        }
    }

    /// Progress bar percentage shown next to the tier badge
    pub fn progress(&self) -> u8 {
        match self {
            Tier::Basic => 25,
            Tier::Bronze => 50,
            Tier::Silver => 75,
            Tier::Gold => 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::from_balance(0), Tier::Basic);
        assert_eq!(Tier::from_balance(99), Tier::Basic);
        assert_eq!(Tier::from_balance(100), Tier::Bronze);
        assert_eq!(Tier::from_balance(499), Tier::Bronze);
        assert_eq!(Tier::from_balance(500), Tier::Silver);
        assert_eq!(Tier::from_balance(999), Tier::Silver);
        assert_eq!(Tier::from_balance(1000), Tier::Gold);
        assert_eq!(Tier::from_balance(u64::MAX), Tier::Gold);
    }

    #[test]
    fn test_progress_grows_with_tier() {
        assert!(Tier::Basic.progress() < Tier::Gold.progress());
        assert_eq!(Tier::Gold.progress(), 100);
    }
}

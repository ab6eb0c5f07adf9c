// Credits per owner.
//
// Harvesters earn credits on unloading (see `ai.rs`); construction and unit
// production spend them (see `sim.rs`). Balances never go negative: a
// deduction the owner cannot afford is refused and leaves the balance
// untouched.

use crate::types::Owner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<Owner, i64>,
}

impl Ledger {
    /// Every owner starts with `starting_credits`.
    pub fn new(starting_credits: i64) -> Self {
        Self {
            balances: BTreeMap::from([
                (Owner::Player, starting_credits),
                (Owner::Ai, starting_credits),
            ]),
        }
    }

    pub fn credits(&self, owner: Owner) -> i64 {
        self.balances.get(&owner).copied().unwrap_or(0)
    }

    pub fn can_afford(&self, owner: Owner, amount: i64) -> bool {
        self.credits(owner) >= amount
    }

    pub fn award(&mut self, owner: Owner, amount: i64) {
        *self.balances.entry(owner).or_insert(0) += amount;
    }

    /// Spend `amount`. Returns false, changing nothing, if `owner` cannot
    /// afford it.
    pub fn deduct(&mut self, owner: Owner, amount: i64) -> bool {
        if !self.can_afford(owner, amount) {
            return false;
        }
        *self.balances.entry(owner).or_insert(0) -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners_start_with_the_same_balance() {
        let ledger = Ledger::new(500);
        assert_eq!(ledger.credits(Owner::Player), 500);
        assert_eq!(ledger.credits(Owner::Ai), 500);
    }

    #[test]
    fn award_and_deduct() {
        let mut ledger = Ledger::new(500);
        ledger.award(Owner::Player, 250);
        assert!(ledger.deduct(Owner::Player, 700));
        assert_eq!(ledger.credits(Owner::Player), 50);
        assert_eq!(ledger.credits(Owner::Ai), 500);
    }

    #[test]
    fn refuses_overdraft() {
        let mut ledger = Ledger::new(100);
        assert!(!ledger.deduct(Owner::Ai, 101));
        assert_eq!(ledger.credits(Owner::Ai), 100);
    }
}

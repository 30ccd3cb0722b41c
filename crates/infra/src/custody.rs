//! In-process custody account implementing `Settlement`.
//!
//! Holds the value collected from enrollments and pays it back out. Used by
//! the dev server and tests; a deployment would put a real payment rail
//! behind the same trait.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use thiserror::Error;

use coursemart_core::{Amount, PrincipalId};
use coursemart_marketplace::Settlement;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("custody holds {available}, cannot release {requested}")]
    InsufficientCustody { available: Amount, requested: Amount },

    #[error("custody balance overflow")]
    Overflow,

    #[error("custody lock poisoned")]
    Poisoned,
}

#[derive(Debug, Default)]
struct CustodyState {
    balance: Amount,
    collected: HashMap<PrincipalId, Amount>,
    paid: HashMap<PrincipalId, Amount>,
}

#[derive(Debug, Default)]
pub struct InMemoryCustody {
    state: Mutex<CustodyState>,
}

impl InMemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, CustodyState>, CustodyError> {
        self.state.lock().map_err(|_| CustodyError::Poisoned)
    }

    /// Value currently held.
    pub fn balance(&self) -> Result<Amount, CustodyError> {
        Ok(self.state()?.balance)
    }

    /// Total ever collected from `principal`.
    pub fn collected_from(&self, principal: PrincipalId) -> Result<Amount, CustodyError> {
        Ok(self.state()?.collected.get(&principal).copied().unwrap_or(0))
    }

    /// Total ever released to `principal` (refunds, payouts, sweeps).
    pub fn paid_to(&self, principal: PrincipalId) -> Result<Amount, CustodyError> {
        Ok(self.state()?.paid.get(&principal).copied().unwrap_or(0))
    }

    fn release(&self, to: PrincipalId, amount: Amount) -> Result<(), CustodyError> {
        let mut state = self.state()?;
        if state.balance < amount {
            return Err(CustodyError::InsufficientCustody {
                available: state.balance,
                requested: amount,
            });
        }
        state.balance -= amount;
        *state.paid.entry(to).or_default() += amount;
        Ok(())
    }
}

impl Settlement for InMemoryCustody {
    type Error = CustodyError;

    fn collect(&self, from: PrincipalId, amount: Amount) -> Result<(), CustodyError> {
        let mut state = self.state()?;
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or(CustodyError::Overflow)?;
        *state.collected.entry(from).or_default() += amount;
        Ok(())
    }

    fn refund(&self, to: PrincipalId, amount: Amount) -> Result<(), CustodyError> {
        self.release(to, amount)
    }

    fn payout(&self, to: PrincipalId, amount: Amount) -> Result<(), CustodyError> {
        self.release(to, amount)
    }

    fn sweep(&self, to: PrincipalId) -> Result<Amount, CustodyError> {
        let mut state = self.state()?;
        let amount = std::mem::take(&mut state.balance);
        *state.paid.entry(to).or_default() += amount;
        Ok(amount)
    }
}

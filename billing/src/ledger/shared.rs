// Copyright (c) 2024 Botho Foundation

//! Thread-safe handle to the ledger.
//!
//! Every mutation runs under a single write-lock acquisition, so an emission
//! (plan, validate, mint) and a transfer (check, move) are each indivisible.
//! Queries take the read lock and see a point-in-time snapshot: never a coin
//! that has left one holding but not yet reached the other.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use super::{format_history, CoinId, EmissionReceipt, Ledger, LedgerError, UserBalance};

/// Owned copy of a coin's provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinHistory {
    pub id: CoinId,
    pub owners: Vec<String>,
}

impl CoinHistory {
    /// Owners serialized as `owner;owner;...;`.
    pub fn history(&self) -> String {
        format_history(&self.owners)
    }
}

/// Shared ledger, cloned into every request handler.
#[derive(Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Seed the user set. Call once at startup before serving requests.
    pub fn seed<I, S>(&self, users: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        self.write()?.seed(users)
    }

    /// Snapshot of every user's coin count.
    pub fn list_users(&self) -> Result<Vec<UserBalance>, LedgerError> {
        Ok(self.read()?.list_users())
    }

    /// Run a full emission cycle.
    pub fn emit(&self, amount: u64) -> Result<EmissionReceipt, LedgerError> {
        let result = self.write()?.emit(amount);
        match &result {
            Ok(receipt) => info!(
                amount,
                first_id = receipt.first_id,
                "Emission committed"
            ),
            Err(e) => warn!(amount, "Emission refused: {}", e),
        }
        result
    }

    /// Move `amount` coins from `src` to `dst`.
    pub fn transfer(&self, src: &str, dst: &str, amount: u64) -> Result<(), LedgerError> {
        let result = self.write()?.transfer(src, dst, amount);
        match &result {
            Ok(()) => info!(src, dst, amount, "Transfer committed"),
            Err(e) => warn!(src, dst, amount, "Transfer refused: {}", e),
        }
        result
    }

    /// The coin with the longest ownership history.
    pub fn longest_history_coin(&self) -> Result<CoinHistory, LedgerError> {
        let ledger = self.read()?;
        let coin = ledger.longest_history_coin()?;
        Ok(CoinHistory {
            id: coin.id(),
            owners: coin.owners().to_vec(),
        })
    }

    /// Total coins minted so far.
    pub fn total_coins(&self) -> Result<u64, LedgerError> {
        Ok(self.read()?.total_coins())
    }

    /// Run `f` against a consistent view of the ledger.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&Ledger) -> T) -> Result<T, LedgerError> {
        let ledger = self.read()?;
        Ok(f(&*ledger))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, LedgerError> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, LedgerError> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn demo() -> SharedLedger {
        let shared = SharedLedger::default();
        shared
            .seed([("boris", 5000), ("maria", 1000), ("oleg", 800)])
            .unwrap();
        shared
    }

    #[test]
    fn test_seed_once() {
        let shared = demo();
        assert_eq!(shared.seed([("ivan", 1)]), Err(LedgerError::AlreadySeeded));
    }

    #[test]
    fn test_longest_history_snapshot() {
        let shared = demo();
        assert_eq!(shared.longest_history_coin(), Err(LedgerError::NoCoins));

        shared.emit(10).unwrap();
        shared.transfer("boris", "maria", 1).unwrap();

        let coin = shared.longest_history_coin().unwrap();
        assert_eq!(coin.id, 0);
        assert_eq!(coin.history(), "boris;maria;");
    }

    #[test]
    fn test_concurrent_transfers_never_overdraw() {
        let shared = demo();
        shared.emit(10).unwrap();

        // boris holds 7; ten racing single-coin transfers can only drain 7
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.transfer("boris", "oleg", 1).is_ok())
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(succeeded, 7);
        let users = shared.list_users().unwrap();
        assert_eq!(users[0].amount, 0);
        assert_eq!(users[2].amount, 9);
        assert_eq!(users.iter().map(|u| u.amount).sum::<u64>(), 10);
    }

    #[test]
    fn test_concurrent_emissions_mint_unique_ids() {
        let shared = demo();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.emit(10).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(shared.total_coins().unwrap(), 80);
        let ids_in_order = shared
            .with_ledger(|l| l.coins().iter().enumerate().all(|(i, c)| c.id() == i as u64))
            .unwrap();
        assert!(ids_in_order);
    }
}

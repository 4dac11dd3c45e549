// Copyright (c) 2024 Botho Foundation

use billing_allocation::plan_and_validate;
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, info};

use super::coin::{Coin, CoinId, User};
use super::LedgerError;

/// Result of a committed emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionReceipt {
    /// Id of the first coin minted by this emission.
    pub first_id: CoinId,
    /// Number of coins minted (equals the requested amount).
    pub minted: u64,
    /// Coins minted per user, in seed order.
    pub shares: Vec<(String, u64)>,
}

/// A user's name and current coin count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBalance {
    pub name: String,
    pub amount: u64,
}

/// In-memory coin ledger.
///
/// Users are fixed after [`Ledger::seed`]. Coins live in an arena indexed by
/// id: ids are handed out sequentially and coins are never removed, so
/// `coins[id]` is always the coin with that id.
#[derive(Debug, Default)]
pub struct Ledger {
    /// Users in seed order
    users: Vec<User>,
    /// name -> position in `users`
    index: HashMap<String, usize>,
    /// id -> Coin
    coins: Vec<Coin>,
}

impl Ledger {
    /// Create an empty, unseeded ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger seeded with the given `(name, rating)` pairs.
    pub fn with_users<I, S>(users: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut ledger = Self::new();
        ledger.seed(users)?;
        Ok(ledger)
    }

    /// Install the user set. Can only be done once, and either every user is
    /// added or none is.
    pub fn seed<I, S>(&mut self, users: I) -> Result<(), LedgerError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        if !self.users.is_empty() {
            return Err(LedgerError::AlreadySeeded);
        }

        let mut seeded = Vec::new();
        let mut index = HashMap::new();
        for (name, rating) in users {
            let name = name.into();
            if name.is_empty() {
                return Err(LedgerError::InvalidSeed("empty user name".to_string()));
            }
            if rating == 0 {
                return Err(LedgerError::InvalidSeed(format!(
                    "user {} has zero rating",
                    name
                )));
            }
            if index.insert(name.clone(), seeded.len()).is_some() {
                return Err(LedgerError::InvalidSeed(format!("duplicate user {}", name)));
            }
            seeded.push(User::new(name, rating));
        }

        if seeded.is_empty() {
            return Err(LedgerError::InvalidSeed("no users".to_string()));
        }

        info!(users = seeded.len(), "Seeded ledger");
        self.users = seeded;
        self.index = index;
        Ok(())
    }

    /// Plan, validate and mint an emission of `total_amount` coins.
    ///
    /// Nothing is minted unless the plan validates.
    pub fn emit(&mut self, total_amount: u64) -> Result<EmissionReceipt, LedgerError> {
        let ratings: Vec<u64> = self.users.iter().map(User::rating).collect();
        let plan = plan_and_validate(total_amount, &ratings)?;
        debug!(coin_price = plan.coin_price, "Emission plan validated");

        let first_id = self.next_coin_id();
        let mut shares = Vec::with_capacity(self.users.len());
        for (user, share) in self.users.iter_mut().zip(plan.into_shares()) {
            for _ in 0..share {
                let id = self.coins.len() as CoinId;
                self.coins.push(Coin::mint(id, user.name()));
                user.receive(id);
            }
            shares.push((user.name().to_string(), share));
        }

        Ok(EmissionReceipt {
            first_id,
            minted: total_amount,
            shares,
        })
    }

    /// Move the first `amount` coins of `src`'s holding to `dst`.
    ///
    /// Each moved coin records `dst` as its newest owner. On error the
    /// ledger is unchanged.
    pub fn transfer(&mut self, src: &str, dst: &str, amount: u64) -> Result<(), LedgerError> {
        let src_idx = self.position(src)?;
        let dst_idx = self.position(dst)?;

        let available = self.users[src_idx].amount();
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                user: src.to_string(),
                available,
                requested: amount,
            });
        }

        let moved = self.users[src_idx].take_front(amount as usize);
        let dst_name = self.users[dst_idx].name().to_string();
        for &id in &moved {
            self.coins[id as usize].push_owner(&dst_name);
            self.users[dst_idx].receive(id);
        }

        Ok(())
    }

    /// The coin with the most owners. Among equally long histories the lowest
    /// id wins.
    pub fn longest_history_coin(&self) -> Result<&Coin, LedgerError> {
        self.coins
            .iter()
            .min_by_key(|coin| Reverse(coin.owners().len()))
            .ok_or(LedgerError::NoCoins)
    }

    /// Every user's name and current coin count, in seed order.
    pub fn list_users(&self) -> Vec<UserBalance> {
        self.users
            .iter()
            .map(|u| UserBalance {
                name: u.name().to_string(),
                amount: u.amount(),
            })
            .collect()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.index.get(name).map(|&i| &self.users[i])
    }

    pub fn coin(&self, id: CoinId) -> Option<&Coin> {
        self.coins.get(id as usize)
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    /// Total coins ever minted.
    pub fn total_coins(&self) -> u64 {
        self.coins.len() as u64
    }

    /// Id the next minted coin will receive.
    pub fn next_coin_id(&self) -> CoinId {
        self.coins.len() as CoinId
    }

    pub fn is_seeded(&self) -> bool {
        !self.users.is_empty()
    }

    fn position(&self, name: &str) -> Result<usize, LedgerError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| LedgerError::UserNotFound(name.to_string()))
    }
}

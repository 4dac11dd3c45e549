// Copyright (c) 2024 Botho Foundation

//! Coins and user holdings.

use std::collections::VecDeque;

/// Coin identifier, assigned monotonically at mint time.
pub type CoinId = u64;

/// Separator written after every owner in a serialized history.
pub const HISTORY_SEPARATOR: char = ';';

/// A single minted coin and everyone who has held it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coin {
    id: CoinId,
    /// Append-only; `owners[0]` is the minting user.
    owners: Vec<String>,
}

impl Coin {
    pub(crate) fn mint(id: CoinId, owner: &str) -> Self {
        Self {
            id,
            owners: vec![owner.to_string()],
        }
    }

    pub fn id(&self) -> CoinId {
        self.id
    }

    /// Every holder of this coin, oldest first.
    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    /// The user who received this coin at emission.
    pub fn minted_to(&self) -> &str {
        &self.owners[0]
    }

    /// The current holder.
    pub fn owner(&self) -> &str {
        self.owners.last().map(String::as_str).unwrap_or_default()
    }

    /// Ownership history as `owner;owner;...;` in chronological order.
    pub fn history(&self) -> String {
        format_history(&self.owners)
    }

    pub(crate) fn push_owner(&mut self, owner: &str) {
        self.owners.push(owner.to_string());
    }
}

/// Serialize an owner list the way the provenance query reports it.
pub fn format_history(owners: &[String]) -> String {
    let mut history = String::new();
    for owner in owners {
        history.push_str(owner);
        history.push(HISTORY_SEPARATOR);
    }
    history
}

/// A seeded user and the coins it currently holds.
#[derive(Debug, Clone)]
pub struct User {
    name: String,
    rating: u64,
    /// Holding order: earliest acquired first.
    coins: VecDeque<CoinId>,
}

impl User {
    pub(crate) fn new(name: String, rating: u64) -> Self {
        Self {
            name,
            rating,
            coins: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rating(&self) -> u64 {
        self.rating
    }

    /// Number of coins held. Always derived from the holding.
    pub fn amount(&self) -> u64 {
        self.coins.len() as u64
    }

    /// Held coin ids in holding order.
    pub fn coins(&self) -> impl Iterator<Item = CoinId> + '_ {
        self.coins.iter().copied()
    }

    pub(crate) fn receive(&mut self, coin: CoinId) {
        self.coins.push_back(coin);
    }

    /// Remove the first `count` coins of the holding.
    pub(crate) fn take_front(&mut self, count: usize) -> Vec<CoinId> {
        self.coins.drain(..count).collect()
    }
}

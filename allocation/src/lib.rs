// Copyright (c) 2024 Botho Foundation

//! Emission allocation for the billing coin ledger.
//!
//! An emission distributes a requested number of whole coins across a fixed,
//! ordered set of users in proportion to their ratings, using integer
//! arithmetic only:
//!
//! 1. **Coin price**: `overall_rating / total_amount`, floor division.
//! 2. **Shares**: each user gets `rating / coin_price`, clamped up to 1 so no
//!    user with a positive rating is starved by rounding.
//! 3. **Remainder**: any coins left unassigned go to the *last* user in
//!    order. An overshoot caused by the clamp is never corrected.
//! 4. **Validation**: the plan is accepted only if the shares sum exactly to
//!    the requested total.
//!
//! Step 3 is deliberately non-proportional and step 4 is fail-closed: an
//! emission that a different rounding could have satisfied is still rejected.
//!
//! ## Example
//!
//! | User  | Rating | Share |
//! |-------|--------|-------|
//! | boris | 5000   | 7     |
//! | maria | 1000   | 1     |
//! | oleg  | 800    | 1 + 1 |
//!
//! For a request of 10 coins the price is `6800 / 10 = 680`; the pass assigns
//! 9 coins and the last user absorbs the free coin.

mod plan;

pub use plan::{plan_and_validate, plan_emission, AllocationError, EmissionPlan};

// Copyright (c) 2024 Botho Foundation

//! Planning and validation of a single emission.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-user coin shares proposed for one emission cycle.
///
/// Shares are positional: `shares()[i]` belongs to the i-th rating passed to
/// [`plan_emission`]. A plan is only meaningful until it is validated and
/// committed, or rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct EmissionPlan {
    /// Requested total for this emission.
    pub total_amount: u64,

    /// Price of a single coin in rating units.
    pub coin_price: u64,

    shares: Vec<u64>,
}

impl EmissionPlan {
    /// Planned amount for each user, in input order.
    pub fn shares(&self) -> &[u64] {
        &self.shares
    }

    /// Sum of all planned amounts.
    pub fn planned_total(&self) -> u128 {
        self.shares.iter().map(|&s| s as u128).sum()
    }

    /// Check that the shares sum exactly to the requested total.
    ///
    /// Any mismatch rejects the whole plan.
    pub fn validate(&self) -> Result<(), AllocationError> {
        let planned = self.planned_total();
        if planned != self.total_amount as u128 {
            return Err(AllocationError::Rejected {
                requested: self.total_amount,
                planned,
            });
        }
        Ok(())
    }

    /// Consume the plan, yielding the shares.
    pub fn into_shares(self) -> Vec<u64> {
        self.shares
    }
}

/// Compute the shares of an emission of `total_amount` coins over `ratings`.
///
/// The returned plan has not been validated; see [`EmissionPlan::validate`]
/// or use [`plan_and_validate`].
pub fn plan_emission(total_amount: u64, ratings: &[u64]) -> Result<EmissionPlan, AllocationError> {
    if total_amount == 0 {
        return Err(AllocationError::InvalidAmount);
    }

    let overall_rating = ratings
        .iter()
        .try_fold(0u64, |acc, &r| acc.checked_add(r))
        .ok_or(AllocationError::RatingOverflow)?;

    let coin_price = overall_rating / total_amount;
    if coin_price == 0 {
        return Err(AllocationError::PriceUnderflow {
            requested: total_amount,
            overall_rating,
        });
    }

    let mut shares: Vec<u64> = ratings.iter().map(|&r| (r / coin_price).max(1)).collect();

    // Signed: the clamp can push the running total past the request.
    let assigned: u128 = shares.iter().map(|&s| s as u128).sum();
    let free_coins = total_amount as i128 - assigned as i128;

    if free_coins > 0 {
        if let Some(last) = shares.last_mut() {
            *last += free_coins as u64;
        }
    }

    Ok(EmissionPlan {
        total_amount,
        coin_price,
        shares,
    })
}

/// Plan an emission and reject it unless the shares match the request.
pub fn plan_and_validate(
    total_amount: u64,
    ratings: &[u64],
) -> Result<EmissionPlan, AllocationError> {
    let plan = plan_emission(total_amount, ratings)?;
    plan.validate()?;
    Ok(plan)
}

/// Errors that can occur while planning an emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocationError {
    /// The requested amount is zero.
    InvalidAmount,

    /// The request exceeds the overall rating, so a coin would cost nothing.
    PriceUnderflow { requested: u64, overall_rating: u64 },

    /// The ratings do not fit in a single `u64` sum.
    RatingOverflow,

    /// The planned shares do not add up to the requested total.
    Rejected { requested: u64, planned: u128 },
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationError::InvalidAmount => write!(f, "Emission amount must be positive"),
            AllocationError::PriceUnderflow { requested, overall_rating } => write!(
                f,
                "Emission of {requested} exceeds overall rating {overall_rating}"
            ),
            AllocationError::RatingOverflow => write!(f, "Overall rating overflows"),
            AllocationError::Rejected { requested, planned } => {
                write!(f, "Planned {planned} coins, requested {requested}")
            }
        }
    }
}

impl std::error::Error for AllocationError {}

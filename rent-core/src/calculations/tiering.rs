//! Fixed-threshold classification of a [`CalculatorResult`].
//!
//! The thresholds are marketing heuristics and are kept as literal
//! constants.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{ApprovalScore, CalculatorResult, DisposableTier, RentTier};

const SCORE_BASE: i32 = 50;

/// Classifies a rent-to-income ratio (a whole percentage).
pub fn rent_tier(ratio: u8) -> RentTier {
    match ratio {
        0..=30 => RentTier::Conservative,
        31..=40 => RentTier::Moderate,
        _ => RentTier::HighRisk,
    }
}

/// Classifies the income left over after all commitments.
pub fn disposable_tier(disposable: Decimal) -> DisposableTier {
    if disposable < Decimal::ZERO {
        DisposableTier::Deficit
    } else if disposable < dec!(200) {
        DisposableTier::Strained
    } else if disposable < dec!(500) {
        DisposableTier::Tight
    } else {
        DisposableTier::Comfortable
    }
}

/// Landlord approval score for a result.
///
/// Starts at 50, moves with the rent ratio and with the disposable income,
/// and is clamped into `0..=100`.
pub fn approval_score(result: &CalculatorResult) -> ApprovalScore {
    let ratio = result.rent_to_income_ratio;
    let ratio_points = match ratio {
        0..=25 => 30,
        26..=30 => 20,
        31..=35 => 10,
        36..=40 => 0,
        _ => -10,
    };

    let disposable = result.disposable_income;
    let disposable_points = if disposable >= dec!(1000) {
        20
    } else if disposable >= dec!(500) {
        10
    } else if disposable < dec!(200) {
        -10
    } else {
        0
    };

    ApprovalScore::clamped(SCORE_BASE + ratio_points + disposable_points)
}

/// Every classification of one result, computed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub rent_tier: RentTier,
    pub disposable_tier: DisposableTier,
    pub score: ApprovalScore,
}

impl Assessment {
    pub fn of(result: &CalculatorResult) -> Self {
        Self {
            rent_tier: rent_tier(result.rent_to_income_ratio),
            disposable_tier: disposable_tier(result.disposable_income),
            score: approval_score(result),
        }
    }
}

/// Applicant tip shown under the score.
pub fn applicant_tip(ratio: u8) -> &'static str {
    if ratio <= 30 {
        "Your rent-to-income ratio is under 30%, which puts you ahead of 65% of other applicants."
    } else {
        "Your ratio is slightly high. Offer to sign a longer lease to improve approval odds."
    }
}

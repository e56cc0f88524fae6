//! Affordability calculations and the classifications built on them.
//!
//! Everything in this module is pure and synchronous.

pub mod advice;
pub mod affordability;
pub mod common;
pub mod tiering;

pub use advice::{
    AdviceCategory, AdviceReport, BudgetBreakdown, BudgetSlice, CoachingAdvice, GatedContent,
    Recommendation, RecommendationKind, UpfrontCosts,
};
pub use affordability::calculate;
pub use tiering::{Assessment, approval_score, disposable_tier, rent_tier};

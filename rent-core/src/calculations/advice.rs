//! Copy-driven advice built on top of a calculation.
//!
//! Everything here is a pure function of the inputs and their
//! [`CalculatorResult`]. Recommendations, coaching and the approval score
//! are premium content: [`GatedContent::for_session`] only releases them once
//! the session has been unlocked.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{format_currency, percent_of, round_whole_dollars};
use crate::calculations::tiering::{Assessment, applicant_tip};
use crate::models::{ApprovalScore, CalculatorInput, CalculatorResult, StatusColor};

const APPLICATION_FEES: Decimal = dec!(150);
const MOVING_ESSENTIALS: Decimal = dec!(400);
const MAX_COACHING_ITEMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationKind {
    Success,
    Warning,
    Error,
    Info,
}

impl RecommendationKind {
    pub fn color(&self) -> StatusColor {
        match self {
            Self::Success => StatusColor::Green,
            Self::Warning => StatusColor::Yellow,
            Self::Error | Self::Info => StatusColor::Orange,
        }
    }
}

/// A personalised recommendation card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
    pub action: String,
    /// Lower sorts first.
    pub priority: u8,
}

impl Recommendation {
    fn new(
        kind: RecommendationKind,
        title: &str,
        description: impl Into<String>,
        action: impl Into<String>,
        priority: u8,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            description: description.into(),
            action: action.into(),
            priority,
        }
    }
}

/// Recommendation cards for the current budget, most important first.
///
/// Empty for an empty form.
pub fn recommendations(input: &CalculatorInput, result: &CalculatorResult) -> Vec<Recommendation> {
    use RecommendationKind::*;

    if input.monthly_income.is_zero() {
        return Vec::new();
    }

    let income = input.monthly_income;
    let pct = input.rent_percentage.value();
    let disposable = result.disposable_income;
    let thirty_percent = format_currency(round_whole_dollars(income * dec!(0.3)));

    let mut cards = Vec::with_capacity(3);

    cards.push(match pct {
        0..=25 => Recommendation::new(
            Success,
            "You're Being Super Smart! 🌟",
            format!(
                "At {pct}% of income, you're well within the safe zone. This gives you tons of room for savings and fun stuff!"
            ),
            "Consider investing the extra money or building an emergency fund.",
            1,
        ),
        26..=30 => Recommendation::new(
            Success,
            "Right in the Sweet Spot! 🎯",
            "The 30% rule exists for a reason - you're following it perfectly. This should leave you comfortable.",
            "You're on track! Keep an eye on other expenses to maintain this balance.",
            1,
        ),
        31..=40 => Recommendation::new(
            Warning,
            "Getting a Bit Risky 🤔",
            format!(
                "At {pct}%, you might feel the squeeze. It's doable, but leaves less room for surprises."
            ),
            format!(
                "Consider looking for places around ${thirty_percent} to get back to the 30% sweet spot."
            ),
            1,
        ),
        _ => Recommendation::new(
            Error,
            "This Might Be Too Much 🚨",
            "Over 40% can put serious strain on your budget. You might struggle with other expenses.",
            format!(
                "Strongly consider places under ${thirty_percent} or ways to increase your income."
            ),
            1,
        ),
    });

    if disposable < Decimal::ZERO {
        cards.push(Recommendation::new(
            Error,
            "Houston, We Have a Problem 🛑",
            format!(
                "Your expenses exceed your income by ${}. This isn't sustainable.",
                format_currency(disposable.abs())
            ),
            "Either find a cheaper place, reduce expenses, or boost your income before signing any lease.",
            2,
        ));
    } else if disposable < dec!(200) {
        cards.push(Recommendation::new(
            Warning,
            "Living Paycheck to Paycheck 😬",
            format!(
                "With only ${} left over, one surprise expense could cause problems.",
                format_currency(disposable)
            ),
            "Try to find $200+ breathing room by negotiating rent or trimming other costs.",
            2,
        ));
    } else if disposable >= dec!(500) {
        cards.push(Recommendation::new(
            Success,
            "You've Got This Covered! 💪",
            format!(
                "With ${} left over, you have good financial breathing room.",
                format_currency(disposable)
            ),
            "Perfect! Consider putting some of this toward an emergency fund or retirement savings.",
            2,
        ));
    }

    if income >= dec!(8000) {
        cards.push(Recommendation::new(
            Info,
            "High Earner Perks 🏆",
            "Your income gives you more flexibility. Consider neighborhoods that offer good value.",
            "You might afford premium locations, but don't forget about saving and investing!",
            3,
        ));
    } else if income < dec!(3000) {
        cards.push(Recommendation::new(
            Info,
            "Budget-Conscious Tips 💝",
            "Every dollar counts at your income level. Consider roommates or slightly outside city center.",
            "Look for places with utilities included, or consider shared housing to stretch your budget.",
            3,
        ));
    }

    cards.sort_by_key(|card| card.priority);
    cards
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdviceCategory {
    EmergencyFund,
    SavingsStrategy,
    RentOptimization,
    CreditBuilding,
    IncomeGrowth,
}

impl AdviceCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmergencyFund => "Emergency Fund",
            Self::SavingsStrategy => "Savings Strategy",
            Self::RentOptimization => "Rent Optimization",
            Self::CreditBuilding => "Credit Building",
            Self::IncomeGrowth => "Income Growth",
        }
    }

    pub fn color_hex(&self) -> &'static str {
        match self {
            Self::EmergencyFund | Self::IncomeGrowth => "#2CB853",
            Self::SavingsStrategy => "#BBACF9",
            Self::RentOptimization => "#E16733",
            Self::CreditBuilding => "#FAD75E",
        }
    }
}

/// One "financial coach" paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachingAdvice {
    pub category: AdviceCategory,
    pub title: String,
    pub content: String,
    pub priority: u8,
}

/// The four most pressing coaching paragraphs. Empty for an empty form.
pub fn coaching_advice(input: &CalculatorInput, result: &CalculatorResult) -> Vec<CoachingAdvice> {
    use AdviceCategory::*;

    if input.monthly_income.is_zero() {
        return Vec::new();
    }

    let income = input.monthly_income;
    let pct = input.rent_percentage.value();
    let disposable = result.disposable_income;

    let item = |category, title: &str, content: String, priority| CoachingAdvice {
        category,
        title: title.to_string(),
        content,
        priority,
    };

    let mut advice = Vec::with_capacity(5);

    advice.push(item(
        EmergencyFund,
        "Your Safety Net Strategy 🛡️",
        if disposable > dec!(300) {
            let monthly_saving = round_whole_dollars(disposable * dec!(0.5)).min(dec!(300));
            format!(
                "Great news! With ${} left over each month, you can build a solid emergency fund. Try saving ${} monthly - you'll have 3 months of expenses saved in no time!",
                format_currency(disposable),
                format_currency(monthly_saving)
            )
        } else {
            format!(
                "Money's tight with only ${} left over. Start small - even $25/month adds up! Look for ways to trim expenses so you can build that crucial safety net.",
                format_currency(disposable)
            )
        },
        1,
    ));

    advice.push(item(
        SavingsStrategy,
        "Growing Your Money Tree 🌱",
        if income > dec!(5000) {
            format!(
                "As a higher earner, you should aim to save 20% of your income (${}). Consider maxing out retirement accounts and looking into index fund investing.",
                format_currency(round_whole_dollars(income * dec!(0.2)))
            )
        } else {
            "Start with the 50/30/20 rule: 50% needs, 30% wants, 20% savings. Even if you can't hit 20% yet, start with whatever you can manage. Every dollar saved is a dollar working for your future!".to_string()
        },
        2,
    ));

    if pct > 30 {
        advice.push(item(
            RentOptimization,
            "Getting Your Housing Costs Right 🏠",
            format!(
                "At {pct}% of income, housing is eating too much of your budget. Try to find places around ${} (30% rule). Consider roommates, slightly longer commutes, or negotiating with your current landlord.",
                format_currency(round_whole_dollars(income * dec!(0.3)))
            ),
            1,
        ));
    } else {
        advice.push(item(
            RentOptimization,
            "Housing Win! 🏠",
            format!(
                "You're crushing it at {pct}%! This smart housing choice leaves room for other financial goals. Just make sure you're not sacrificing too much quality of life for savings."
            ),
            3,
        ));
    }

    advice.push(item(
        CreditBuilding,
        "Building Your Credit Score 📈",
        "Strong credit = better rent deals and loan rates. Pay all bills on time, keep credit card balances low (under 30% of limit), and check your credit report annually. Good credit can save you thousands over time!".to_string(),
        2,
    ));

    advice.push(item(
        IncomeGrowth,
        "Boosting Your Earning Power 💪",
        if income < dec!(4000) {
            format!(
                "At ${}/month, growing your income could be game-changing. Consider skill development, side hustles, or asking for a raise. Even an extra $500/month would dramatically improve your financial picture.",
                format_currency(income)
            )
        } else {
            "You're in good shape income-wise! Focus on advancing in your career, building valuable skills, and maybe exploring passive income streams. The key is making your money work harder, not just working harder for money.".to_string()
        },
        2,
    ));

    advice.sort_by_key(|a| a.priority);
    advice.truncate(MAX_COACHING_ITEMS);
    advice
}

/// Cash needed on signing day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpfrontCosts {
    pub first_month: Decimal,
    pub security_deposit: Decimal,
    pub application_fees: Decimal,
    pub moving_essentials: Decimal,
}

impl UpfrontCosts {
    pub fn total(&self) -> Decimal {
        self.first_month + self.security_deposit + self.application_fees + self.moving_essentials
    }
}

/// Move-in costs for `monthly_rent`; `None` when there is no rent yet.
pub fn upfront_costs(monthly_rent: Decimal) -> Option<UpfrontCosts> {
    if monthly_rent <= Decimal::ZERO {
        return None;
    }
    Some(UpfrontCosts {
        first_month: monthly_rent,
        security_deposit: monthly_rent,
        application_fees: APPLICATION_FEES,
        moving_essentials: MOVING_ESSENTIALS,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetSlice {
    pub label: &'static str,
    pub amount: Decimal,
    /// Percentage of income, one decimal place.
    pub share: Decimal,
}

/// Where the monthly income goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetBreakdown {
    pub total_income: Decimal,
    pub slices: Vec<BudgetSlice>,
}

impl BudgetBreakdown {
    pub fn remaining(&self) -> Decimal {
        self.slices
            .last()
            .map(|slice| slice.amount)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn status_message(&self) -> &'static str {
        let remaining = self.remaining();
        if remaining >= dec!(500) {
            "Great job! You've got breathing room! 🌟"
        } else if remaining >= dec!(200) {
            "Not bad, but a bit tight 🤏"
        } else {
            "This might be pushing it 😅"
        }
    }
}

/// Rent, expenses, debt and what is left (never below zero).
///
/// `None` for an empty form.
pub fn budget_breakdown(input: &CalculatorInput, result: &CalculatorResult) -> Option<BudgetBreakdown> {
    if input.monthly_income.is_zero() {
        return None;
    }

    let income = input.monthly_income;
    let slice = |label, amount: Decimal| BudgetSlice {
        label,
        amount,
        share: percent_of(amount, income),
    };

    Some(BudgetBreakdown {
        total_income: income,
        slices: vec![
            slice("Rent", result.max_rent),
            slice("Other Expenses", input.non_rent_expenses),
            slice("Debt Payments", input.monthly_debt),
            slice("Available Money", result.disposable_income.max(Decimal::ZERO)),
        ],
    })
}

/// Premium content for an unlocked session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceReport {
    pub score: ApprovalScore,
    pub applicant_tip: &'static str,
    pub recommendations: Vec<Recommendation>,
    pub coaching: Vec<CoachingAdvice>,
}

impl AdviceReport {
    pub fn build(input: &CalculatorInput, result: &CalculatorResult) -> Self {
        Self {
            score: Assessment::of(result).score,
            applicant_tip: applicant_tip(result.rent_to_income_ratio),
            recommendations: recommendations(input, result),
            coaching: coaching_advice(input, result),
        }
    }
}

/// Premium content as seen by the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GatedContent {
    /// Email not yet captured; only a blurred teaser is shown.
    Locked,
    Unlocked(AdviceReport),
}

impl GatedContent {
    pub fn for_session(unlocked: bool, input: &CalculatorInput, result: &CalculatorResult) -> Self {
        if unlocked {
            Self::Unlocked(AdviceReport::build(input, result))
        } else {
            Self::Locked
        }
    }

    pub fn report(&self) -> Option<&AdviceReport> {
        match self {
            Self::Locked => None,
            Self::Unlocked(report) => Some(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::calculations::affordability::calculate;
    use crate::models::RentPercentage;

    fn scenario(income: i64, expenses: i64, debt: i64, pct: i64) -> (CalculatorInput, CalculatorResult) {
        let input = CalculatorInput {
            monthly_income: Decimal::from(income),
            non_rent_expenses: Decimal::from(expenses),
            monthly_debt: Decimal::from(debt),
            rent_percentage: RentPercentage::new(pct),
        };
        (input, calculate(&input))
    }

    fn titles(cards: &[Recommendation]) -> Vec<&str> {
        cards.iter().map(|c| c.title.as_str()).collect()
    }

    // =========================================================================
    // recommendations tests
    // =========================================================================

    #[test]
    fn recommendations_for_comfortable_budget() {
        let (input, result) = scenario(5000, 1500, 0, 30);

        let cards = recommendations(&input, &result);

        assert_eq!(
            titles(&cards),
            vec!["Right in the Sweet Spot! 🎯", "You've Got This Covered! 💪"]
        );
        assert_eq!(
            cards[1].description,
            "With $2,000 left over, you have good financial breathing room."
        );
    }

    #[test]
    fn recommendations_for_over_committed_low_income() {
        let (input, result) = scenario(2800, 1200, 500, 45);

        let cards = recommendations(&input, &result);

        assert_eq!(
            titles(&cards),
            vec![
                "This Might Be Too Much 🚨",
                "Houston, We Have a Problem 🛑",
                "Budget-Conscious Tips 💝"
            ]
        );
        assert_eq!(cards[0].kind, RecommendationKind::Error);
        assert_eq!(
            cards[0].action,
            "Strongly consider places under $840 or ways to increase your income."
        );
        // 2800 - (1260 + 1200 + 500)
        assert!(cards[1].description.contains("$160"));
    }

    #[test]
    fn recommendations_skip_disposable_card_for_tight_budget() {
        // 4000 * 35% = 1400; 4000 - 1400 - 2300 = 300
        let (input, result) = scenario(4000, 2300, 0, 35);

        let cards = recommendations(&input, &result);

        assert_eq!(titles(&cards), vec!["Getting a Bit Risky 🤔"]);
        assert!(cards[0].action.contains("$1,200"));
    }

    #[test]
    fn recommendations_flag_high_earners() {
        let (input, result) = scenario(9000, 2000, 0, 20);

        let cards = recommendations(&input, &result);

        assert_eq!(cards[0].title, "You're Being Super Smart! 🌟");
        assert_eq!(cards.last().map(|c| c.title.as_str()), Some("High Earner Perks 🏆"));
    }

    #[test]
    fn recommendations_empty_for_empty_form() {
        let (input, result) = scenario(0, 0, 0, 30);

        assert!(recommendations(&input, &result).is_empty());
    }

    // =========================================================================
    // coaching_advice tests
    // =========================================================================

    #[test]
    fn coaching_is_capped_at_four_items() {
        let (input, result) = scenario(3000, 1200, 500, 45);

        let advice = coaching_advice(&input, &result);

        assert_eq!(advice.len(), 4);
        assert_eq!(
            advice.iter().map(|a| a.category).collect::<Vec<_>>(),
            vec![
                AdviceCategory::EmergencyFund,
                AdviceCategory::RentOptimization,
                AdviceCategory::SavingsStrategy,
                AdviceCategory::CreditBuilding,
            ]
        );
    }

    #[test]
    fn coaching_drops_housing_win_when_within_thirty_percent() {
        let (input, result) = scenario(5000, 1500, 0, 30);

        let advice = coaching_advice(&input, &result);

        assert!(advice.iter().all(|a| a.category != AdviceCategory::RentOptimization));
        assert_eq!(advice.last().map(|a| a.category), Some(AdviceCategory::IncomeGrowth));
    }

    #[test]
    fn emergency_fund_saving_is_capped_at_three_hundred() {
        let (input, result) = scenario(5000, 1500, 0, 30);

        let advice = coaching_advice(&input, &result);

        assert!(advice[0].content.contains("With $2,000 left over"));
        assert!(advice[0].content.contains("Try saving $300 monthly"));
    }

    #[test]
    fn emergency_fund_saving_uses_half_of_small_surplus() {
        // 4000 - 1200 - 2400 = 400 -> save 200
        let (input, result) = scenario(4000, 2400, 0, 30);

        let advice = coaching_advice(&input, &result);

        assert!(advice[0].content.contains("Try saving $200 monthly"));
    }

    #[test]
    fn coaching_empty_for_empty_form() {
        let (input, result) = scenario(0, 100, 0, 30);

        assert!(coaching_advice(&input, &result).is_empty());
    }

    // =========================================================================
    // upfront_costs / budget_breakdown tests
    // =========================================================================

    #[test]
    fn upfront_costs_add_fees_and_moving() {
        let costs = upfront_costs(dec!(1500)).unwrap();

        assert_eq!(costs.total(), dec!(3550));
    }

    #[test]
    fn upfront_costs_absent_without_rent() {
        assert_eq!(upfront_costs(Decimal::ZERO), None);
    }

    #[test]
    fn budget_breakdown_shares_sum_to_income() {
        let (input, result) = scenario(5000, 1500, 500, 30);

        let breakdown = budget_breakdown(&input, &result).unwrap();

        let total: Decimal = breakdown.slices.iter().map(|s| s.amount).sum();
        assert_eq!(total, dec!(5000));
        assert_eq!(breakdown.slices[0].share, dec!(30.0));
        assert_eq!(breakdown.remaining(), dec!(1500));
        assert_eq!(breakdown.status_message(), "Great job! You've got breathing room! 🌟");
    }

    #[test]
    fn budget_breakdown_floors_remaining_at_zero() {
        let (input, result) = scenario(3000, 1200, 500, 45);

        let breakdown = budget_breakdown(&input, &result).unwrap();

        assert_eq!(breakdown.remaining(), Decimal::ZERO);
        assert_eq!(breakdown.status_message(), "This might be pushing it 😅");
    }

    // =========================================================================
    // GatedContent tests
    // =========================================================================

    #[test]
    fn locked_session_gets_no_report() {
        let (input, result) = scenario(5000, 1500, 0, 30);

        let content = GatedContent::for_session(false, &input, &result);

        assert_eq!(content, GatedContent::Locked);
        assert!(content.report().is_none());
    }

    #[test]
    fn unlocked_session_gets_score_and_advice() {
        let (input, result) = scenario(5000, 1500, 0, 30);

        let content = GatedContent::for_session(true, &input, &result);
        let report = content.report().unwrap();

        assert_eq!(report.score.value(), 90);
        assert_eq!(report.recommendations.len(), 2);
        assert_eq!(report.coaching.len(), 4);
        assert!(report.applicant_tip.contains("under 30%"));
    }
}

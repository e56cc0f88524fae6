use serde::{Deserialize, Serialize};

/// Traffic-light colour token shared by every tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusColor {
    Green,
    Yellow,
    Orange,
}

impl StatusColor {
    pub fn hex(&self) -> &'static str {
        match self {
            Self::Green => "#2CB853",
            Self::Yellow => "#FAD75E",
            Self::Orange => "#E16733",
        }
    }
}

/// Bucket for the rent-to-income ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentTier {
    Conservative,
    Moderate,
    HighRisk,
}

impl RentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::HighRisk => "highRisk",
        }
    }

    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Conservative => "You're in the safe zone! 🎉",
            Self::Moderate => "Getting a bit risky, but doable 🤔",
            Self::HighRisk => "Heads up: this might be too much 🚨",
        }
    }

    /// Slider caption.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Conservative => "Excellent - Within recommended range",
            Self::Moderate => "Moderate - Consider reducing if possible",
            Self::HighRisk => "High - May strain your budget",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            Self::Conservative => StatusColor::Green,
            Self::Moderate => StatusColor::Yellow,
            Self::HighRisk => StatusColor::Orange,
        }
    }
}

/// Bucket for income left after rent, expenses and debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisposableTier {
    Deficit,
    Strained,
    Tight,
    Comfortable,
}

impl DisposableTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deficit => "deficit",
            Self::Strained => "strained",
            Self::Tight => "tight",
            Self::Comfortable => "comfortable",
        }
    }

    pub fn status_message(&self) -> &'static str {
        match self {
            Self::Deficit => "Time to adjust something! 🔧",
            Self::Strained => "This might be stretching it 😬",
            Self::Tight => "Tight, but manageable 😅",
            Self::Comfortable => "Looking good! 💪",
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Self::Deficit => "Consider reducing expenses or increasing income",
            _ => "For fun stuff, savings, and surprises",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            Self::Comfortable => StatusColor::Green,
            Self::Tight => StatusColor::Yellow,
            Self::Strained | Self::Deficit => StatusColor::Orange,
        }
    }
}

/// "Landlord approval score", always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApprovalScore(u8);

impl ApprovalScore {
    pub const MIN: i32 = 0;
    pub const MAX: i32 = 100;

    /// Clamps a raw heuristic total into range.
    pub fn clamped(raw: i32) -> Self {
        Self(raw.clamp(Self::MIN, Self::MAX) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> ScoreBand {
        match self.0 {
            80.. => ScoreBand::Excellent,
            60..=79 => ScoreBand::Strong,
            _ => ScoreBand::Risky,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    Excellent,
    Strong,
    Risky,
}

impl ScoreBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent Applicant 🌟",
            Self::Strong => "Strong Applicant ✅",
            Self::Risky => "Risky Applicant ⚠️",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Landlords will likely approve your application immediately.",
            Self::Strong => "You meet most criteria. Having a good credit score will seal the deal.",
            Self::Risky => "You might need a guarantor or a higher security deposit.",
        }
    }
}

//! One-page report export.
//!
//! [`ReportDocument::compose`] turns the current numbers into a renderer
//! neutral document; an [`ExportAdapter`] renders it through a
//! [`DocumentRenderer`] and writes the bytes via a temporary sibling file
//! that is renamed into place, so the destination is either the complete
//! report or untouched.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::calculations::advice::upfront_costs;
use crate::calculations::common::format_currency;
use crate::calculations::{Assessment, GatedContent};
use crate::models::{CalculatorInput, CalculatorResult};

pub const REPORT_TITLE: &str = "Rent Affordability Report";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("render failed: {0}")]
    Render(String),

    #[error("write to {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid export destination: {0}")]
    InvalidDestination(PathBuf),

    #[error("an export is already running")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    pub heading: String,
    pub lines: Vec<ReportLine>,
}

impl ReportSection {
    fn new(heading: &str) -> Self {
        Self {
            heading: heading.to_string(),
            lines: Vec::new(),
        }
    }

    fn line(mut self, label: &str, value: impl Into<String>) -> Self {
        self.lines.push(ReportLine {
            label: label.to_string(),
            value: value.into(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_on: NaiveDate,
    pub sections: Vec<ReportSection>,
}

/// `$1,500`, `-$50`.
fn money(value: Decimal) -> String {
    if value.is_sign_negative() && !value.is_zero() {
        format!("-${}", format_currency(value.abs()))
    } else {
        format!("${}", format_currency(value))
    }
}

impl ReportDocument {
    /// Builds the report for the current session. The approval score section
    /// is only present when `gated` is unlocked; upfront costs only when
    /// there is a rent figure.
    pub fn compose(
        input: &CalculatorInput,
        result: &CalculatorResult,
        gated: &GatedContent,
        generated_on: NaiveDate,
    ) -> Self {
        let assessment = Assessment::of(result);
        let mut sections = vec![
            ReportSection::new("Your Results")
                .line("Monthly income", money(input.monthly_income))
                .line("Rent percentage", input.rent_percentage.to_string())
                .line("Maximum monthly rent", money(result.max_rent))
                .line("Total monthly commitments", money(result.total_committed))
                .line("Money left each month", money(result.disposable_income))
                .line("Rent-to-income ratio", format!("{}%", result.rent_to_income_ratio)),
            ReportSection::new("Affordability")
                .line("Rent level", assessment.rent_tier.status_message())
                .line("Budget", assessment.disposable_tier.status_message()),
        ];

        if let Some(report) = gated.report() {
            sections.push(
                ReportSection::new("Landlord Approval Score")
                    .line("Score", format!("{}/100", report.score.value()))
                    .line("Rating", report.score.band().label())
                    .line("Outlook", report.score.band().description())
                    .line("Tip", report.applicant_tip),
            );
        }

        if let Some(costs) = upfront_costs(result.max_rent) {
            sections.push(
                ReportSection::new("Upfront Costs")
                    .line("First month's rent", money(costs.first_month))
                    .line("Security deposit", money(costs.security_deposit))
                    .line("Application fees", money(costs.application_fees))
                    .line("Moving essentials", money(costs.moving_essentials))
                    .line("Total move-in cash", money(costs.total())),
            );
        }

        Self {
            title: REPORT_TITLE.to_string(),
            generated_on,
            sections,
        }
    }

    pub fn section(&self, heading: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.heading == heading)
    }
}

/// Turns a document into file bytes.
pub trait DocumentRenderer: Send + Sync {
    /// File extension without the dot, e.g. `"txt"`.
    fn extension(&self) -> &'static str;

    fn render(&self, document: &ReportDocument) -> Result<Vec<u8>, ExportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting,
}

pub struct ExportAdapter {
    renderer: Box<dyn DocumentRenderer>,
    state: ExportState,
}

impl ExportAdapter {
    pub fn new(renderer: Box<dyn DocumentRenderer>) -> Self {
        Self {
            renderer,
            state: ExportState::Idle,
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn extension(&self) -> &'static str {
        self.renderer.extension()
    }

    /// Renders `document` and writes it to `destination`.
    ///
    /// The adapter is back in [`ExportState::Idle`] when this returns,
    /// whatever the outcome.
    pub async fn export(
        &mut self,
        document: &ReportDocument,
        destination: &Path,
    ) -> Result<(), ExportError> {
        if self.state == ExportState::Exporting {
            return Err(ExportError::Busy);
        }

        self.state = ExportState::Exporting;
        let outcome = self.write(document, destination).await;
        self.state = ExportState::Idle;

        match &outcome {
            Ok(()) => tracing::info!(path = %destination.display(), "report exported"),
            Err(e) => tracing::error!(error = %e, path = %destination.display(), "report export failed"),
        }
        outcome
    }

    async fn write(&self, document: &ReportDocument, destination: &Path) -> Result<(), ExportError> {
        let tmp = temp_path(destination)?;
        let bytes = self.renderer.render(document)?;

        if let Err(source) = tokio::fs::write(&tmp, &bytes).await {
            discard(&tmp).await;
            return Err(ExportError::Io { path: tmp, source });
        }

        if let Err(source) = tokio::fs::rename(&tmp, destination).await {
            discard(&tmp).await;
            return Err(ExportError::Io {
                path: destination.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for ExportAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportAdapter")
            .field("extension", &self.renderer.extension())
            .field("state", &self.state)
            .finish()
    }
}

fn temp_path(destination: &Path) -> Result<PathBuf, ExportError> {
    let name = destination
        .file_name()
        .ok_or_else(|| ExportError::InvalidDestination(destination.to_path_buf()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    tmp_name.push(".tmp");
    Ok(destination.with_file_name(tmp_name))
}

async fn discard(tmp: &Path) {
    match tokio::fs::remove_file(tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(error = %e, path = %tmp.display(), "could not remove temporary export file")
        }
    }
}

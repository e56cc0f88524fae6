use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rent_core::calculations::common::format_currency;
use rent_core::calculations::affordability::income_before_rent;
use rent_core::calculations::{Assessment, GatedContent, advice::budget_breakdown};
use rent_core::export::{ExportAdapter, ReportDocument};
use rent_core::gate::{EmailGateController, GateError};
use rent_core::models::RegistrationResponse;
use rent_core::session::SessionStateManager;
use rent_core::store::{
    LeadRepository, MemoryStoreFactory, OfflineLeadRepository, QueuedSpreadsheetSync,
    StoreRegistry,
};
use rent_db_sqlite::SqliteStoreFactory;
use tracing::{info, warn};

use crate::config::{AppConfig, LeadSource};
use crate::hosted::HostedLeadRepository;
use crate::render::{ExportFormat, TextRenderer};

/// Registry with every backend this binary ships.
pub fn build_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();
    registry.register(Box::new(MemoryStoreFactory));
    registry.register(Box::new(SqliteStoreFactory));
    registry
}

/// The calculator session, its email gate and the export path, wired to the
/// configured storage.
pub struct RentCalculator {
    session: SessionStateManager,
    gate: EmailGateController,
}

impl RentCalculator {
    /// Opens storage, restores the saved form and any previous unlock.
    ///
    /// Leads go to the hosted backend, or to the store itself when
    /// `backend.source = "store"`. A hosted source without credentials runs
    /// offline and every unlock attempt fails with a retryable error.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self> {
        let store_config = config.store_config();
        let handles = build_registry()
            .open(&store_config)
            .await
            .with_context(|| format!("Failed to open '{}' store", store_config.backend))?;

        let leads: Arc<dyn LeadRepository> = match (config.backend.source, config.backend.credentials()) {
            (LeadSource::Store, _) => handles.leads,
            (LeadSource::Hosted, Some((url, key))) => Arc::new(
                HostedLeadRepository::new(url, key).context("Invalid lead backend configuration")?,
            ),
            (LeadSource::Hosted, None) => {
                warn!("lead backend credentials missing; running in offline mode");
                Arc::new(OfflineLeadRepository)
            }
        };

        let session = SessionStateManager::restore(handles.local.clone()).await;
        let mut gate = EmailGateController::new(
            handles.local,
            leads,
            Arc::new(QueuedSpreadsheetSync),
            config.client_info.clone(),
        );
        gate.restore().await;

        Ok(Self { session, gate })
    }

    pub fn session(&self) -> &SessionStateManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStateManager {
        &mut self.session
    }

    pub fn gate(&self) -> &EmailGateController {
        &self.gate
    }

    pub fn gated_content(&self) -> GatedContent {
        GatedContent::for_session(self.gate.is_unlocked(), &self.session.input(), self.session.result())
    }

    /// Submits `email` together with the current numbers.
    pub async fn unlock(&mut self, email: &str) -> Result<RegistrationResponse, GateError> {
        let input = self.session.input();
        let result = *self.session.result();
        self.gate.submit(email, Some((&input, &result))).await
    }

    pub fn report(&self, generated_on: NaiveDate) -> ReportDocument {
        ReportDocument::compose(
            &self.session.input(),
            self.session.result(),
            &self.gated_content(),
            generated_on,
        )
    }

    pub async fn export(&self, destination: &Path, format: ExportFormat) -> Result<()> {
        let document = self.report(Local::now().date_naive());
        let mut adapter = ExportAdapter::new(format.renderer());
        adapter
            .export(&document, destination)
            .await
            .with_context(|| format!("Failed to export report to '{}'", destination.display()))?;
        info!(path = %destination.display(), "report written");
        Ok(())
    }

    /// Everything the terminal shows: the report page, the budget split and,
    /// once unlocked, the advice.
    pub fn summary(&self, generated_on: NaiveDate) -> String {
        let input = self.session.input();
        let result = self.session.result();
        let mut out = TextRenderer::to_text(&self.report(generated_on));

        let assessment = Assessment::of(result);
        out.push_str(&format!(
            "\nAvailable before rent: ${}\nRent tier: {} ({})\nBudget tier: {} - {}\n",
            format_currency(income_before_rent(&input)),
            assessment.rent_tier.as_str(),
            assessment.rent_tier.recommendation(),
            assessment.disposable_tier.as_str(),
            assessment.disposable_tier.caption(),
        ));

        if let Some(breakdown) = budget_breakdown(&input, result) {
            out.push_str("\nBudget Breakdown\n----------------\n");
            for slice in &breakdown.slices {
                out.push_str(&format!(
                    "{:<18}${:>10} {:>5}%\n",
                    slice.label,
                    format_currency(slice.amount),
                    slice.share
                ));
            }
            out.push_str(breakdown.status_message());
            out.push('\n');
        }

        match self.gated_content() {
            GatedContent::Locked => {
                out.push_str("\nUnlock personalised advice with --unlock <EMAIL>.\n");
            }
            GatedContent::Unlocked(report) => {
                out.push_str("\nRecommendations\n---------------\n");
                for rec in &report.recommendations {
                    out.push_str(&format!("* {}: {}\n  {}\n", rec.title, rec.description, rec.action));
                }
                out.push_str("\nFinancial Coaching\n------------------\n");
                for advice in &report.coaching {
                    out.push_str(&format!("* [{}] {}\n  {}\n", advice.category.label(), advice.title, advice.content));
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for RentCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RentCalculator")
            .field("session", &self.session)
            .field("gate", &self.gate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_ships_memory_and_sqlite() {
        assert_eq!(build_registry().available_backends(), vec!["memory", "sqlite"]);
    }
}

pub mod calculations;
pub mod export;
pub mod gate;
pub mod models;
pub mod session;
pub mod store;

pub use export::{DocumentRenderer, ExportAdapter, ExportError, ReportDocument};
pub use gate::{EmailGateController, GateError, GateEvent, GateState};
pub use models::*;
pub use session::SessionStateManager;
pub use store::{KeyValueStore, LeadRepository, RepositoryError, StoreError};

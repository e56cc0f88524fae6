//! Storage seams: browser-style local storage, the hosted lead database and
//! the spreadsheet sync, plus the registry that picks a backend by name.

pub mod factory;
pub mod memory;
pub mod repository;
pub mod sync;

pub use factory::{MemoryStoreFactory, StoreConfig, StoreFactory, StoreHandles, StoreRegistry};
pub use memory::{MemoryLeadRepository, MemoryStore, OFFLINE_MESSAGE, OfflineLeadRepository};
pub use repository::{KeyValueStore, LeadRepository, RepositoryError, StoreError};
pub use sync::{QueuedSpreadsheetSync, SpreadsheetSync};

//! SQLite backend for the rent calculator's storage seams.

pub mod decimal;
pub mod factory;
pub mod repository;

pub use factory::SqliteStoreFactory;
pub use repository::SqliteRepository;

//! Engine services: persistence, calculators, lifecycle orchestration.

pub mod calculators;
pub mod database;
pub mod events;
pub mod factory;
pub mod sequence;
pub mod tax_config;
pub mod tax_ledger;

pub use database::Database;
pub use events::{DocumentEvent, EventBus};
pub use factory::DocumentFactory;
pub use tax_config::TaxConfigProvider;

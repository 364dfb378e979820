//! Commercial document engine: creation, recalculation, conversion and
//! numbering of work orders and invoices across three line-item shapes.

pub mod domain;
pub mod models;
pub mod services;

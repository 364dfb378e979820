//! Data models for the document engine.

pub mod bulk;
pub mod commission;
pub mod container;
pub mod document;
pub mod operation;
pub mod sequence;
pub mod tax;

pub use bulk::{BulkLot, LotInput};
pub use commission::{Prime, PrimeStatus, BENEFICIARY_REPRESENTANT, BENEFICIARY_TRANSITAIRE};
pub use container::{ContainerInput, ContainerLine, ContainerOperation, ContainerOperationInput};
pub use document::{
    DiscountType, Document, DocumentCategory, DocumentInput, DocumentKind, DocumentStatus, LineSet,
};
pub use operation::{OperationInput, ServiceOperation};
pub use sequence::SequenceCounter;
pub use tax::{MonthlyTaxAggregate, TaxAmounts, TaxRateConfig, TAX_CODE_CSS, TAX_CODE_TVA};

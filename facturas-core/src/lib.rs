//! facturas-core: pure domain logic for the invoice processing and
//! approval pipeline. No I/O here; boundary clients live in
//! `facturas-client`.

pub mod aggregate;
pub mod amount;
pub mod approval;
pub mod dates;
pub mod error;
pub mod filter;
pub mod invoice;
pub mod normalize;
pub mod refs;

pub use amount::Amount;
pub use approval::{
    transition_fields, validate_decision, validate_transition, Decision, TransitionFields,
};
pub use error::PipelineError;
pub use filter::Filter;
pub use invoice::{CategoryField, ExtractedFields, ProyectField, RawData, RawInvoice, Status};
pub use normalize::{normalize, NormalizedInvoice, NOT_AVAILABLE};
pub use refs::{Category, Project, ReferenceMaps};

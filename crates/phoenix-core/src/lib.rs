pub mod error;
pub mod types;

pub mod terms;
pub mod readiness;
pub mod path;
pub mod performance;
pub mod result;
pub mod engine;
pub mod pricing;
pub mod batch;

pub use engine::calculate_phoenix;
pub use error::PhoenixError;
pub use path::PricePath;
pub use performance::performance_ratio;
pub use result::{CalculationResult, ObservationEvent, TerminationKind};
pub use terms::{ProductTerms, StructureKind, Underlying};
pub use types::*;

/// Standard result type for all phoenix-core operations
pub type PhoenixResult<T> = Result<T, PhoenixError>;

pub mod file;
pub mod stdin;

use phoenix_core::readiness::{admit_terms, StructuralGate};
use phoenix_core::ProductTerms;

/// Load a term sheet and pass it through the structural readiness gate.
pub fn load_terms(path: &str) -> Result<ProductTerms, Box<dyn std::error::Error>> {
    let sheet = file::read_document_value(path)?;
    Ok(admit_terms(&sheet, &StructuralGate)?)
}

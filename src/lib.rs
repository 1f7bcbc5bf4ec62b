//! Blood test report analysis.
//!
//! Text pulled from an uploaded lab report is scanned for known parameter
//! names, each value is checked against its reference range, and the
//! abnormal set is mapped to specialties worth consulting. Free-text
//! symptoms map to suggested tests through a separate lookup table.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod reference;
pub mod specialty;
pub mod store;
pub mod symptoms;
pub mod web;

pub use analysis::{Analyzer, KnowledgeBase, ReportAnalysis};
pub use classify::{classify, Deviation, Reading, Status};
pub use error::{Error, Result};
pub use extract::{DocumentKind, TextExtractor};
pub use matcher::{ParameterMatcher, RawReading};
pub use reference::{ReferenceRange, ReferenceTable};
pub use specialty::{Recommendation, SpecialtyMapping, ALL_NORMAL};
pub use symptoms::SymptomMapping;

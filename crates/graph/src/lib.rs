//! `graph` crate: the workflow canvas model, AI generation parsing and
//! merge, the steps persistence adapter, diagnostics, and export/import.
//!
//! Everything here is synchronous and free of I/O.

pub mod models;
pub mod error;
pub mod entropy;
pub mod catalog;
pub mod parser;
pub mod canvas;
pub mod steps;
pub mod inspect;
pub mod transfer;

pub use models::{IconKind, IntegrationRef, Position, StepKind, WorkflowEdge, WorkflowNode};
pub use error::TransferError;
pub use entropy::{Entropy, SeededEntropy, SystemEntropy};
pub use parser::{parse_ai_response, ParsedGraph};
pub use canvas::{Canvas, GenerationSummary};
pub use steps::{from_steps, to_steps, Step};
pub use inspect::{inspect, GraphReport};
pub use transfer::{ExportDocument, ExportMetadata, ImportDocument};

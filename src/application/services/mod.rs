//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod batch;
mod mindmap;

pub use batch::{BatchOutcome, BatchService, GENERATED_SUFFIX};
pub use mindmap::{Conversion, MindMapService, RenderOptions};

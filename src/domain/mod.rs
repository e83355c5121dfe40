//! Domain layer: records, tree model and the mind-map builder
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod document;
pub mod entities;
pub mod error;
pub mod format;
pub mod node;
pub mod stats;

pub use builder::{Limits, MindMapBuilder};
pub use document::InputDocument;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use format::{DisplayFormat, ZhCnFormat};
pub use node::{Node, TreeNodeConvert};
pub use stats::{AssetMovementStats, Distribution, TimeRange, TransactionStats};

//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{BatchService, MindMapService};
use crate::config::Settings;
use crate::domain::DisplayFormat;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Single-document conversion
    pub mindmap: Arc<MindMapService>,

    /// Directory conversion
    pub batch: BatchService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> InfraResult<Self> {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> InfraResult<Self> {
        let format: Arc<dyn DisplayFormat> = Arc::new(settings.display_format()?);
        let mindmap = Arc::new(MindMapService::new(
            Arc::clone(&fs),
            format,
            settings.limits,
        ));
        let batch = BatchService::new(Arc::clone(&mindmap));

        Ok(Self {
            settings: Arc::new(settings),
            fs,
            mindmap,
            batch,
        })
    }
}

// Application layer - Use case interactors

pub mod batch_interactor;
pub mod cleanup_interactor;
pub mod container;
pub mod convert_interactor;
pub mod output_resolver;
pub mod scan_interactor;

// Re-export interactors
pub use batch_interactor::BatchCoordinator;
pub use cleanup_interactor::CleanupReconciler;
pub use convert_interactor::ConversionEngine;
pub use output_resolver::{OutputArbiter, OutputResolver};
pub use scan_interactor::{ClipScanner, ScanFilter};

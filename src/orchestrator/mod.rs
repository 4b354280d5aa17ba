pub mod export;
pub mod import;

pub use export::{export, ExportOutput, ExportRequest};
pub use import::{import, ImportOutcome, ImportRequest};

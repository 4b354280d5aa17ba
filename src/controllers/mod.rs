pub mod export;
pub mod health_check;
pub mod import;
pub mod version;

mod export_import;
mod health_check;
mod support;

pub mod analyzers;
pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod output;
pub mod records;

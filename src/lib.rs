pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod fetcher;
pub mod format;
pub mod history;
pub mod logging;
pub mod model;
pub mod output;
pub mod pagination;
pub mod search;
pub mod shap;

#[cfg(test)]
mod tests;

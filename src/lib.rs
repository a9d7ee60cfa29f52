pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod curation;
pub mod errors;
pub mod remote;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub mod app;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod model;
pub mod output;
pub mod prompt;
pub mod utils;

#[cfg(test)]
mod tests;

pub mod controller;
pub mod host;
pub mod notifier;
pub mod runner;
pub mod store;
pub mod types;

#[cfg(test)]
pub mod testing;

//! Long-term memory for ContextClaw: the bounded, case-insensitive fact store.

pub mod fact_store;

pub use fact_store::FactStore;

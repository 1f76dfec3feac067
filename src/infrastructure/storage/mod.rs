//! Storage backends that live outside the database

pub mod memory;

pub use memory::{InMemoryRepositoryProvider, InMemoryUnitOfWork};

//! Infrastructure layer: account directory backends.

pub mod directory;

pub use directory::{InMemoryAccountDirectory, PostgresAccountDirectory};

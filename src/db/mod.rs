pub mod dbcolab;
pub mod memstore;
pub mod store;

pub use dbcolab::DbColab;
pub use memstore::MemoryStore;
pub use store::{DocumentStore, SaveOutcome, StoreError};

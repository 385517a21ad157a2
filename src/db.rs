pub mod store;
pub use store::FabricationStore;
pub mod fabrication_repo;
pub use fabrication_repo::PgFabricationStore;
pub mod memory_store;
pub use memory_store::MemoryStore;

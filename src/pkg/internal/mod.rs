pub mod adaptors;
pub mod directory;
pub mod ingest;
pub mod orchestrator;
pub mod poller;
pub mod sources;
pub mod store;

pub mod archive;
pub mod enrich;
pub mod logging;
pub mod report;
pub mod settings;
pub mod stats;

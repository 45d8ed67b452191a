pub mod compound;
pub mod exporter;
pub mod query;

pub use compound::CompoundJob;
pub use exporter::ExporterJob;
pub use query::QueryJob;

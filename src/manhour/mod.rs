pub mod audit;
pub mod completeness;
pub mod config;
pub mod exclusion;
pub mod ingest;
pub mod normalize;
pub mod org_table;
pub mod paths;
pub mod pipeline;
pub mod reconcile;
pub mod sort;
pub mod table;

//! Price-table ingestion.

pub mod ingest;

pub use ingest::{parse_date, price_table_from_frame, read_price_table, IngestError, IngestedTable};

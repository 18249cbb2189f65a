pub mod aggregate;
pub mod batch;
pub mod calculator;
pub mod confirm;
pub mod ingest;
pub mod rates;
pub mod weight;

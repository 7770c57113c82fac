pub mod config;
pub mod csv_out;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod store;
pub mod table;
pub mod transform;

pub use config::Config;
pub use error::EtlError;
pub use pipeline::{run, Outcome};
pub use table::{Table, Value};

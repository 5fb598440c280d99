pub mod error;
pub mod lookup;
pub mod report;
pub mod staging;

pub use error::{IngestError, Result};
pub use lookup::load_property_lookup;
pub use report::{parse_report_date, read_report, read_report_from_reader};
pub use staging::prepare;

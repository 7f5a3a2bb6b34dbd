//! @ai:module:intent Result table assembly and output
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultTable, ResultWriter, ResultWriterTrait

pub mod csv_report;

pub use csv_report::{ResultTable, ResultWriter, ResultWriterTrait};

//! Writing fetched records out of the process.
//!
//! [`dataframe`] turns records into a polars frame and writes it as CSV;
//! [`sink`] wraps that behind the [`sink::DataSink`] trait.

pub mod dataframe;
pub mod sink;

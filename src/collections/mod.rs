//! Collection types backing the statistics engine.

pub mod frequency_table;

pub use frequency_table::FrequencyTable;

pub mod format;
pub mod output;
pub mod types;
pub mod vestel;

pub mod chemistry;
pub mod csv_import;

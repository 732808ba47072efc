pub mod csv;
pub mod hyperlinks;
pub mod xlsx;

pub mod json_io;
pub mod page_io;

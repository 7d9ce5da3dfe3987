pub mod folder_store;
pub mod memory_store;
pub mod script_io;

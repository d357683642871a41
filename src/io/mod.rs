pub mod config_io;
pub mod interchange;
pub mod lock;
pub mod saver;
pub mod store;

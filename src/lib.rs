pub mod board;
pub mod cli;
pub mod io;
pub mod logging;
pub mod model;
pub mod ops;
pub mod util;

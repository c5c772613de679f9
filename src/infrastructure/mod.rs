pub mod config;
pub mod installer;
pub mod logging;
pub mod remote;

pub use config::*;
pub use installer::*;
pub use remote::*;

pub mod capture;
pub mod cloning;
pub mod config;
pub mod speech;

pub use capture::*;
pub use cloning::*;
pub use config::*;
pub use speech::*;

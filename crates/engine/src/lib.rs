pub mod config;
pub mod context;
pub mod error;
pub mod globe;
pub mod memory;
pub mod navigation;
pub mod style;

pub use config::*;
pub use context::*;
pub use error::*;
pub use globe::*;
pub use memory::*;
pub use navigation::*;
pub use style::*;

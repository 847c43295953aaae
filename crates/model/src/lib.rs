pub mod dirty;
pub mod environment;
pub mod error;
pub mod ids;
pub mod message;
pub mod options;
pub mod store;
pub mod subscriptions;
pub mod widgets;

pub use dirty::*;
pub use environment::*;
pub use error::*;
pub use ids::*;
pub use message::*;
pub use options::*;
pub use store::*;
pub use subscriptions::*;
pub use widgets::*;

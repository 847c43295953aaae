pub mod binder;
pub mod controls;
pub mod error;
pub mod geojson;
pub mod group;
pub mod layer;
pub mod map;
pub mod registry;
pub mod view;

pub use binder::*;
pub use controls::*;
pub use error::*;
pub use geojson::*;
pub use group::*;
pub use layer::*;
pub use map::*;
pub use registry::*;
pub use view::*;

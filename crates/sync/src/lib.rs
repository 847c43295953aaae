pub mod view_list;

pub use view_list::*;

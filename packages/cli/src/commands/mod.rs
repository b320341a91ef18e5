pub mod edit;
pub mod list;

pub use edit::{edit, EditArgs};
pub use list::{list, ListArgs};

pub mod page;
pub mod patch;
pub mod user;

pub use page::*;
pub use patch::*;
pub use user::*;

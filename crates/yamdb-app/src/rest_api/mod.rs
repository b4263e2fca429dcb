pub mod category;
pub mod comment;
pub mod genre;
mod macros;
mod paging;
pub mod review;
pub mod title;

pub use paging::{Page, Paging};

mod fields;
mod lists;

pub use fields::*;
pub use lists::*;

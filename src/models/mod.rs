mod cart;
mod email;
mod order;
mod product;
mod user;

pub use cart::*;
pub use email::*;
pub use order::*;
pub use product::*;
pub use user::*;

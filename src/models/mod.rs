mod order;
mod payment_event;
mod product;
mod user;

pub use order::*;
pub use payment_event::*;
pub use product::*;
pub use user::*;

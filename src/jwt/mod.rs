mod session;

pub use session::{MIN_SECRET_LEN, SessionKeys};

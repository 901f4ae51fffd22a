pub mod password;
pub mod session;

pub use session::{SessionStore, SESSION_COOKIE};

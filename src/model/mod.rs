pub mod session;

pub use session::{JobFields, Session, SessionKind, SessionStatus};

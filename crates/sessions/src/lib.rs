pub mod store;

pub use store::{CorrelationSession, SessionStatus, SessionStore};

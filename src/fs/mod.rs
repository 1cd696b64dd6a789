pub mod atomic;
pub mod locking;

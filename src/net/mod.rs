pub mod cache;
pub mod embed;
pub mod retry;

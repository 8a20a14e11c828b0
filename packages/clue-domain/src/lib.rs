pub mod case;
pub mod event;
pub mod filter;
pub mod instant;
pub mod log_group;
pub mod query;
pub mod strategy;
pub mod trace;
pub mod window;

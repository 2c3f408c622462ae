//! # API Route Modules
//!
//! - `products` — product registration, stage transitions, history, and
//!   status changes (recall/retire).

pub mod products;

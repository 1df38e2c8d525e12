//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, money, time, errors, state machine)
//! - `booking` - Booking aggregate, lifecycle status and TTL buckets
//! - `event` - Event aggregate and seat capacity
//! - `user` - User contact details used for notifications

pub mod booking;
pub mod event;
pub mod foundation;
pub mod user;

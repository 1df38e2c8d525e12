//! Event Booker - seat booking with broker-driven expiry
//!
//! Events have a fixed number of seats. Bookings on priced events hold
//! their seats until the user confirms or the booking TTL elapses; expired
//! bookings are cancelled by a worker fed from RabbitMQ delay queues, and
//! the user is told over email and/or Telegram.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

//! User module.
//!
//! Registration lives outside this crate; bookings only read contact data.

mod contact;

pub use contact::UserContact;

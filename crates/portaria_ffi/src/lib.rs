//! Flutter-facing FFI crate for the Portaria front desk.

pub mod api;

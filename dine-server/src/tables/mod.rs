//! Dining tables: availability arbitration between sessions and reservations

pub mod occupancy;

pub use occupancy::ReservationError;

pub mod admin;
pub mod bookings;
pub mod contact;
pub mod payments;
pub mod rooms;

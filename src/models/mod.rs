pub mod booking;
pub mod contact;
pub mod payment;
pub mod room;

pub mod exchange;
pub mod home;

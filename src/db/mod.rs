pub mod consumers;
pub mod interactions;

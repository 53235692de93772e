pub mod enroll;
pub mod frames;
pub mod push;
pub mod status;

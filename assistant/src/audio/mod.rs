pub mod capture;
pub mod frames;

pub mod experiment;
pub mod files;
pub mod home;
pub mod session;

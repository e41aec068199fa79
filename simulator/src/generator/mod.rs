pub mod montage;
pub mod profile;

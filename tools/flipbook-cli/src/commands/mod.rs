pub mod export;
pub mod info;
pub mod overlay;
pub mod play;

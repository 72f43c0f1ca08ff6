pub mod geometry;
pub mod headless;
pub mod host;

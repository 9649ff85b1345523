pub mod geometry;
pub mod models;

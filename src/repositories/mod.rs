pub mod color_repository;

pub use color_repository::{ColorRepository, SqlColorRepository};

//! Shared test helpers: synthetic images and a counting loader.


pub use builders::ImageBuilder;
pub use loader::MockLoader;

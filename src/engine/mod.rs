pub mod lifecycle;
pub mod selectors;

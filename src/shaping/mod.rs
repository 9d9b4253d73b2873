pub mod shaper;
pub mod summary;
pub mod warning;

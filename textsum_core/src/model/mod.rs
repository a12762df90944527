pub mod artifacts;
pub mod t5;

pub mod accumulator;
pub mod source;

pub mod mem_store;

pub use mem_store::*;

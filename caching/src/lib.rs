// caching/src/lib.rs

pub mod caching;

pub use caching::ReadingsCache;

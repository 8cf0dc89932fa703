#![forbid(unsafe_code)]

pub mod pool;
pub mod repository;
pub mod snapshot;
pub mod sqlite;

#![forbid(unsafe_code)]

pub mod remote;
pub mod repository;
pub mod sample;
pub mod sqlite;

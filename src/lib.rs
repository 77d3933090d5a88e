#![forbid(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod download;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formats;
pub mod grab;
pub mod handoff;
pub mod identity;
pub mod logging;
pub mod manifest;
pub mod mapping;
pub mod normalize;

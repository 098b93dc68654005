//! Map sources and data loaders.
//!
//! This crate provides everything a room needs to obtain a board and its
//! tuning:
//! - Procedural boards (random terrain and open fields)
//! - Hand-authored boards (data-driven via RON)
//! - Game configuration (data-driven via TOML)
//!
//! All generators implement [`game_core::MapGenerator`] and are looked up by
//! name through a [`MapCatalog`].

pub mod generators;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use generators::{AuthoredMap, MapCatalog, RandomMap};

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, LoadResult, MapLoader};

pub mod asset_map;
pub mod catalog;
pub mod config;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod error;
pub mod header;
pub mod io;
pub mod meta;
pub mod pipeline;
pub mod selection;

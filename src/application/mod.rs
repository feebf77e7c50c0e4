pub mod aggregator;
pub mod dto;
mod glyphs;
pub mod ports;
pub mod render;
pub mod services;

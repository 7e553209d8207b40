// src/lib.rs

pub mod bsp;
pub mod compiled;
pub mod config;
pub mod document;
pub mod error;
pub mod map;
pub mod render;
pub mod utils;
pub mod viewer;

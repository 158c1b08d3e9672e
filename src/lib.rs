//! Vanguard Tactics - headless squad-scale combat resolution engine

pub mod catalog;
pub mod combat;
pub mod core;
pub mod encounter;
pub mod grapple;

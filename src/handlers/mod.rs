// handlers/mod.rs - one module per endpoint family, routed from main.rs

pub mod folders;
pub mod points;
pub mod points_rules;
pub mod upload;

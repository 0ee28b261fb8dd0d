pub mod coord;
pub mod entity;
pub mod grid;
pub mod light;
pub mod pattern;
pub mod rules;

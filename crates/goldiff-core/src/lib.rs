pub mod domain;
pub mod modules;
pub mod numerics;

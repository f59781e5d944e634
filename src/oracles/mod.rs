pub mod base;
pub mod redstone;

pub mod fill;
pub mod ids;
pub mod position;
pub mod quote;

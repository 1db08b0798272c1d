pub mod gateway;
pub mod product;
pub mod table;

pub mod car;
pub mod cars;
pub mod fields;

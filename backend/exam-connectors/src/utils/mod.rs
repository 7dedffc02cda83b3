pub mod bson;
pub mod time;

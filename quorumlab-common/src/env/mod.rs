pub mod events;
pub mod types;

pub mod cravings;
pub mod discord;
pub mod events;
pub mod stats;
pub mod status;
pub mod users;

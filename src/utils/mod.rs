pub mod config;
pub mod dates;
pub mod error;
pub mod hashing;
pub mod helpers;
pub mod pagination;
pub mod uploads;
pub mod validation;

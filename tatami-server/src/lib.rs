pub mod conditional;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fetcher;
pub mod multipart;
pub mod params;
pub mod services;
pub mod users;

#[cfg(test)]
mod testing;

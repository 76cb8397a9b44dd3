pub mod errors;
pub mod db;
pub mod enums;
pub mod validate;
pub mod role;
pub mod job_status;
pub mod payment_status;
pub mod user;
pub mod user_credentials;
pub mod client;
pub mod catalog;
pub mod job;
pub mod payment;

#[cfg(test)]
mod tests;

//! Business layer of the studio back office.
//! - CRUD services for clients, the service catalog, jobs and payments.
//! - The payment-to-job balance reconciler and its transactional wrapper.
//! - List filtering/pagination, dashboard figures and form view-models.
//!
//! Every operation takes the database connection explicitly; writes that create
//! records also take the acting user's id.

pub mod errors;
pub mod pagination;
pub mod query;
pub mod reconciler;
pub mod views;
pub mod auth;
pub mod clients;
pub mod catalog;
pub mod jobs;
pub mod payments;
pub mod dashboard;
pub mod lookups;
#[cfg(test)]
pub mod test_support;

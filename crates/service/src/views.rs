//! View-models returned to the front end: detail screens with related records
//! attached, decorated list rows and dropdown sources for the edit forms.
use models::{catalog, client, job, job_status, payment, payment_status, role};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    pub client: client::Model,
    pub jobs: Vec<job::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceDetail {
    pub service: catalog::Model,
    pub jobs: Vec<job::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub job: job::Model,
    pub client: Option<client::Model>,
    pub service: Option<catalog::Model>,
    pub payments: Vec<payment::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentDetail {
    pub payment: payment::Model,
    pub job: Option<job::Model>,
    pub client: Option<client::Model>,
}

/// A job list row with the names the table shows next to it.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    #[serde(flatten)]
    pub job: job::Model,
    pub client_name: Option<String>,
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRow {
    #[serde(flatten)]
    pub payment: payment::Model,
    pub job_title: Option<String>,
    pub client_name: Option<String>,
}

/// `{id, name}` pair for a dropdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice<Id> {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobFormOptions {
    pub clients: Vec<Choice<Uuid>>,
    pub services: Vec<Choice<Uuid>>,
    pub statuses: Vec<job_status::Model>,
}

/// A payable job as offered in the payment form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobChoice {
    pub id: Uuid,
    pub title: String,
    pub client_name: Option<String>,
    pub outstanding_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentFormOptions {
    pub jobs: Vec<JobChoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lookups {
    pub roles: Vec<role::Model>,
    pub job_statuses: Vec<job_status::Model>,
    pub payment_statuses: Vec<payment_status::Model>,
}

//! Feature modules: request/response domain types, the response schema and
//! the prompt builder for each clinical endpoint.
//!
//! Every module follows the same layout so the handlers can stay uniform: the
//! serde input type the endpoint accepts, the typed response it returns, a
//! `spec()` describing the reply shape for the registry, and a `prompt()`
//! building the completion prompt from the input plus the schema-derived
//! format instructions.

pub mod adherence;
pub mod diagnosis;
pub mod drug_interaction;
pub mod guest_booking;
pub mod health_analysis;
pub mod icd10;
pub mod imaging;
pub mod lab_interpretation;
pub mod no_show;
pub mod prescription;
pub mod readmission;
pub mod summarization;
pub mod vitals_anomaly;

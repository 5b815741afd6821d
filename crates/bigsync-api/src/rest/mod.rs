// iControl REST surface: transport client plus per-family endpoint methods.

pub mod client;
pub mod gtm;
pub mod ltm;
pub mod models;
pub mod net;
pub mod sys;

pub use client::RestClient;

/// Convert a partition-qualified object name into its REST path segment.
///
/// iControl embeds folder separators as `~` in URLs: the object
/// `/Common/foo` lives at `.../~Common~foo`.
pub fn transform_name(partition: &str, name: &str) -> String {
    format!("~{partition}~{name}")
}

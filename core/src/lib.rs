//! Fair-lending analytics over HMDA loan records and census demographics.

pub mod area_income;
pub mod codes;
pub mod config;
pub mod demographics;
pub mod demographics_report;
pub mod disparity_analyzer;
pub mod error;
pub mod geo;
pub mod hmda;
pub mod institution;
pub mod lar_query;
pub mod lender_activity;
pub mod name_generator;
pub mod peer_resolver;
pub mod report;
pub mod report_input;
pub mod rng;
pub mod snapshot;
pub mod store;
pub mod synthetic;
pub mod top_lender_ranker;
pub mod tract_corrections;
pub mod tract_volume;
pub mod types;

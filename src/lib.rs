pub mod app;
pub mod config;
pub mod dna;
pub mod domain;
pub mod enumerate;
pub mod error;
pub mod fetch;
pub mod fold;
pub mod lookup;
pub mod output;
pub mod snpedia;
pub mod store;

// Library root module for visit-counter
// This file defines the public API and module structure of the visit counter
// service: request gate, counter accessor, response builder and store client
//
// Numan Thabit 2025 Nov

pub mod config;
pub mod counter;
pub mod errors;
pub mod gate;
pub mod http;
pub mod metrics;
pub mod response;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_utils;

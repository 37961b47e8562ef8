pub mod error;
pub mod config;
pub mod model;
pub mod identity;
pub mod client;
pub mod routes;
pub mod views;
pub mod pages;
pub mod cli;

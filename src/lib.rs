//! RSCN content library
//!
//! A stale-while-revalidate gateway in front of the site's headless CMS, plus
//! the typed accessors the site's pages read through it.

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod gateway;
pub mod site;

pub use gateway::{ContentGateway, GatewayError, ServeStatus, Served};

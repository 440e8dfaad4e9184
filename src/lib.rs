//! ecs-scope: a read-only terminal dashboard for AWS ECS clusters.
//!
//! The [`cache::InventoryCache`] sits between the dashboard and an
//! [`client::InventoryClient`]; [`aws::EcsClient`] is the production client.

pub mod agent;
pub mod aggregate;
pub mod app;
pub mod aws;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod ui;

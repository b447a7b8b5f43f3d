//! Routekeeper - route discovery and role-based access control
//!
//! Scans controller manifests into a route tree, reconciles it with the
//! persisted component/resource tables, and answers allow/deny queries
//! against the role grants. All modules are public for testing purposes.

pub mod acl;
pub mod cache;
pub mod entities;
pub mod errors;
pub mod gatekeeper;
pub mod reconcile;
pub mod routes;
pub mod session;
pub mod settings;
pub mod storage;
pub mod store;
pub mod web;

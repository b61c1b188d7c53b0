//! # Leadline API Server Library
//!
//! Core functionality for the Leadline API server, a marketing CRM backend
//! managing users, campaigns, and leads.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Envelope-aware JSON body extraction
//! - `response`: Success and list response envelopes
//! - `middleware`: HTTP middleware (security headers)
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;
pub mod routes;

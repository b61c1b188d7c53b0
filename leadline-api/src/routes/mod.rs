/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, profile)
/// - `campaigns`: Campaign CRUD and per-campaign stats
/// - `leads`: Lead CRUD, aggregate stats, and CSV export

pub mod auth;
pub mod campaigns;
pub mod health;
pub mod leads;

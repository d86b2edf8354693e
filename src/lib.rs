//! Directory and recommendation backend for eldercare services.
//!
//! The centrepiece is [`services::RecommendationService`], which ranks dementia
//! daycare centres for a caregiver by travel distance from their home.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

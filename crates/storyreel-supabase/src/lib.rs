//! Supabase REST API client.
//!
//! This crate provides:
//! - GoTrue auth surface (bearer lookup, magic links, code exchange)
//! - Typed repository for the `generations` table (PostgREST)
//! - Merge-on-write metadata updates

pub mod auth;
pub mod client;
pub mod error;
pub mod generations;

pub use auth::{AuthUser, Session};
pub use client::{SupabaseClient, SupabaseConfig};
pub use error::{SupabaseError, SupabaseResult};
pub use generations::GenerationRepository;

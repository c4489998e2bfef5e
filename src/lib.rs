//! # wikishelf
//!
//! A local-first encyclopedia reading pipeline: fetch raw article markup,
//! transform it into safe, locally-addressable HTML, overlay user
//! highlights, derive a table-of-contents outline, and keep a bounded
//! offline shelf of transformed articles.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌─────────────────────────┐   ┌───────────┐
//! │ Upstream  │──▶│ Transformer              │──▶│ Highlight │
//! │ REST API  │   │ sanitize · links · media │   │ overlay   │
//! └───────────┘   └───────────┬─────────────┘   └─────┬─────┘
//!                             │                        │
//!                       ┌─────▼─────┐            ┌─────▼─────┐
//!                       │  Offline  │            │  Reader   │
//!                       │  shelf    │            │  view     │
//!                       └───────────┘            └───────────┘
//! ```
//!
//! The [`retrieve::Orchestrator`] ties it together per navigation: network
//! fetch with cache fallback, or cache-only when offline, publishing
//! `Idle → Loading → {Ready, OfflineReady, Failed}` transitions.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`normalize`] | Media URL and link-href normalization |
//! | [`sanitize`] | Denylist-driven markup stripping |
//! | [`transform`] | Full raw-HTML → renderable-fragment pass |
//! | [`toc`] | Outline building and active-heading tracking |
//! | [`highlight`] | Highlight marker overlay |
//! | [`cache`] | Bounded persistent offline store |
//! | [`client`] | Upstream REST client |
//! | [`retrieve`] | Per-navigation retrieval orchestration |

pub mod cache;
pub mod client;
pub mod config;
pub mod highlight;
pub mod models;
pub mod normalize;
pub mod retrieve;
pub mod sanitize;
pub mod toc;
pub mod transform;

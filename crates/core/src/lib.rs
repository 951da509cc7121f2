//! Fedgate core: fragment coordination for a data-federation gateway.
//!
//! A massively-parallel database engine executes a scan with N symmetric
//! worker processes ("segments"). Each segment independently asks the
//! gateway for its share of the external dataset. This crate provides the
//! coordination layer that makes those independent requests agree:
//!
//! ```text
//! ┌──────────┐   get_fragments    ┌───────────────────┐
//! │ Segment  │ ─────────────────▶ │ FragmenterService │
//! └──────────┘                    └─────────┬─────────┘
//!                                           │
//!                  ┌────────────────────────┼──────────────────────┐
//!                  ▼                        ▼                      ▼
//!           predicate pruning       fragment cache         distribution
//!           (expression)            (single-flight)        (strategies)
//!                  │                        │
//!                  └──────▶ Fragmenter ◀────┘
//!                           (connector)
//! ```
//!
//! - Fragment enumeration runs at most once per logical scan; concurrent
//!   segment requests for the same scan coalesce on the cache (`cache`).
//! - Each segment computes its own disjoint fragment subset with a pure,
//!   deterministic function over the shared list (`distribution`).
//! - Pushed-down predicates are pruned to the operators and types the
//!   connector can honor before they reach it (`expression`).
//! - In-flight reads and writes can be cancelled out-of-band (`registry`).

pub mod cache;
pub mod distribution;
pub mod expression;
pub mod model;
pub mod registry;
pub mod service;
pub mod sources;

// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content service HTTP client for the Flock distribution service.
//!
//! Implements [`flock_core::ContentService`] against the church content
//! service's REST API with degrade-to-`None` error handling.

pub mod client;

pub use client::ContentClient;

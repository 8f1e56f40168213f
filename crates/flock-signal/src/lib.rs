// SPDX-FileCopyrightText: 2026 Flock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal bridge channel for the Flock distribution service.
//!
//! Implements [`flock_core::NotificationChannel`] against the Signal bridge
//! HTTP API and provides E.164 phone normalization shared with the inbound
//! message handler.

pub mod client;
pub mod phone;

pub use client::SignalClient;
pub use phone::normalize_phone_number;

// SPDX-License-Identifier: GPL-3.0-or-later

//! Acoustic identification of downloaded audio.
//!
//! This crate provides functionality for:
//! - Decoding in-memory audio and generating Chromaprint fingerprints
//! - Looking fingerprints up on AcoustID
//! - The [`Recognizer`] seam used by the acoustic fallback pipeline

pub mod acoustid;
pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod recognizer;

pub use acoustid::{AcoustidClient, RecordingMatch};
pub use error::{FingerprintError, Result};
pub use fingerprint::Fingerprint;
pub use generator::FingerprintGenerator;
pub use recognizer::{AcoustidRecognizer, Recognizer};

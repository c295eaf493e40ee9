// SPDX-FileCopyrightText: 2026 Mesa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-once ordered timestamp pair.
//!
//! Both ticket resolution (`resolved_at`/`closed_at`) and maintenance windows
//! (`actual_start`/`actual_end`) follow the same shape: a start stamp that is
//! set once and kept, and an end stamp that requires the start, may only be
//! set once, and must come strictly after it. Timestamps are ISO-8601
//! millisecond strings, so string comparison is chronological.

use crate::error::MesaError;

/// A start/end timestamp pair with write-once, ordered semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StampPair {
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
}

impl StampPair {
    pub fn new(started_at: Option<String>, ended_at: Option<String>) -> Self {
        Self { started_at, ended_at }
    }

    /// Mark the pair started.
    ///
    /// Idempotent: a second mark keeps the first timestamp. Returns the
    /// effective start.
    pub fn mark_start(&mut self, now: &str) -> &str {
        self.started_at.get_or_insert_with(|| now.to_string())
    }

    /// Mark the pair ended.
    ///
    /// Fails with `AlreadyCompleted` if the end is already set,
    /// `StartRequiredFirst` if the start is missing, and `EndNotAfterStart`
    /// unless `now` is strictly after the start.
    pub fn mark_end(&mut self, now: &str) -> Result<(), MesaError> {
        if self.ended_at.is_some() {
            return Err(MesaError::AlreadyCompleted);
        }
        let Some(started) = self.started_at.as_deref() else {
            return Err(MesaError::StartRequiredFirst);
        };
        if now <= started {
            return Err(MesaError::EndNotAfterStart);
        }
        self.ended_at = Some(now.to_string());
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.ended_at.is_some()
    }
}

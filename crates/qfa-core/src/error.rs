// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

/// Error taxonomy for the qfa core.
///
/// Degenerate-but-total conditions (zero-length streams, zero dispersion)
/// are handled by documented clamping policies and never surface here;
/// this type covers caller-contract violations and numeric breakdowns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QfaError {
    /// The caller passed inputs that violate a documented contract.
    InvalidInput(String),
    /// A computation produced a non-finite or otherwise unusable value.
    NumericalIssue(String),
}

impl QfaError {
    /// Constructs an [`QfaError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Constructs an [`QfaError::NumericalIssue`].
    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }
}

impl fmt::Display for QfaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NumericalIssue(message) => write!(f, "numerical issue: {message}"),
        }
    }
}

impl std::error::Error for QfaError {}

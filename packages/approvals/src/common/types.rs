// Common types used across multiple domains and layers
//
// These types are shared between the kernel and domain layers to avoid
// circular dependencies while maintaining type safety.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of client a request originated from.
///
/// Response payloads, available actions and email rendering all vary by
/// device, so the device travels with every entry-point call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientDevice {
    Web,
    Mobile,
    Outlook,
    Teams,
    /// Actionable email (adaptive card rendered inside the mail client)
    ActionableEmail,
}

impl ClientDevice {
    /// True for clients with constrained payload budgets.
    pub fn is_mobile(&self) -> bool {
        matches!(self, ClientDevice::Mobile)
    }

    /// Canonical lowercase name used in stored audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientDevice::Web => "web",
            ClientDevice::Mobile => "mobile",
            ClientDevice::Outlook => "outlook",
            ClientDevice::Teams => "teams",
            ClientDevice::ActionableEmail => "actionableEmail",
        }
    }
}

impl fmt::Display for ClientDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(ClientDevice::Web),
            "mobile" => Ok(ClientDevice::Mobile),
            "outlook" => Ok(ClientDevice::Outlook),
            "teams" => Ok(ClientDevice::Teams),
            "actionableemail" => Ok(ClientDevice::ActionableEmail),
            other => Err(format!("unknown client device: {}", other)),
        }
    }
}

/// A user alias (directory account name), normalized to lowercase.
///
/// Aliases arrive from upstream controllers in mixed case; every comparison
/// in this crate goes through the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Alias {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Alias {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A tenant-scoped business document number (e.g. an invoice or PO number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentNumber(String);

impl DocumentNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentNumber {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DocumentNumber {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

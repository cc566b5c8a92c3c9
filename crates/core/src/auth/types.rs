use serde::Serialize;
use std::collections::HashMap;

/// Header view of an inbound request. Header names are lowercase.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub method: &'static str,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            method: "none",
        }
    }
}

use serde::Serialize;
use std::collections::BTreeMap;

/// Placeholder reported when no Generation node produced a response.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated";

/// Named slots of the shared execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Query,
    Context,
    Response,
}

/// Intermediate results threaded through one workflow run.
///
/// Each slot holds the latest value written by a successful node of the
/// matching kind. Values are only ever added or replaced, never removed.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionContext {
    user_query: String,
    slots: BTreeMap<Slot, String>,
}

impl ExecutionContext {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            slots: BTreeMap::new(),
        }
    }

    /// The query supplied by the caller for this run.
    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    pub fn set(&mut self, slot: Slot, value: impl Into<String>) {
        self.slots.insert(slot, value.into());
    }

    /// The `query` slot, falling back to the caller's query.
    pub fn query(&self) -> &str {
        self.get(Slot::Query).unwrap_or(&self.user_query)
    }

    /// The `context` slot, empty if nothing was retrieved.
    pub fn context(&self) -> &str {
        self.get(Slot::Context).unwrap_or("")
    }

    pub fn response(&self) -> Option<&str> {
        self.get(Slot::Response)
    }

    /// The response, or the placeholder if none was written.
    pub fn final_response(&self) -> &str {
        self.response().unwrap_or(NO_RESPONSE_PLACEHOLDER)
    }
}

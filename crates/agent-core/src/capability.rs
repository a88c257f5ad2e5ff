//! Capability System
//!
//! Pluggable actions the agent can take. Capabilities are registered at startup
//! and dispatched by name from the reasoning loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;

/// Name of the action that ends a run
pub const FINISH: &str = "finish";

/// Name and usage text shown to the model
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Lowercase action name
    pub name: String,

    /// Human-readable usage description
    pub usage: String,
}

impl std::fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.usage)
    }
}

/// Outcome of one capability invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Observation {
    /// Capability that was invoked
    pub capability: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (observation text or failure reason)
    pub output: String,
}

impl Observation {
    pub fn success(capability: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(capability: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            success: false,
            output: reason.into(),
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.success {
            f.write_str(&self.output)
        } else {
            write!(f, "Error: {}", self.output)
        }
    }
}

/// Capability trait - implement to add new actions
#[async_trait]
pub trait Capability: Send + Sync {
    /// Action name the model uses to select this capability
    fn name(&self) -> &str;

    /// Usage description included in every prompt
    fn usage(&self) -> &str;

    /// Perform the action and return the observation text
    async fn execute(&self, input: &str) -> Result<String>;
}

/// Registry for available capabilities
///
/// Names are lowercased once here; lookups compare against the stored form.
/// Registration order is kept so prompts list capabilities stably.
#[derive(Default)]
pub struct CapabilityRegistry {
    entries: Vec<(CapabilityDescriptor, Arc<dyn Capability>)>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new capability
    pub fn register<C: Capability + 'static>(&mut self, capability: C) {
        self.register_arc(Arc::new(capability));
    }

    /// Register a shared capability, replacing any existing one with the same name
    pub fn register_arc(&mut self, capability: Arc<dyn Capability>) {
        let descriptor = CapabilityDescriptor {
            name: capability.name().to_lowercase(),
            usage: capability.usage().trim().to_string(),
        };

        if let Some(slot) = self.entries.iter_mut().find(|(d, _)| d.name == descriptor.name) {
            tracing::warn!(capability = %descriptor.name, "Replacing registered capability");
            *slot = (descriptor, capability);
        } else {
            self.entries.push((descriptor, capability));
        }
    }

    /// Get a capability by its lowercase name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries
            .iter()
            .find(|(d, _)| d.name == name)
            .map(|(_, c)| Arc::clone(c))
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &CapabilityDescriptor> {
        self.entries.iter().map(|(d, _)| d)
    }

    /// Capability names
    pub fn names(&self) -> Vec<&str> {
        self.descriptors().map(|d| d.name.as_str()).collect()
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `name: usage` line per capability, for the prompt
    pub fn describe(&self) -> String {
        self.descriptors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// Built-in Capabilities
// ============================================================================

/// Finish capability - hands the final answer back unchanged
pub struct Finish;

#[async_trait]
impl Capability for Finish {
    fn name(&self) -> &str {
        FINISH
    }

    fn usage(&self) -> &str {
        "Returns the final answer provided to it. The input is the final answer itself. \
         Your final answer should always be either yes, no, before, after or a named entity. \
         **DO NOT ANSWER IN SENTENCE**"
    }

    async fn execute(&self, input: &str) -> Result<String> {
        Ok(input.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo {
        name: &'static str,
    }

    #[async_trait]
    impl Capability for Echo {
        fn name(&self) -> &str {
            self.name
        }

        fn usage(&self) -> &str {
            "  Repeats the input.\n"
        }

        async fn execute(&self, input: &str) -> Result<String> {
            Ok(format!("echo: {input}"))
        }
    }

    #[test]
    fn test_registry_lowercases_names() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Echo { name: "Retrieve" });

        assert!(registry.get("retrieve").is_some());
        assert!(registry.get("Retrieve").is_none());
        assert_eq!(registry.names(), vec!["retrieve"]);
    }

    #[test]
    fn test_describe_keeps_registration_order() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Echo { name: "retrieve" });
        registry.register(Finish);
        registry.register(Echo { name: "AskHuman" });

        let described = registry.describe();
        let lines: Vec<_> = described.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "retrieve: Repeats the input.");
        assert!(lines[1].starts_with("finish: Returns the final answer"));
        assert!(lines[2].starts_with("askhuman: "));
    }

    #[test]
    fn test_duplicate_name_replaces() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Echo { name: "echo" });
        registry.register(Echo { name: "ECHO" });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_capability_is_absent() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Finish);
        assert!(registry.get("search").is_none());
    }

    #[tokio::test]
    async fn test_finish_is_passthrough() {
        let mut registry = CapabilityRegistry::new();
        registry.register(Finish);
        let finish = registry.get(FINISH).unwrap();
        let out = finish.execute("European Commission").await.unwrap();
        assert_eq!(out, "European Commission");
    }

    #[test]
    fn test_observation_display() {
        assert_eq!(Observation::success("retrieve", "passage").to_string(), "passage");
        assert_eq!(
            Observation::failure("retrieve", "index offline").to_string(),
            "Error: index offline"
        );
    }
}

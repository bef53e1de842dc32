//! Tool lifecycle registry.
//!
//! Maps tool names to their [`ToolLifecycleDescriptor`]. The registry is an
//! explicitly constructed, injected value - tests supply their own isolated
//! instances and nothing lives in process-global state.

use std::collections::HashMap;

use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::descriptor::ToolLifecycleDescriptor;

/// Errors raised while loading a lifecycle registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry document was not valid JSON or did not match the schema.
    #[error("Failed to parse lifecycle registry: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk registry document.
///
/// ```json
/// {
///   "version": "1.2",
///   "defaults": { "lifecycle": "static", "static_ttl_s": 86400, "jitter_pct": 10 },
///   "tools": [
///     { "name": "stock_price", "lifecycle": "realtime",
///       "trading_hours_ttl_s": 300, "after_hours_mode": "dynamic_until_open",
///       "jitter_pct": 10 }
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct RegistryFile {
    version: String,
    #[serde(default)]
    defaults: Option<ToolLifecycleDescriptor>,
    tools: Vec<ToolEntry>,
}

#[derive(Debug, Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(flatten)]
    descriptor: ToolLifecycleDescriptor,
}

/// Registry of per-tool lifecycle descriptors.
pub struct LifecycleRegistry {
    tools: HashMap<String, ToolLifecycleDescriptor>,
    default: ToolLifecycleDescriptor,
}

impl LifecycleRegistry {
    /// Create a registry from an already-loaded descriptor map.
    ///
    /// Unknown tools fall back to [`ToolLifecycleDescriptor::default`].
    pub fn new(tools: HashMap<String, ToolLifecycleDescriptor>) -> Self {
        Self::with_default(tools, ToolLifecycleDescriptor::default())
    }

    /// Create a registry with a custom fallback descriptor.
    pub fn with_default(
        tools: HashMap<String, ToolLifecycleDescriptor>,
        default: ToolLifecycleDescriptor,
    ) -> Self {
        Self { tools, default }
    }

    /// Load a registry from its JSON document.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(json)?;

        let tools: HashMap<String, ToolLifecycleDescriptor> = file
            .tools
            .into_iter()
            .map(|entry| (entry.name, entry.descriptor))
            .collect();

        info!(
            "Loaded lifecycle registry v{} with {} tools",
            file.version,
            tools.len()
        );

        Ok(Self::with_default(
            tools,
            file.defaults.unwrap_or_default(),
        ))
    }

    /// Get the descriptor for a tool, or the registry default when the
    /// tool is unknown.
    pub fn get_descriptor(&self, tool_name: &str) -> &ToolLifecycleDescriptor {
        self.tools.get(tool_name).unwrap_or(&self.default)
    }

    /// The fallback descriptor used for unknown tools.
    pub fn default_descriptor(&self) -> &ToolLifecycleDescriptor {
        &self.default
    }

    /// Number of explicitly registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no explicit tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

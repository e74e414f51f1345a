//! Event registry
//!
//! Declarative mapping from an event id (or alias) to everything needed to
//! scan for it: the ABI signature, a filter builder, and a field projection.
//! Populated by callers; see [`crate::events`] for the built-in catalogue.

use crate::error::{ConflictError, NotFoundError, Result};
use crate::scanner::Record;
use alloy::rpc::types::{Filter, Log};
use std::collections::HashMap;

/// Indexed-parameter filter values, one bag shared by all event types.
/// Each filter builder reads only the fields its event defines options for.
#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
    pub airnode: Option<String>,
    pub request: Option<String>,
    pub sponsor: Option<String>,
    pub requester: Option<String>,
    pub dapi_name: Option<String>,
    pub sender: Option<String>,
    pub beacon: Option<String>,
}

/// Everything the scanner needs to know about one event type.
///
/// `build_filter` produces a filter with the event signature and any
/// indexed-topic constraints, but without an address or block range; those
/// are attached by the session and scanner respectively. `project` maps a
/// raw log into the flat output record for this event.
#[derive(Clone)]
pub struct EventDefinition {
    /// Primary id, used as the subcommand name
    pub id: &'static str,
    /// Alternate lookup names
    pub aliases: &'static [&'static str],
    /// Solidity event name, for user-facing messages
    pub event_type: &'static str,
    /// Key into a network's `contracts` map
    pub contract: &'static str,
    /// Human-readable ABI signature
    pub abi: &'static str,
    pub build_filter: fn(&QueryArgs) -> Result<Filter>,
    pub project: fn(&Log) -> Result<Record>,
}

impl std::fmt::Debug for EventDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDefinition")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("contract", &self.contract)
            .finish()
    }
}

/// Registry of event definitions with unique ids and aliases.
#[derive(Default)]
pub struct EventRegistry {
    defs: Vec<EventDefinition>,
    index: HashMap<String, usize>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: EventDefinition) -> Result<()> {
        let slot = self.defs.len();
        for key in std::iter::once(def.id).chain(def.aliases.iter().copied()) {
            if self.index.contains_key(key) {
                return Err(ConflictError::DuplicateEvent(key.to_string()).into());
            }
            self.index.insert(key.to_string(), slot);
        }
        self.defs.push(def);
        Ok(())
    }

    pub fn resolve(&self, name_or_alias: &str) -> Result<&EventDefinition> {
        self.index
            .get(name_or_alias)
            .map(|&i| &self.defs[i])
            .ok_or_else(|| NotFoundError::Event(name_or_alias.to_string()).into())
    }

    pub fn list_all(&self) -> &[EventDefinition] {
        &self.defs
    }
}

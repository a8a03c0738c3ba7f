//! State schema and field reducers
//!
//! A workflow run carries a single structured record: a JSON object whose
//! fields are declared ahead of time in a [`StateSchema`]. Nodes never mutate
//! the record directly; they return partial updates that the engine merges
//! through the schema. Each field owns a [`Reducer`] deciding how an incoming
//! value combines with the existing one.
//!
//! Two reducers cover the common cases:
//!
//! - [`OverwriteReducer`] - the default; the incoming value replaces the
//!   existing one.
//! - [`AppendReducer`] - concatenates sequences, so several nodes can
//!   accumulate into one list field.
//!
//! Merging never touches the previous state value: [`StateSchema::merge`]
//! returns a fresh state, which keeps earlier snapshots safe to read while a
//! run is in flight.
//!
//! # Examples
//!
//! ```rust
//! use stategraph_core::state::{StateSchema, AppendReducer, OverwriteReducer};
//! use serde_json::json;
//!
//! let mut schema = StateSchema::new();
//! schema.add_field("job_description", Box::new(OverwriteReducer)).unwrap();
//! schema.add_field("actions", Box::new(AppendReducer)).unwrap();
//!
//! let state = json!({"job_description": "jd", "actions": ["a"]});
//! let next = schema.merge(&state, &json!({"actions": ["b", "c"]})).unwrap();
//!
//! assert_eq!(next["actions"], json!(["a", "b", "c"]));
//! assert_eq!(state["actions"], json!(["a"]));  // old snapshot untouched
//! ```

use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by state declaration and merging
#[derive(Debug, Error)]
pub enum StateError {
    /// A partial update referenced a field that was never declared
    ///
    /// Fatal to the run; unknown fields are rejected at merge time rather
    /// than silently inserted.
    #[error("unknown state field '{0}': field is not declared in the schema")]
    UnknownField(String),

    /// The same field was registered with a reducer twice
    ///
    /// Configuration-time only; fatal at graph construction.
    #[error("duplicate reducer registration for field '{0}'")]
    DuplicateReducer(String),

    /// State or update was not a JSON object
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A reducer received values it cannot combine
    #[error("reducer error: {0}")]
    ReducerError(String),
}

pub type Result<T> = std::result::Result<T, StateError>;

/// Merge function combining an existing field value with an incoming update
///
/// `current` is `Value::Null` when the field has no value yet. Reducers must
/// be pure; the engine applies them in a deterministic order but does not
/// itself guarantee order-independence - that contract belongs to the
/// reducer author.
pub trait Reducer: Send + Sync {
    /// Combine the current value with an incoming one
    fn reduce(&self, current: &Value, incoming: &Value) -> Result<Value>;

    /// Human-readable name, used in logs and `Debug` output
    fn name(&self) -> &str;
}

/// Default reducer: the incoming value replaces the current one
#[derive(Debug, Clone)]
pub struct OverwriteReducer;

impl Reducer for OverwriteReducer {
    fn reduce(&self, _current: &Value, incoming: &Value) -> Result<Value> {
        Ok(incoming.clone())
    }

    fn name(&self) -> &str {
        "overwrite"
    }
}

/// Append reducer: concatenates the incoming sequence onto the current one
///
/// A scalar incoming value is promoted to a one-element append, so a node may
/// emit either `"action1"` or `["action1"]` for the same field. A `Null`
/// current value starts an empty sequence.
#[derive(Debug, Clone)]
pub struct AppendReducer;

impl Reducer for AppendReducer {
    fn reduce(&self, current: &Value, incoming: &Value) -> Result<Value> {
        let mut items = match current {
            Value::Null => Vec::new(),
            Value::Array(existing) => existing.clone(),
            other => {
                return Err(StateError::ReducerError(format!(
                    "append reducer expects the current value to be a sequence, got {other}"
                )))
            }
        };

        match incoming {
            Value::Null => {}
            Value::Array(new_items) => items.extend(new_items.iter().cloned()),
            scalar => items.push(scalar.clone()),
        }

        Ok(Value::Array(items))
    }

    fn name(&self) -> &str {
        "append"
    }
}

/// Declared state fields and their reducers
///
/// The schema doubles as the reducer registry: declaring a field registers
/// its merge function, and a field may be registered at most once. Fields
/// absent from a partial update are left untouched - their reducer is never
/// invoked.
#[derive(Default)]
pub struct StateSchema {
    fields: HashMap<String, Box<dyn Reducer>>,
}

impl std::fmt::Debug for StateSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(name, reducer)| (name.as_str(), reducer.name()))
            .collect();
        fields.sort_unstable();
        f.debug_struct("StateSchema").field("fields", &fields).finish()
    }
}

impl StateSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with its reducer
    ///
    /// # Errors
    ///
    /// Returns [`StateError::DuplicateReducer`] if the field was already
    /// declared.
    pub fn add_field(&mut self, name: impl Into<String>, reducer: Box<dyn Reducer>) -> Result<()> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(StateError::DuplicateReducer(name));
        }
        self.fields.insert(name, reducer);
        Ok(())
    }

    /// Whether a field is declared
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Names of all declared fields, sorted
    pub fn fields(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Resolve the reducer for a declared field
    fn reducer(&self, name: &str) -> Result<&dyn Reducer> {
        self.fields
            .get(name)
            .map(|r| r.as_ref())
            .ok_or_else(|| StateError::UnknownField(name.to_string()))
    }

    /// Merge a partial update into a state, returning the new state
    ///
    /// For every key in `update`, the field's reducer combines the existing
    /// value (or `Null`) with the incoming one. Keys missing from `update`
    /// are untouched. `current` itself is never mutated.
    ///
    /// # Errors
    ///
    /// - [`StateError::UnknownField`] if `update` mentions an undeclared field
    /// - [`StateError::InvalidState`] if either value is not a JSON object
    /// - [`StateError::ReducerError`] if a reducer rejects its inputs
    pub fn merge(&self, current: &Value, update: &Value) -> Result<Value> {
        let current_obj = current
            .as_object()
            .ok_or_else(|| StateError::InvalidState("state must be a JSON object".to_string()))?;
        let update_obj = update
            .as_object()
            .ok_or_else(|| StateError::InvalidState("update must be a JSON object".to_string()))?;

        let mut next: Map<String, Value> = current_obj.clone();
        for (field, incoming) in update_obj {
            let reducer = self.reducer(field)?;
            let existing = current_obj.get(field).unwrap_or(&Value::Null);
            next.insert(field.clone(), reducer.reduce(existing, incoming)?);
        }

        Ok(Value::Object(next))
    }

    /// Build the initial state for a run from caller-supplied values
    ///
    /// Equivalent to merging the input into an empty state, so undeclared
    /// fields in the input are rejected up front and append fields start
    /// from an empty sequence.
    pub fn initial(&self, input: &Value) -> Result<Value> {
        self.merge(&Value::Object(Map::new()), input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_schema() -> StateSchema {
        let mut schema = StateSchema::new();
        schema.add_field("job_description", Box::new(OverwriteReducer)).unwrap();
        schema.add_field("is_suitable", Box::new(OverwriteReducer)).unwrap();
        schema.add_field("application", Box::new(OverwriteReducer)).unwrap();
        schema.add_field("actions", Box::new(AppendReducer)).unwrap();
        schema
    }

    #[test]
    fn overwrite_replaces_and_leaves_other_fields() {
        let schema = job_schema();
        let state = json!({"job_description": "jd", "is_suitable": false});

        let next = schema.merge(&state, &json!({"is_suitable": true})).unwrap();

        assert_eq!(next["is_suitable"], json!(true));
        assert_eq!(next["job_description"], json!("jd"));
    }

    #[test]
    fn append_preserves_order() {
        let schema = job_schema();
        let state = schema.initial(&json!({})).unwrap();

        let state = schema.merge(&state, &json!({"actions": ["a"]})).unwrap();
        let state = schema.merge(&state, &json!({"actions": ["b", "c"]})).unwrap();

        assert_eq!(state["actions"], json!(["a", "b", "c"]));
    }

    #[test]
    fn append_promotes_scalar() {
        let schema = job_schema();
        let state = schema.initial(&json!({"actions": ["a"]})).unwrap();

        let state = schema.merge(&state, &json!({"actions": "b"})).unwrap();

        assert_eq!(state["actions"], json!(["a", "b"]));
    }

    #[test]
    fn unknown_field_rejected_regardless_of_value() {
        let schema = job_schema();
        let state = schema.initial(&json!({})).unwrap();

        for value in [json!(1), json!("x"), json!(null), json!([1, 2])] {
            let err = schema.merge(&state, &json!({"mystery": value})).unwrap_err();
            assert!(matches!(err, StateError::UnknownField(f) if f == "mystery"));
        }
    }

    #[test]
    fn duplicate_field_registration_fails() {
        let mut schema = StateSchema::new();
        schema.add_field("actions", Box::new(AppendReducer)).unwrap();

        let err = schema.add_field("actions", Box::new(OverwriteReducer)).unwrap_err();
        assert!(matches!(err, StateError::DuplicateReducer(f) if f == "actions"));
    }

    #[test]
    fn merge_does_not_mutate_previous_snapshot() {
        let schema = job_schema();
        let before = json!({"actions": ["a"]});

        let after = schema.merge(&before, &json!({"actions": ["b"]})).unwrap();

        assert_eq!(before["actions"], json!(["a"]));
        assert_eq!(after["actions"], json!(["a", "b"]));
    }

    #[test]
    fn absent_field_never_invokes_reducer() {
        struct PanickyReducer;
        impl Reducer for PanickyReducer {
            fn reduce(&self, _: &Value, _: &Value) -> Result<Value> {
                panic!("reducer invoked for a field absent from the update");
            }
            fn name(&self) -> &str {
                "panicky"
            }
        }

        let mut schema = StateSchema::new();
        schema.add_field("untouched", Box::new(PanickyReducer)).unwrap();
        schema.add_field("other", Box::new(OverwriteReducer)).unwrap();

        let state = json!({"untouched": 1});
        let next = schema.merge(&state, &json!({"other": 2})).unwrap();
        assert_eq!(next["untouched"], json!(1));
    }

    #[test]
    fn non_object_state_rejected() {
        let schema = job_schema();
        assert!(matches!(
            schema.merge(&json!([1]), &json!({})),
            Err(StateError::InvalidState(_))
        ));
        assert!(matches!(
            schema.merge(&json!({}), &json!("update")),
            Err(StateError::InvalidState(_))
        ));
    }
}

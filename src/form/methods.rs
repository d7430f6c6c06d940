use std::collections::VecDeque;

use serde_json::Value;

use crate::error::FormError;
use crate::form::advanced::{AdvanceState, Breakpoints};
use crate::form::component::{ComponentType, component_rule_type, create_placeholder_message, handle_input_number_value};
use crate::form::date::parse_date;
use crate::form::props::{SchemaFormProps, ValidateTrigger};
use crate::form::schema::{FormSchema, PropsMap, SchemaPatch};
use crate::form::state::{ComponentHandle, FormState};
use crate::form::validation::{FieldRules, FormValidator, Rule, RuleValidator};
use crate::form::value::{FormModel, FormValue};

/// Viewport width assumed until the host reports one.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 1920;

/// Notifications a form emits for its host.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    Reset(FormModel),
    Submit(FormModel),
    AdvancedChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    ClearValidate,
}

/// A schema-driven form instance: state plus the operations on it.
///
/// The instance is "mounted" once a validator is bound; until then reads
/// through `get_fields_value` return an empty model and submission is a no-op.
pub struct SchemaForm {
    pub(crate) state: FormState,
    pub(crate) validator: Option<Box<dyn FormValidator>>,
    pub(crate) viewport_width: u32,
    pub(crate) breakpoints: Breakpoints,
    pub(crate) events: Vec<FormEvent>,
    deferred: VecDeque<Deferred>,
}

impl std::fmt::Debug for SchemaForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaForm")
            .field("state", &self.state)
            .field("mounted", &self.is_mounted())
            .field("viewport_width", &self.viewport_width)
            .finish()
    }
}

impl SchemaForm {
    /// An unmounted form.
    pub fn new(props: SchemaFormProps) -> Self {
        let mut form = SchemaForm {
            state: FormState::new(props),
            validator: None,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            breakpoints: Breakpoints::default(),
            events: Vec::new(),
            deferred: VecDeque::new(),
        };
        form.update_advanced();
        form
    }

    /// A form mounted with the built-in `RuleValidator`.
    pub fn mounted(props: SchemaFormProps) -> Self {
        let mut form = SchemaForm::new(props);
        form.bind(Box::new(RuleValidator::new()));
        form
    }

    pub fn bind(&mut self, validator: Box<dyn FormValidator>) {
        self.validator = Some(validator);
    }

    pub fn is_mounted(&self) -> bool {
        self.validator.is_some()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn props(&self) -> &SchemaFormProps {
        &self.state.props
    }

    pub fn schemas(&self) -> &[FormSchema] {
        &self.state.props.schemas
    }

    pub fn form_model(&self) -> &FormModel {
        &self.state.form_model
    }

    pub fn cache_form_model(&self) -> &FormModel {
        &self.state.cache_form_model
    }

    pub fn default_form_values(&self) -> &FormModel {
        &self.state.default_form_values
    }

    pub fn drain_events(&mut self) -> Vec<FormEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Component handles
    // ------------------------------------------------------------------

    pub fn set_item_ref(&mut self, field: &str, handle: ComponentHandle) {
        self.state.comp_refs.insert(field.to_string(), handle);
    }

    pub fn item_ref(&self, field: &str) -> Option<&ComponentHandle> {
        self.state.comp_refs.get(field)
    }

    // ------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------

    /// Current values run through the shaping pipeline.
    pub fn get_fields_value(&self) -> FormModel {
        if !self.is_mounted() {
            return FormModel::new();
        }
        self.handle_form_values(&self.state.form_model)
    }

    /// Write values for fields present in the schema. Every value is also
    /// mirrored into the cache, schema or not. Validation of the written keys
    /// runs afterwards and its outcome does not affect the assignment.
    pub fn set_fields_value(&mut self, values: FormModel) {
        for (key, value) in &values {
            self.state.cache_form_model.insert(key.clone(), value.clone());
        }

        let mut valid_keys = Vec::new();
        for (key, value) in values {
            if let Some(coerced) = self.coerce_for_field(&key, value) {
                self.state.form_model.insert(key.clone(), coerced);
                valid_keys.push(key);
            }
        }

        if let Err(e) = self.validate_fields(Some(&valid_keys)) {
            tracing::debug!("validation after set_fields_value: {}", e);
        }
    }

    /// Shape `value` for `key`'s component. `None` when no schema entry owns `key`.
    fn coerce_for_field(&self, key: &str, value: FormValue) -> Option<FormValue> {
        let schema = self
            .state
            .props
            .schemas
            .iter()
            .find(|s| s.has_field() && s.field == key)?;
        let value = handle_input_number_value(schema.component, value);

        if !schema.component.is_date_item() {
            return Some(value);
        }

        let coerced = match value {
            FormValue::List(items) => FormValue::List(
                items
                    .into_iter()
                    .map(|item| match parse_date(&item) {
                        Some(d) if item.is_truthy() => FormValue::Date(d),
                        _ => FormValue::Null,
                    })
                    .collect(),
            ),
            v if !v.is_truthy() => FormValue::Null,
            v if self.has_value_format(schema) => v,
            v => to_date_or_raw(key, v),
        };
        Some(coerced)
    }

    pub fn item_is_date_type(&self, key: &str) -> bool {
        self.state
            .props
            .schemas
            .iter()
            .any(|s| s.field == key && s.component.is_date_item())
    }

    fn has_value_format(&self, schema: &FormSchema) -> bool {
        self.resolve_props(schema)
            .get("valueFormat")
            .is_some_and(|v| !v.is_null() && v.as_str() != Some(""))
    }

    fn resolve_props(&self, schema: &FormSchema) -> PropsMap {
        self.state.with_context(schema, |ctx| schema.resolve_props(ctx))
    }

    /// Effective component props for a field. A placeholder is derived from
    /// the component and label unless one is set, the field is disabled, or
    /// it is a range picker.
    pub fn component_props(&self, field: &str) -> Option<PropsMap> {
        let schema = self.get_schema_by_field(field)?;
        let mut props = self.resolve_props(schema);

        let disabled = props.get("disabled").and_then(Value::as_bool).unwrap_or(false);
        if !disabled && schema.component != ComponentType::RangePicker && !props.contains_key("placeholder") {
            let message = create_placeholder_message(schema.component, &schema.label);
            if !message.is_empty() {
                props.insert("placeholder".to_string(), Value::String(message));
            }
        }
        Some(props)
    }

    /// Set one value (model and cache) and validate it when the trigger is `change`.
    pub fn set_form_model(&mut self, key: &str, value: FormValue) {
        self.state.form_model.insert(key.to_string(), value.clone());
        self.state.cache_form_model.insert(key.to_string(), value);

        let trigger = self.state.props.validate_trigger;
        if matches!(trigger, None | Some(ValidateTrigger::Change)) {
            if let Err(e) = self.validate_fields(Some(&[key.to_string()])) {
                tracing::debug!("validation after set_form_model: {}", e);
            }
        }
    }

    pub fn del_form_model(&mut self, key: &str) -> Option<FormValue> {
        self.state.form_model.remove(key)
    }

    // ------------------------------------------------------------------
    // Schema
    // ------------------------------------------------------------------

    pub fn get_schema_by_field(&self, field: &str) -> Option<&FormSchema> {
        self.state.props.schemas.iter().find(|s| s.field == field)
    }

    /// Replace the whole schema list.
    pub fn reset_schema(&mut self, schemas: Vec<FormSchema>) {
        self.state.props.schemas = schemas;
        self.after_schema_change();
    }

    /// Insert at the head when `first`, after `prefix_field` when it exists,
    /// otherwise at the tail.
    pub fn append_schema_by_field(&mut self, item: FormSchema, prefix_field: Option<&str>, first: bool) {
        let schemas = &mut self.state.props.schemas;
        let index = prefix_field.and_then(|p| schemas.iter().position(|s| s.field == p));

        match (first, index) {
            (true, _) => schemas.insert(0, item.clone()),
            (false, Some(i)) => schemas.insert(i + 1, item.clone()),
            (false, None) => schemas.push(item.clone()),
        }

        self.after_schema_change();
        self.set_default_value(&[item]);
    }

    /// Remove entries and their current values. Cached values are kept.
    pub fn remove_schema_by_field(&mut self, fields: &[&str]) {
        for field in fields {
            let schemas = &mut self.state.props.schemas;
            if let Some(index) = schemas.iter().position(|s| s.field == *field) {
                self.state.form_model.remove(*field);
                schemas.remove(index);
            }
        }
        self.after_schema_change();
    }

    /// Deep-merge patches into matching entries by field.
    ///
    /// Every patch must name a field unless it is a divider; otherwise
    /// nothing changes. When several patches target the same field the last
    /// one wins. Field uniqueness is restored afterwards, keeping the first
    /// occurrence's position.
    pub fn update_schema(&mut self, patches: Vec<SchemaPatch>) -> Result<(), FormError> {
        if let Some(index) = patches
            .iter()
            .position(|p| !p.is_divider() && p.field_key().is_empty())
        {
            tracing::error!(
                "all schema entries to update must carry a `field` (entry #{} does not)",
                index
            );
            return Err(FormError::MissingField { index });
        }

        let mut schemas = Vec::with_capacity(self.state.props.schemas.len());
        let mut updated = Vec::new();
        for current in &self.state.props.schemas {
            match patches.iter().rev().find(|p| p.field_key() == current.field) {
                Some(patch) => {
                    let merged = patch.apply_to(current);
                    updated.push(merged.clone());
                    schemas.push(merged);
                }
                None => schemas.push(current.clone()),
            }
        }

        self.state.props.schemas = dedupe_by_field(schemas);
        self.after_schema_change();
        self.set_default_value(&updated);
        Ok(())
    }

    /// Apply declared defaults for fields that currently hold no value.
    pub fn set_default_value(&mut self, schemas: &[FormSchema]) {
        let current = self.get_fields_value();
        let mut defaults = FormModel::new();

        for item in schemas {
            if item.component.is_divider() || !item.has_field() {
                continue;
            }
            let Some(value) = item.default_value.as_ref().filter(|v| !v.is_null()) else {
                continue;
            };
            if current.get(&item.field).is_none_or(FormValue::is_null) {
                defaults.insert(item.field.clone(), value.clone());
            }
        }

        if !defaults.is_empty() {
            self.set_fields_value(defaults);
        }
    }

    /// Merge a new configuration over the current one. Scalar settings
    /// come from `props`; hooks, range mappings and the action column it
    /// leaves unset are kept, initial values merge key by key, and the
    /// current schemas stay unless there are none.
    pub fn set_schema_form_props(&mut self, props: SchemaFormProps) {
        let current = &mut self.state.props;
        let mut next = props;

        if !current.schemas.is_empty() {
            next.schemas = std::mem::take(&mut current.schemas);
        }
        if next.field_map_to_time.is_empty() {
            next.field_map_to_time = std::mem::take(&mut current.field_map_to_time);
        }
        let mut initial = std::mem::take(&mut current.initial_values);
        initial.append(&mut next.initial_values);
        next.initial_values = initial;

        next.action_col_options = next.action_col_options.or(current.action_col_options.take());
        next.validate_trigger = next.validate_trigger.or(current.validate_trigger);
        next.transform_date_func = next.transform_date_func.or(current.transform_date_func.take());
        next.submit_func = next.submit_func.or(current.submit_func.take());
        next.reset_func = next.reset_func.or(current.reset_func.take());

        self.state.props = next;
        self.after_schema_change();
    }

    fn after_schema_change(&mut self) {
        self.state.track_schemas();
        self.restore_cached_values();
        self.update_advanced();
    }

    /// Fields that (re)appear without a current value get their last known one back.
    fn restore_cached_values(&mut self) {
        let state = &mut self.state;
        for schema in &state.props.schemas {
            if !schema.has_field() || state.form_model.contains_key(&schema.field) {
                continue;
            }
            if let Some(cached) = state.cache_form_model.get(&schema.field) {
                state.form_model.insert(schema.field.clone(), cached.clone());
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Rules per field, including the implied `required` rule and the
    /// component's type hint.
    pub fn field_rules(&self) -> Vec<FieldRules> {
        self.state
            .props
            .schemas
            .iter()
            .filter(|s| s.has_field() && !s.component.is_divider())
            .map(|schema| {
                let mut rules = schema.rules.clone();
                if schema.required && !rules.iter().any(|r| r.required) {
                    let label = if schema.label.is_empty() { &schema.field } else { &schema.label };
                    rules.insert(0, Rule::required(format!("{} is required", label)));
                }
                let hint = component_rule_type(schema.component, self.has_value_format(schema));
                for rule in rules.iter_mut() {
                    if rule.rule_type.is_none() {
                        rule.rule_type = hint;
                    }
                }
                FieldRules {
                    field: schema.field.clone(),
                    label: schema.label.clone(),
                    component: schema.component,
                    rules,
                }
            })
            .collect()
    }

    /// Validate the named fields. A no-op on an unmounted form.
    pub fn validate_fields(&mut self, names: Option<&[String]>) -> Result<FormModel, FormError> {
        if self.validator.is_none() {
            return Ok(FormModel::new());
        }
        self.validate(names)
    }

    /// Validate, failing when the form is not mounted.
    pub fn validate(&mut self, names: Option<&[String]>) -> Result<FormModel, FormError> {
        let rules = self.field_rules();
        let validator = self.validator.as_mut().ok_or(FormError::NotMounted)?;
        validator
            .validate(&rules, &self.state.form_model, names)
            .map_err(FormError::from)
    }

    pub fn clear_validate(&mut self, names: Option<&[String]>) {
        if let Some(validator) = self.validator.as_mut() {
            validator.clear(names);
        }
    }

    pub fn field_errors(&self, field: &str) -> Vec<String> {
        self.validator
            .as_ref()
            .map(|v| v.errors_for(field))
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Reset & submit
    // ------------------------------------------------------------------

    /// Restore defaults for every key in the model. Validation state is
    /// cleared on the next `tick`.
    pub fn reset_fields(&mut self) -> Result<(), FormError> {
        if let Some(reset) = self.state.props.reset_func.clone() {
            reset().map_err(|message| FormError::Hook {
                hook: "reset",
                message,
            })?;
        }

        let keys: Vec<String> = self.state.form_model.keys().cloned().collect();
        for key in keys {
            let value = self
                .state
                .default_form_values
                .get(&key)
                .cloned()
                .unwrap_or_default();
            self.state.form_model.insert(key, value);
        }

        self.events.push(FormEvent::Reset(self.state.form_model.clone()));

        if self.state.props.submit_on_reset {
            if let Err(e) = self.handle_submit() {
                tracing::debug!("submit on reset failed: {}", e);
            }
        }

        self.deferred.push_back(Deferred::ClearValidate);
        Ok(())
    }

    /// Submit the form.
    ///
    /// A configured submit function takes over entirely and `Ok(None)` is
    /// returned. Otherwise the form is validated, the values shaped, a
    /// `Submit` event emitted and the shaped values returned.
    pub fn handle_submit(&mut self) -> Result<Option<FormModel>, FormError> {
        if let Some(submit) = self.state.props.submit_func.clone() {
            submit(&self.state.form_model).map_err(|message| FormError::Hook {
                hook: "submit",
                message,
            })?;
            return Ok(None);
        }

        if !self.is_mounted() {
            return Ok(None);
        }

        let values = self.validate(None)?;
        let res = self.handle_form_values(&values);
        self.events.push(FormEvent::Submit(res.clone()));
        Ok(Some(res))
    }

    /// Submit on Enter pressed inside an input, when enabled.
    pub fn handle_enter_press(&mut self, key: &str, target_tag: &str) -> Option<Result<Option<FormModel>, FormError>> {
        if !self.state.props.auto_submit_on_enter {
            return None;
        }
        if key == "Enter" && target_tag.eq_ignore_ascii_case("input") {
            return Some(self.handle_submit());
        }
        None
    }

    /// Run work deferred to the next tick.
    pub fn tick(&mut self) {
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::ClearValidate => self.clear_validate(None),
            }
        }
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn advance_snapshot(&self) -> AdvanceState {
        self.state.advance_state.clone()
    }
}

fn to_date_or_raw(key: &str, value: FormValue) -> FormValue {
    match parse_date(&value) {
        Some(d) => FormValue::Date(d),
        None => {
            tracing::warn!("field '{}' holds an unparseable date {:?}", key, value);
            value
        }
    }
}

fn dedupe_by_field(schemas: Vec<FormSchema>) -> Vec<FormSchema> {
    let mut seen = std::collections::HashSet::new();
    schemas
        .into_iter()
        .filter(|s| !s.has_field() || seen.insert(s.field.clone()))
        .collect()
}

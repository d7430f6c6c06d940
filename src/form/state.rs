use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::form::advanced::AdvanceState;
use crate::form::props::SchemaFormProps;
use crate::form::schema::{FormSchema, RenderContext};
use crate::form::value::FormModel;

/// Opaque handle to a rendered field component.
pub type ComponentHandle = Rc<dyn Any>;

/// Reactive state of one form instance.
#[derive(Debug)]
pub struct FormState {
    pub(crate) props: SchemaFormProps,
    /// Current values.
    pub(crate) form_model: FormModel,
    /// What `reset_fields` restores.
    pub(crate) default_form_values: FormModel,
    /// Every value ever set, including for fields currently hidden or removed.
    pub(crate) cache_form_model: FormModel,
    pub(crate) comp_refs: HashMap<String, ComponentHandle>,
    pub(crate) advance_state: AdvanceState,
}

impl FormState {
    pub fn new(props: SchemaFormProps) -> Self {
        let initial = props.initial_values.clone();
        let mut state = FormState {
            props,
            form_model: initial.clone(),
            default_form_values: initial.clone(),
            cache_form_model: initial,
            comp_refs: HashMap::new(),
            advance_state: AdvanceState::default(),
        };
        state.track_schemas();
        state
    }

    pub fn schemas(&self) -> &[FormSchema] {
        &self.props.schemas
    }

    pub fn props(&self) -> &SchemaFormProps {
        &self.props
    }

    pub fn form_model(&self) -> &FormModel {
        &self.form_model
    }

    pub fn default_form_values(&self) -> &FormModel {
        &self.default_form_values
    }

    pub fn cache_form_model(&self) -> &FormModel {
        &self.cache_form_model
    }

    pub fn advance_state(&self) -> &AdvanceState {
        &self.advance_state
    }

    /// Runs after every schema replacement: remembers each field's first
    /// dynamic props provider and records declared defaults.
    pub(crate) fn track_schemas(&mut self) {
        for schema in self.props.schemas.iter_mut() {
            schema.capture_base_props();
            if let Some(value) = &schema.default_value {
                if schema.has_field() {
                    self.default_form_values
                        .insert(schema.field.clone(), value.clone());
                }
            }
        }
    }

    /// Defaults overlaid with the current model.
    pub(crate) fn merged_values(&self) -> FormModel {
        let mut values = self.default_form_values.clone();
        values.extend(self.form_model.iter().map(|(k, v)| (k.clone(), v.clone())));
        values
    }

    /// Run `f` with a render context for `schema`.
    pub(crate) fn with_context<R>(&self, schema: &FormSchema, f: impl FnOnce(&RenderContext<'_>) -> R) -> R {
        let values = self.merged_values();
        let ctx = RenderContext {
            field: &schema.field,
            schema,
            form_model: &self.form_model,
            values: &values,
        };
        f(&ctx)
    }
}

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::form::advanced::EmptySpan;
use crate::form::date::{DEFAULT_DATE_FORMAT, format_date};
use crate::form::schema::{Callback, ColProps, FormSchema};
use crate::form::value::{FormModel, FormValue};

pub type DateTransform = Callback<dyn Fn(FormValue) -> FormValue>;
pub type SubmitFunc = Callback<dyn Fn(&FormModel) -> Result<(), String>>;
pub type ResetFunc = Callback<dyn Fn() -> Result<(), String>>;

/// `[field, [startKey, endKey], format?]`: split a two-element range value
/// into two formatted keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapToTime {
    pub field: String,
    pub start_key: String,
    pub end_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl FieldMapToTime {
    pub fn new(field: impl Into<String>, start_key: impl Into<String>, end_key: impl Into<String>) -> Self {
        FieldMapToTime {
            field: field.into(),
            start_key: start_key.into(),
            end_key: end_key.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// When field-level validation runs on `set_form_model`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidateTrigger {
    Change,
    Blur,
    Submit,
}

/// Everything a form instance is configured with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFormProps {
    #[serde(default)]
    pub schemas: Vec<FormSchema>,

    #[serde(default)]
    pub initial_values: FormModel,

    #[serde(default)]
    pub field_map_to_time: Vec<FieldMapToTime>,

    #[serde(default)]
    pub submit_on_reset: bool,

    #[serde(default)]
    pub auto_submit_on_enter: bool,

    #[serde(default)]
    pub show_advanced_button: bool,

    #[serde(default = "default_always_show_lines")]
    pub always_show_lines: u32,

    #[serde(default = "default_auto_advanced_line")]
    pub auto_advanced_line: u32,

    #[serde(default)]
    pub base_col_props: ColProps,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_col_options: Option<ColProps>,

    #[serde(default)]
    pub empty_span: EmptySpan,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_trigger: Option<ValidateTrigger>,

    /// Applied to date and object values by the value pipeline.
    #[serde(skip)]
    pub transform_date_func: Option<DateTransform>,

    /// Replaces the built-in submit entirely when set.
    #[serde(skip)]
    pub submit_func: Option<SubmitFunc>,

    /// Runs before fields are reset.
    #[serde(skip)]
    pub reset_func: Option<ResetFunc>,
}

fn default_always_show_lines() -> u32 { 1 }
fn default_auto_advanced_line() -> u32 { 3 }

impl Default for SchemaFormProps {
    fn default() -> Self {
        Self {
            schemas: Vec::new(),
            initial_values: FormModel::new(),
            field_map_to_time: Vec::new(),
            submit_on_reset: false,
            auto_submit_on_enter: false,
            show_advanced_button: false,
            always_show_lines: default_always_show_lines(),
            auto_advanced_line: default_auto_advanced_line(),
            base_col_props: ColProps::default(),
            action_col_options: None,
            empty_span: EmptySpan::default(),
            validate_trigger: None,
            transform_date_func: None,
            submit_func: None,
            reset_func: None,
        }
    }
}

impl SchemaFormProps {
    pub fn new(schemas: Vec<FormSchema>) -> Self {
        SchemaFormProps {
            schemas,
            ..Default::default()
        }
    }

    pub fn with_initial_values(mut self, values: FormModel) -> Self {
        self.initial_values = values;
        self
    }

    pub fn with_field_map_to_time(mut self, mapping: FieldMapToTime) -> Self {
        self.field_map_to_time.push(mapping);
        self
    }

    pub fn with_advanced(mut self, always_show_lines: u32) -> Self {
        self.show_advanced_button = true;
        self.always_show_lines = always_show_lines;
        self
    }

    pub fn with_submit_func(mut self, f: impl Fn(&FormModel) -> Result<(), String> + 'static) -> Self {
        self.submit_func = Some(Callback(Rc::new(f)));
        self
    }

    pub fn with_reset_func(mut self, f: impl Fn() -> Result<(), String> + 'static) -> Self {
        self.reset_func = Some(Callback(Rc::new(f)));
        self
    }

    pub fn with_date_transform(mut self, f: impl Fn(FormValue) -> FormValue + 'static) -> Self {
        self.transform_date_func = Some(Callback(Rc::new(f)));
        self
    }

    /// Date transform hook in effect: the configured one, or formatting
    /// dates with the default pattern (objects pass through).
    pub(crate) fn transform_date(&self, value: FormValue) -> FormValue {
        match &self.transform_date_func {
            Some(f) => f(value),
            None => match value {
                FormValue::Date(d) => FormValue::String(format_date(&d, DEFAULT_DATE_FORMAT)),
                other => other,
            },
        }
    }
}

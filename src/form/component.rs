use serde::{Deserialize, Serialize};

use crate::form::validation::RuleType;
use crate::form::value::FormValue;

/// Grid width of one full row.
pub const BASIC_COL_LEN: u32 = 24;

/// Input capabilities a schema entry can ask the rendering layer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Input,
    InputGroup,
    InputPassword,
    InputSearch,
    InputTextArea,
    InputNumber,
    AutoComplete,
    Select,
    TreeSelect,
    Tree,
    Switch,
    RadioGroup,
    Checkbox,
    CheckboxGroup,
    Cascader,
    Slider,
    Rate,
    DatePicker,
    MonthPicker,
    RangePicker,
    WeekPicker,
    TimePicker,
    Upload,
    Divider,
}

pub const DATE_COMPONENT_TYPES: &[ComponentType] = &[
    ComponentType::DatePicker,
    ComponentType::MonthPicker,
    ComponentType::WeekPicker,
    ComponentType::TimePicker,
];

pub const INPUT_COMPONENT_TYPES: &[ComponentType] = &[
    ComponentType::Input,
    ComponentType::InputPassword,
    ComponentType::InputSearch,
    ComponentType::InputTextArea,
];

pub const CHOOSE_COMPONENT_TYPES: &[ComponentType] = &[
    ComponentType::Select,
    ComponentType::Cascader,
    ComponentType::Checkbox,
    ComponentType::CheckboxGroup,
    ComponentType::Switch,
    ComponentType::TreeSelect,
];

pub const ARRAY_RULE_COMPONENT_TYPES: &[ComponentType] = &[
    ComponentType::RangePicker,
    ComponentType::Upload,
    ComponentType::CheckboxGroup,
    ComponentType::TimePicker,
];

pub const CHECK_COMPONENT_TYPES: &[ComponentType] = &[ComponentType::Switch, ComponentType::Checkbox];

impl ComponentType {
    pub fn name(self) -> &'static str {
        match self {
            ComponentType::Input => "Input",
            ComponentType::InputGroup => "InputGroup",
            ComponentType::InputPassword => "InputPassword",
            ComponentType::InputSearch => "InputSearch",
            ComponentType::InputTextArea => "InputTextArea",
            ComponentType::InputNumber => "InputNumber",
            ComponentType::AutoComplete => "AutoComplete",
            ComponentType::Select => "Select",
            ComponentType::TreeSelect => "TreeSelect",
            ComponentType::Tree => "Tree",
            ComponentType::Switch => "Switch",
            ComponentType::RadioGroup => "RadioGroup",
            ComponentType::Checkbox => "Checkbox",
            ComponentType::CheckboxGroup => "CheckboxGroup",
            ComponentType::Cascader => "Cascader",
            ComponentType::Slider => "Slider",
            ComponentType::Rate => "Rate",
            ComponentType::DatePicker => "DatePicker",
            ComponentType::MonthPicker => "MonthPicker",
            ComponentType::RangePicker => "RangePicker",
            ComponentType::WeekPicker => "WeekPicker",
            ComponentType::TimePicker => "TimePicker",
            ComponentType::Upload => "Upload",
            ComponentType::Divider => "Divider",
        }
    }

    pub fn is_divider(self) -> bool {
        self == ComponentType::Divider
    }

    /// Single-date pickers.
    pub fn is_date(self) -> bool {
        DATE_COMPONENT_TYPES.contains(&self)
    }

    /// Components whose values get date coercion on assignment (pickers and ranges).
    pub fn is_date_item(self) -> bool {
        self.is_date() || self == ComponentType::RangePicker
    }

    pub fn is_input(self) -> bool {
        INPUT_COMPONENT_TYPES.contains(&self)
    }

    /// Components bound through `checked` rather than `value`.
    pub fn is_check(self) -> bool {
        CHECK_COMPONENT_TYPES.contains(&self)
    }

    /// Name of the prop the field's value is bound to.
    pub fn value_prop_name(self) -> &'static str {
        if self.is_check() { "checked" } else { "value" }
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Placeholder text for a component.
pub fn create_placeholder_message(component: ComponentType, label: &str) -> String {
    let name = component.name();
    if name.contains("Input") || name.contains("Complete") {
        return format!("Please enter {}", label).trim_end().to_string();
    }
    if name.contains("Picker") || CHOOSE_COMPONENT_TYPES.contains(&component) {
        return format!("Please select {}", label).trim_end().to_string();
    }
    String::new()
}

/// Rule type hint the validation layer should apply to a component's value.
pub fn component_rule_type(component: ComponentType, has_value_format: bool) -> Option<RuleType> {
    if component.is_date() {
        Some(if has_value_format {
            RuleType::String
        } else {
            RuleType::Object
        })
    } else if ARRAY_RULE_COMPONENT_TYPES.contains(&component) {
        Some(RuleType::Array)
    } else if component == ComponentType::InputNumber {
        Some(RuleType::Number)
    } else {
        None
    }
}

/// Text inputs hold strings: numbers written into them are stringified.
pub fn handle_input_number_value(component: ComponentType, value: FormValue) -> FormValue {
    match value {
        FormValue::Number(n) if component.is_input() && value_is_nonzero(&n) => {
            FormValue::String(n.to_string())
        }
        other => other,
    }
}

fn value_is_nonzero(n: &serde_json::Number) -> bool {
    n.as_f64().is_some_and(|f| f != 0.0)
}

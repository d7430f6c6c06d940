//! Shapes raw model values into what a submit consumer receives.

use crate::form::date::{DEFAULT_RANGE_FORMAT, format_date, parse_date};
use crate::form::methods::SchemaForm;
use crate::form::value::{FormModel, FormValue};

impl SchemaForm {
    /// Run `values` through the value pipeline:
    ///
    /// 1. empty lists are dropped
    /// 2. dates and objects go through the date transform hook
    /// 3. lists whose first two entries are dates are transformed element-wise
    /// 4. strings are trimmed
    /// 5. a schema transform returning an object is spread into the result
    ///    in place of the field
    /// 6. `field_map_to_time` ranges are split into their start/end keys
    pub fn handle_form_values(&self, values: &FormModel) -> FormModel {
        let props = &self.state.props;
        let mut res = FormModel::new();

        for (key, original) in values {
            if key.is_empty() {
                continue;
            }
            if matches!(original, FormValue::List(items) if items.is_empty()) {
                continue;
            }

            let mut value = original.clone();
            if matches!(value, FormValue::Object(_) | FormValue::Date(_)) {
                value = props.transform_date(value);
            }
            if let FormValue::List(items) = &value {
                if items.len() >= 2 && items[0].is_date() && items[1].is_date() {
                    value = FormValue::List(
                        items.iter().cloned().map(|v| props.transform_date(v)).collect(),
                    );
                }
            }
            if let FormValue::String(s) = &value {
                value = FormValue::String(s.trim().to_string());
            }

            let transform = self
                .get_schema_by_field(key)
                .and_then(|s| s.transform.clone());
            if let Some(transform) = transform {
                value = transform(value);
                if let FormValue::Object(spread) = value {
                    res.extend(spread);
                    res.remove(key);
                    continue;
                }
            }

            res.insert(key.clone(), value);
        }

        self.handle_range_time_value(res)
    }

    /// Split each mapped range into two formatted keys. A range missing
    /// either half removes the field without producing keys.
    fn handle_range_time_value(&self, mut values: FormModel) -> FormModel {
        for mapping in &self.state.props.field_map_to_time {
            if mapping.field.is_empty() || mapping.start_key.is_empty() || mapping.end_key.is_empty() {
                continue;
            }
            let Some(FormValue::List(items)) = values.get(&mapping.field) else {
                continue;
            };

            let start = items.first().cloned().unwrap_or_default();
            let end = items.get(1).cloned().unwrap_or_default();
            if !start.is_truthy() || !end.is_truthy() {
                values.remove(&mapping.field);
                continue;
            }

            let format = mapping.format.as_deref().unwrap_or(DEFAULT_RANGE_FORMAT);
            values.insert(mapping.start_key.clone(), format_bound(&mapping.field, start, format));
            values.insert(mapping.end_key.clone(), format_bound(&mapping.field, end, format));
            values.remove(&mapping.field);
        }
        values
    }
}

fn format_bound(field: &str, value: FormValue, format: &str) -> FormValue {
    match parse_date(&value) {
        Some(d) => FormValue::String(format_date(&d, format)),
        None => {
            tracing::warn!("range '{}' has an unparseable bound {:?}", field, value);
            value
        }
    }
}

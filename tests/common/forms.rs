use admin_console::form::{
    ColProps, ComponentType, FormSchema, SchemaForm, SchemaFormProps,
};

pub fn input(field: &str) -> FormSchema {
    FormSchema::new(field, ComponentType::Input).with_label(field)
}

/// An input spanning the whole row.
pub fn full_row(field: &str) -> FormSchema {
    input(field).with_col(ColProps::span(24))
}

pub fn mounted(schemas: Vec<FormSchema>) -> SchemaForm {
    SchemaForm::mounted(SchemaFormProps::new(schemas))
}

pub fn fields(form: &SchemaForm) -> Vec<String> {
    form.schemas().iter().map(|s| s.field.clone()).collect()
}

/// Fields currently shown while the form is collapsed.
pub fn advanced_fields(form: &SchemaForm) -> Vec<String> {
    form.schemas()
        .iter()
        .filter(|s| s.is_advanced)
        .map(|s| s.field.clone())
        .collect()
}

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::form::component::ComponentType;
use crate::form::validation::Rule;
use crate::form::value::{FormModel, FormValue};

/// Component configuration map handed to the rendering layer.
pub type PropsMap = Map<String, Value>;

// ============================================================================
// Callbacks
// ============================================================================

/// Shared, cheaply clonable callback.
pub struct Callback<F: ?Sized>(pub(crate) Rc<F>);

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Callback(Rc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<callback>")
    }
}

impl<F: ?Sized> Deref for Callback<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.0
    }
}

/// What dynamic schema callbacks get to look at.
pub struct RenderContext<'a> {
    pub field: &'a str,
    pub schema: &'a FormSchema,
    pub form_model: &'a FormModel,
    /// Defaults overlaid with the current model.
    pub values: &'a FormModel,
}

pub type PropsProvider = Callback<dyn Fn(&RenderContext<'_>) -> PropsMap>;
pub type ShowPredicate = Callback<dyn Fn(&RenderContext<'_>) -> bool>;
pub type Transform = Callback<dyn Fn(FormValue) -> FormValue>;

/// Build a value transform for `FormSchema::transform`.
pub fn transform(f: impl Fn(FormValue) -> FormValue + 'static) -> Transform {
    Callback(Rc::new(f))
}

// ============================================================================
// Component props
// ============================================================================

/// Static configuration, or a pure function of the form context.
#[derive(Clone, Debug)]
pub enum ComponentProps {
    Static(PropsMap),
    Dynamic(PropsProvider),
}

impl ComponentProps {
    pub fn dynamic(f: impl Fn(&RenderContext<'_>) -> PropsMap + 'static) -> Self {
        ComponentProps::Dynamic(Callback(Rc::new(f)))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ComponentProps::Dynamic(_))
    }

    pub fn is_empty_static(&self) -> bool {
        matches!(self, ComponentProps::Static(map) if map.is_empty())
    }

    pub fn resolve(&self, ctx: &RenderContext<'_>) -> PropsMap {
        match self {
            ComponentProps::Static(map) => map.clone(),
            ComponentProps::Dynamic(f) => f(ctx),
        }
    }
}

impl Default for ComponentProps {
    fn default() -> Self {
        ComponentProps::Static(PropsMap::new())
    }
}

impl From<Value> for ComponentProps {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => ComponentProps::Static(map),
            _ => ComponentProps::default(),
        }
    }
}

impl Serialize for ComponentProps {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ComponentProps::Static(map) => map.serialize(serializer),
            ComponentProps::Dynamic(_) => PropsMap::new().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ComponentProps {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PropsMap::deserialize(deserializer).map(ComponentProps::Static)
    }
}

// ============================================================================
// Visibility
// ============================================================================

#[derive(Clone, Debug)]
pub enum VShow {
    Always(bool),
    When(ShowPredicate),
}

impl VShow {
    pub fn when(f: impl Fn(&RenderContext<'_>) -> bool + 'static) -> Self {
        VShow::When(Callback(Rc::new(f)))
    }

    pub fn is_shown(&self, ctx: &RenderContext<'_>) -> bool {
        match self {
            VShow::Always(b) => *b,
            VShow::When(f) => f(ctx),
        }
    }

    fn is_default(&self) -> bool {
        matches!(self, VShow::Always(true))
    }
}

impl Default for VShow {
    fn default() -> Self {
        VShow::Always(true)
    }
}

impl Serialize for VShow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VShow::Always(b) => serializer.serialize_bool(*b),
            VShow::When(_) => serializer.serialize_bool(true),
        }
    }
}

impl<'de> Deserialize<'de> for VShow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer).map(VShow::Always)
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Responsive column spans (out of `BASIC_COL_LEN`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lg: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xxl: Option<u32>,
}

impl ColProps {
    pub fn span(span: u32) -> Self {
        ColProps {
            span: Some(span),
            ..Default::default()
        }
    }

    /// Key-by-key overlay: values set on `over` win.
    pub fn overlay(&self, over: &ColProps) -> ColProps {
        ColProps {
            span: over.span.or(self.span),
            xs: over.xs.or(self.xs),
            sm: over.sm.or(self.sm),
            md: over.md.or(self.md),
            lg: over.lg.or(self.lg),
            xl: over.xl.or(self.xl),
            xxl: over.xxl.or(self.xxl),
        }
    }
}

// ============================================================================
// Schema entry
// ============================================================================

/// One declarative field descriptor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    /// Unique key. Empty only for dividers.
    #[serde(default)]
    pub field: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,

    pub component: ComponentType,

    #[serde(default, skip_serializing_if = "ComponentProps::is_empty_static")]
    pub component_props: ComponentProps,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FormValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_props: Option<ColProps>,

    #[serde(default, skip_serializing_if = "VShow::is_default")]
    pub v_show: VShow,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    #[serde(skip)]
    pub transform: Option<Transform>,

    /// Derived by the layout calculator; `true` means shown while collapsed.
    #[serde(skip)]
    pub is_advanced: bool,

    /// The first dynamic props provider this field was seen with. Later
    /// updates overlay on top of it instead of replacing it.
    #[serde(skip)]
    pub(crate) base_props: Option<PropsProvider>,

    /// Any other rendering configuration (help text, slots, ...).
    #[serde(flatten)]
    pub extra: PropsMap,
}

impl FormSchema {
    pub fn new(field: impl Into<String>, component: ComponentType) -> Self {
        FormSchema {
            field: field.into(),
            label: String::new(),
            component,
            component_props: ComponentProps::default(),
            default_value: None,
            col_props: None,
            v_show: VShow::default(),
            required: false,
            rules: Vec::new(),
            transform: None,
            is_advanced: false,
            base_props: None,
            extra: PropsMap::new(),
        }
    }

    pub fn divider(label: impl Into<String>) -> Self {
        FormSchema::new("", ComponentType::Divider).with_label(label)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_props(mut self, props: ComponentProps) -> Self {
        self.component_props = props;
        self
    }

    pub fn with_default(mut self, value: impl Into<FormValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_col(mut self, col: ColProps) -> Self {
        self.col_props = Some(col);
        self
    }

    pub fn with_v_show(mut self, v_show: VShow) -> Self {
        self.v_show = v_show;
        self
    }

    pub fn with_transform(mut self, f: impl Fn(FormValue) -> FormValue + 'static) -> Self {
        self.transform = Some(transform(f));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn has_field(&self) -> bool {
        !self.field.is_empty()
    }

    /// Whether a remembered base provider is composed into this entry's props.
    pub fn has_base_props(&self) -> bool {
        self.base_props.is_some()
    }

    /// Effective component props: the remembered base provider (if any)
    /// shallow-overlaid with this entry's own props.
    pub fn resolve_props(&self, ctx: &RenderContext<'_>) -> PropsMap {
        match &self.base_props {
            Some(base) => {
                let mut props = base(ctx);
                for (k, v) in self.component_props.resolve(ctx) {
                    props.insert(k, v);
                }
                props
            }
            None => self.component_props.resolve(ctx),
        }
    }

    /// Move a dynamic props provider into the base slot the first time it is seen.
    pub(crate) fn capture_base_props(&mut self) {
        if self.base_props.is_some() {
            return;
        }
        if let ComponentProps::Dynamic(provider) = &self.component_props {
            self.base_props = Some(provider.clone());
            self.component_props = ComponentProps::default();
        }
    }
}

// ============================================================================
// Partial updates
// ============================================================================

/// Partial schema entry for `update_schema`.
#[derive(Clone, Debug, Default)]
pub struct SchemaPatch {
    pub field: Option<String>,
    pub label: Option<String>,
    pub component: Option<ComponentType>,
    pub component_props: Option<ComponentProps>,
    pub default_value: Option<FormValue>,
    pub col_props: Option<ColProps>,
    pub v_show: Option<VShow>,
    pub required: Option<bool>,
    pub rules: Option<Vec<Rule>>,
    pub transform: Option<Transform>,
    pub extra: PropsMap,
}

impl SchemaPatch {
    pub fn field(field: impl Into<String>) -> Self {
        SchemaPatch {
            field: Some(field.into()),
            ..Default::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn component(mut self, component: ComponentType) -> Self {
        self.component = Some(component);
        self
    }

    pub fn props(mut self, props: ComponentProps) -> Self {
        self.component_props = Some(props);
        self
    }

    pub fn default_value(mut self, value: impl Into<FormValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn col(mut self, col: ColProps) -> Self {
        self.col_props = Some(col);
        self
    }

    pub fn v_show(mut self, v_show: VShow) -> Self {
        self.v_show = Some(v_show);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub(crate) fn is_divider(&self) -> bool {
        self.component.is_some_and(ComponentType::is_divider)
    }

    pub(crate) fn field_key(&self) -> &str {
        self.field.as_deref().unwrap_or("")
    }

    /// Deep-merge this patch onto `base`. Nested maps merge key by key,
    /// lists replace wholesale. When `base` carries a remembered props
    /// provider, the patch's props become the overlay on top of it.
    pub(crate) fn apply_to(&self, base: &FormSchema) -> FormSchema {
        let mut merged = base.clone();

        if let Some(label) = &self.label {
            merged.label = label.clone();
        }
        if let Some(component) = self.component {
            merged.component = component;
        }
        if let Some(value) = &self.default_value {
            merged.default_value = Some(value.clone());
        }
        if let Some(col) = &self.col_props {
            merged.col_props = Some(match &base.col_props {
                Some(existing) => existing.overlay(col),
                None => col.clone(),
            });
        }
        if let Some(v_show) = &self.v_show {
            merged.v_show = v_show.clone();
        }
        if let Some(required) = self.required {
            merged.required = required;
        }
        if let Some(rules) = &self.rules {
            merged.rules = rules.clone();
        }
        if let Some(transform) = &self.transform {
            merged.transform = Some(transform.clone());
        }
        deep_merge(&mut merged.extra, &self.extra);

        if merged.base_props.is_some() {
            merged.component_props = self.component_props.clone().unwrap_or_default();
        } else if let Some(props) = &self.component_props {
            merged.component_props = match (&base.component_props, props) {
                (ComponentProps::Static(existing), ComponentProps::Static(update)) => {
                    let mut map = existing.clone();
                    deep_merge(&mut map, update);
                    ComponentProps::Static(map)
                }
                (_, update) => update.clone(),
            };
        }

        merged
    }
}

/// Recursive object merge; arrays and scalars from `src` replace.
pub fn deep_merge(target: &mut PropsMap, src: &PropsMap) {
    for (key, value) in src {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(update)) => deep_merge(existing, update),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_replaces_arrays_and_merges_objects() {
        let mut target = json!({"a": {"x": 1, "y": 2}, "list": [1, 2, 3]})
            .as_object()
            .cloned()
            .unwrap();
        let src = json!({"a": {"y": 5}, "list": [9]}).as_object().cloned().unwrap();

        deep_merge(&mut target, &src);

        assert_eq!(Value::Object(target), json!({"a": {"x": 1, "y": 5}, "list": [9]}));
    }

    #[test]
    fn schema_deserializes_from_yaml() {
        let yaml = r#"
field: status
label: Status
component: Select
componentProps:
  options: [{label: On, value: 1}]
colProps: {span: 8}
defaultValue: 1
vShow: false
"#;
        let schema: FormSchema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.field, "status");
        assert_eq!(schema.component, ComponentType::Select);
        assert_eq!(schema.col_props, Some(ColProps::span(8)));
        assert_eq!(schema.default_value, Some(FormValue::from(1)));
        assert!(matches!(schema.v_show, VShow::Always(false)));
        assert!(matches!(schema.component_props, ComponentProps::Static(ref m) if m.contains_key("options")));
    }
}

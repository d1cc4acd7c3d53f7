//! Schema types: the author-supplied description of a form.
//!
//! Everything here deserializes from JSON or YAML with camelCase keys, the
//! way form schemas are written by hand. Callable parts (custom validators,
//! rule conditions, computed request params, response transforms) cannot be
//! serialized; they are attached in code after loading.

use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{FieldsError, Result};

/// Free-form values available to rule conditions and custom validators.
pub type Context = Map<String, Value>;

/// A whole form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Arc<Field>>,
    #[serde(default)]
    pub context: Context,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields: fields.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(input)?)
    }

    /// Load a schema file; the format follows the extension
    /// (`.json`, `.yaml`, `.yml`).
    pub async fn load(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(FieldsError::UnsupportedSchemaFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// One node of the schema tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub field_name: String,
    pub control: Control,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extra: Option<String>,
    /// Dotted paths of fields whose changes should re-render this one.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub model: Option<ModelDef>,
    #[serde(default)]
    pub children: Vec<Arc<Field>>,
    /// Opaque layout hints consumed by the rendering layer.
    #[serde(default)]
    pub layout: Option<Value>,
}

impl Field {
    pub fn new(field_name: impl Into<String>, control_type: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            control: Control::new(control_type),
            description: None,
            extra: None,
            dependencies: Vec::new(),
            model: None,
            children: Vec::new(),
            layout: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.model.get_or_insert_with(ModelDef::default).default_value = Some(value);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.model.get_or_insert_with(ModelDef::default).value = Some(value);
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.control.binding = Some(binding);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.control.rules.push(rule);
        self
    }

    /// Re-render this field whenever the field at `source` changes.
    pub fn depends_on(mut self, source: impl Into<String>) -> Self {
        self.dependencies.push(source.into());
        self
    }

    pub fn with_child(mut self, child: Field) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    /// Rules from the control followed by rules declared on the model.
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules = self.control.rules.clone();
        if let Some(model) = &self.model {
            rules.extend(model.rules.iter().cloned());
        }
        rules
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.control.binding.as_ref()
    }
}

/// A single option in a select-like control.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

/// How a field is rendered and what it is bound to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    /// Control kind, e.g. `input`, `select`, `checkbox`, or a custom name.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub binding: Option<Binding>,
    #[serde(default)]
    pub hidden: bool,
}

impl Control {
    pub fn new(type_: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            label: None,
            placeholder: None,
            options: Vec::new(),
            props: Map::new(),
            rules: Vec::new(),
            binding: None,
            hidden: false,
        }
    }
}

/// Initial model state declared by the schema author.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Compiled regular expression that deserializes from a string.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Self(regex)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.0.as_str()).finish()
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// Outcome of a custom validator: `Ok(false)` fails the rule, `Err` carries
/// the message of a validator that blew up.
pub type ValidatorOutcome = std::result::Result<bool, String>;

/// User-supplied validation function, either immediate or deferred.
#[derive(Clone)]
pub enum ValidatorFn {
    Sync(Arc<dyn Fn(&Value, &Context) -> ValidatorOutcome + Send + Sync>),
    Async(Arc<dyn Fn(Value, Context) -> BoxFuture<'static, ValidatorOutcome> + Send + Sync>),
}

impl ValidatorFn {
    pub fn sync(f: impl Fn(&Value, &Context) -> ValidatorOutcome + Send + Sync + 'static) -> Self {
        Self::Sync(Arc::new(f))
    }

    pub fn deferred(
        f: impl Fn(Value, Context) -> BoxFuture<'static, ValidatorOutcome> + Send + Sync + 'static,
    ) -> Self {
        Self::Async(Arc::new(f))
    }
}

impl fmt::Debug for ValidatorFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("ValidatorFn::Sync"),
            Self::Async(_) => f.write_str("ValidatorFn::Async"),
        }
    }
}

/// Predicate deciding whether a rule applies at all.
#[derive(Clone)]
pub struct ConditionFn(Arc<dyn Fn(&Context) -> bool + Send + Sync>);

impl ConditionFn {
    pub fn new(f: impl Fn(&Context) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, context: &Context) -> bool {
        (self.0)(context)
    }
}

impl fmt::Debug for ConditionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConditionFn")
    }
}

/// One validation rule. Several kinds may be set on the same rule; all of
/// them are checked before moving to the next rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pattern: Option<Pattern>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(skip)]
    pub validator: Option<ValidatorFn>,
    #[serde(skip)]
    pub condition: Option<ConditionFn>,
}

impl Rule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn pattern(pattern: Pattern) -> Self {
        Self {
            pattern: Some(pattern),
            ..Self::default()
        }
    }

    pub fn min(min: f64) -> Self {
        Self {
            min: Some(min),
            ..Self::default()
        }
    }

    pub fn max(max: f64) -> Self {
        Self {
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn validator(validator: ValidatorFn) -> Self {
        Self {
            validator: Some(validator),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn when(mut self, condition: ConditionFn) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// Schema-declared links from a field to the values of other fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Binding {
    /// Literal entries, or whole `"{{field}}"` tokens replaced by values.
    #[serde(default, rename = "static")]
    pub static_: Option<Vec<Value>>,
    /// Remote data fetched when a source field changes.
    #[serde(default, rename = "async")]
    pub async_: Option<AsyncBinding>,
    /// Visibility rule driven by another field's value.
    #[serde(default)]
    pub visible: Option<VisibleRule>,
}

impl Binding {
    pub fn visible(rule: VisibleRule) -> Self {
        Self {
            visible: Some(rule),
            ..Self::default()
        }
    }

    pub fn static_data(entries: Vec<Value>) -> Self {
        Self {
            static_: Some(entries),
            ..Self::default()
        }
    }

    pub fn remote(binding: AsyncBinding) -> Self {
        Self {
            async_: Some(binding),
            ..Self::default()
        }
    }
}

/// HTTP verbs accepted by async bindings.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Computes a request parameter from the snapshot of all form values.
#[derive(Clone)]
pub struct ParamFn(Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl ParamFn {
    pub fn new(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, values: &Value) -> Value {
        (self.0)(values)
    }
}

impl fmt::Debug for ParamFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParamFn")
    }
}

/// A request parameter: a literal (possibly holding `{{field}}` tokens) or a
/// function of all values.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Literal(Value),
    Computed(ParamFn),
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ParamValue::Literal)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// Reshapes a response body before it is forwarded to the field.
#[derive(Clone)]
pub struct TransformFn(Arc<dyn Fn(Value) -> std::result::Result<Value, String> + Send + Sync>);

impl TransformFn {
    pub fn new(
        f: impl Fn(Value) -> std::result::Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, body: Value) -> std::result::Result<Value, String> {
        (self.0)(body)
    }
}

impl fmt::Debug for TransformFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TransformFn")
    }
}

/// Remote data source for a field.
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncBinding {
    /// Request URL; `{{field}}` tokens are replaced before the request.
    pub url: String,
    #[serde(default)]
    pub method: Option<HttpMethod>,
    #[serde(default)]
    pub params: IndexMap<String, ParamValue>,
    #[serde(skip)]
    pub transform: Option<TransformFn>,
    /// Extra source fields that should refetch this binding.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl AsyncBinding {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: None,
            params: IndexMap::new(),
            transform: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_transform(mut self, transform: TransformFn) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn effective_method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }
}

/// Comparison used by a visibility rule. Unknown operators compare with `==`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Operator {
    #[default]
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Includes,
    Excludes,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Includes => "includes",
            Self::Excludes => "excludes",
        }
    }
}

impl From<&str> for Operator {
    fn from(symbol: &str) -> Self {
        match symbol.trim() {
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            "includes" => Self::Includes,
            "excludes" => Self::Excludes,
            _ => Self::Eq,
        }
    }
}

impl From<String> for Operator {
    fn from(symbol: String) -> Self {
        Self::from(symbol.as_str())
    }
}

/// Show the field only while `field` compares true against `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct VisibleRule {
    /// Dotted path of the source field.
    pub field: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub operator: Operator,
}

impl VisibleRule {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
            operator,
        }
    }
}

//! Type descriptors: how one tag is resolved, constructed and represented.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::SchemaError;
use crate::document::{Document, NodeId};
use crate::value::Value;

/// Node kind a type applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Scalar,
    Sequence,
    Mapping,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Scalar => "scalar",
            Kind::Sequence => "sequence",
            Kind::Mapping => "mapping",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scalar" => Ok(Kind::Scalar),
            "sequence" => Ok(Kind::Sequence),
            "mapping" => Ok(Kind::Mapping),
            other => Err(SchemaError::UnknownKind(other.to_owned())),
        }
    }
}

/// Does raw scalar text (second argument: the tag in effect) belong to this type?
pub type ScalarResolve = fn(&str, &str) -> bool;
/// Build the value of a scalar; `Err` carries the reason.
pub type ScalarConstruct = fn(&str, &str) -> Result<Value, String>;
/// Does the collection node belong to this type?
pub type NodeResolve = fn(&Document, NodeId, &str) -> bool;
/// Rewrite the collection node in place.
pub type NodeConstruct = fn(&mut Document, NodeId, &str) -> Result<(), String>;
/// Dump side: is this value an instance of the type?
pub type Predicate = fn(&Value) -> bool;
/// Dump side: text of `value` in the given style.
pub type RepresentFn = fn(&Value, &str) -> String;
/// Dump side: tag to emit for a multi type.
pub type RepresentName = fn(&Value) -> String;

#[derive(Clone, Copy)]
pub(crate) enum Hooks {
    Scalar {
        resolve: ScalarResolve,
        construct: ScalarConstruct,
    },
    Node {
        resolve: NodeResolve,
        construct: NodeConstruct,
    },
}

/// How a type turns a value back into text.
#[derive(Clone)]
pub enum Represent {
    /// One function; the style argument is passed through.
    Function(RepresentFn),
    /// Named styles, each with its own function.
    Styles(Vec<(String, RepresentFn)>),
}

fn resolve_any(_: &str, _: &str) -> bool {
    true
}

fn construct_string(data: &str, _: &str) -> Result<Value, String> {
    Ok(Value::String(data.to_owned()))
}

fn resolve_any_node(_: &Document, _: NodeId, _: &str) -> bool {
    true
}

fn construct_identity(_: &mut Document, _: NodeId, _: &str) -> Result<(), String> {
    Ok(())
}

/// Immutable description of one tag.
///
/// ```rust
/// use yaml_codec::schema::{Kind, TypeDescriptor};
/// use yaml_codec::Value;
///
/// let celsius = TypeDescriptor::builder("!celsius", Kind::Scalar)
///     .resolve_scalar(|data, _| data.parse::<f64>().is_ok())
///     .construct_scalar(|data, tag| {
///         let v: f64 = data.parse().map_err(|e| format!("{e}"))?;
///         Ok(Value::tagged(tag, Value::Float(v)))
///     })
///     .build()
///     .unwrap();
/// assert_eq!(celsius.tag(), "!celsius");
/// ```
#[derive(Clone)]
pub struct TypeDescriptor {
    tag: String,
    kind: Kind,
    multi: bool,
    hooks: Hooks,
    predicate: Option<Predicate>,
    represent: Option<Represent>,
    represent_name: Option<RepresentName>,
    default_style: Option<String>,
    style_aliases: HashMap<String, String>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("tag", &self.tag)
            .field("kind", &self.kind)
            .field("multi", &self.multi)
            .field("predicate", &self.predicate.is_some())
            .field("represent", &self.represent.is_some())
            .field("default_style", &self.default_style)
            .finish()
    }
}

impl TypeDescriptor {
    pub fn builder(tag: impl Into<String>, kind: Kind) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            tag: tag.into(),
            kind,
            multi: false,
            scalar_resolve: None,
            scalar_construct: None,
            node_resolve: None,
            node_construct: None,
            predicate: None,
            represent: None,
            represent_name: None,
            default_style: None,
            style_aliases: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn multi(&self) -> bool {
        self.multi
    }

    pub fn default_style(&self) -> Option<&str> {
        self.default_style.as_deref()
    }

    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    pub(crate) fn resolve_scalar(&self, data: &str, tag: &str) -> bool {
        match self.hooks {
            Hooks::Scalar { resolve, .. } => resolve(data, tag),
            Hooks::Node { .. } => false,
        }
    }

    pub(crate) fn construct_scalar(&self, data: &str, tag: &str) -> Result<Value, String> {
        match self.hooks {
            Hooks::Scalar { construct, .. } => construct(data, tag),
            Hooks::Node { .. } => Err(format!("{} is not a scalar type", self.tag)),
        }
    }

    pub(crate) fn resolve_node(&self, doc: &Document, id: NodeId, tag: &str) -> bool {
        match self.hooks {
            Hooks::Node { resolve, .. } => resolve(doc, id, tag),
            Hooks::Scalar { .. } => false,
        }
    }

    pub(crate) fn construct_node(&self, doc: &mut Document, id: NodeId, tag: &str) -> Result<(), String> {
        match self.hooks {
            Hooks::Node { construct, .. } => construct(doc, id, tag),
            Hooks::Scalar { .. } => Err(format!("{} is not a collection type", self.tag)),
        }
    }

    pub(crate) fn matches_value(&self, value: &Value) -> bool {
        self.predicate.is_some_and(|p| p(value))
    }

    /// Tag to emit for `value`: the type tag, or the computed one for multi types.
    pub(crate) fn output_tag(&self, value: &Value) -> String {
        match (self.multi, self.represent_name) {
            (true, Some(name)) => name(value),
            _ => self.tag.clone(),
        }
    }

    /// Canonical style name for `style` (aliases resolved), or the default style.
    pub(crate) fn canonical_style<'a>(&'a self, style: Option<&'a str>) -> Option<&'a str> {
        match style {
            Some(s) => Some(self.style_aliases.get(s).map_or(s, String::as_str)),
            None => self.default_style.as_deref(),
        }
    }

    /// True if `style` (or an alias of it) is offered by the representer.
    pub(crate) fn accepts_style(&self, style: &str) -> bool {
        let canonical = self.style_aliases.get(style).map_or(style, String::as_str);
        match &self.represent {
            Some(Represent::Styles(styles)) => styles.iter().any(|(name, _)| name == canonical),
            Some(Represent::Function(_)) => true,
            None => false,
        }
    }

    /// Represent `value`. `Ok(None)` means the type has no representer and the value is
    /// dumped as is.
    pub(crate) fn represent(&self, value: &Value, style: Option<&str>) -> Result<Option<String>, String> {
        let style = self.canonical_style(style);
        match &self.represent {
            None => Ok(None),
            Some(Represent::Function(f)) => Ok(Some(f(value, style.unwrap_or("")))),
            Some(Represent::Styles(styles)) => {
                let wanted = style.unwrap_or("");
                styles
                    .iter()
                    .find(|(name, _)| name == wanted)
                    .map(|(name, f)| Some(f(value, name)))
                    .ok_or_else(|| format!("!<{}> tag resolver accepts not \"{wanted}\" style", self.tag))
            }
        }
    }
}

/// Builder for [`TypeDescriptor`]; every check happens in [`TypeDescriptorBuilder::build`].
pub struct TypeDescriptorBuilder {
    tag: String,
    kind: Kind,
    multi: bool,
    scalar_resolve: Option<ScalarResolve>,
    scalar_construct: Option<ScalarConstruct>,
    node_resolve: Option<NodeResolve>,
    node_construct: Option<NodeConstruct>,
    predicate: Option<Predicate>,
    represent: Option<Represent>,
    represent_name: Option<RepresentName>,
    default_style: Option<String>,
    style_aliases: Vec<(String, String)>,
}

impl TypeDescriptorBuilder {
    /// Match every tag that starts with this type's tag.
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub fn resolve_scalar(mut self, f: ScalarResolve) -> Self {
        self.scalar_resolve = Some(f);
        self
    }

    pub fn construct_scalar(mut self, f: ScalarConstruct) -> Self {
        self.scalar_construct = Some(f);
        self
    }

    pub fn resolve_node(mut self, f: NodeResolve) -> Self {
        self.node_resolve = Some(f);
        self
    }

    pub fn construct_node(mut self, f: NodeConstruct) -> Self {
        self.node_construct = Some(f);
        self
    }

    pub fn predicate(mut self, f: Predicate) -> Self {
        self.predicate = Some(f);
        self
    }

    pub fn represent(mut self, f: RepresentFn) -> Self {
        self.represent = Some(Represent::Function(f));
        self
    }

    /// Add a named representation style. Replaces a single-function representer.
    pub fn represent_style(mut self, style: impl Into<String>, f: RepresentFn) -> Self {
        let style = style.into();
        match &mut self.represent {
            Some(Represent::Styles(styles)) => {
                styles.retain(|(name, _)| *name != style);
                styles.push((style, f));
            }
            _ => self.represent = Some(Represent::Styles(vec![(style, f)])),
        }
        self
    }

    pub fn represent_name(mut self, f: RepresentName) -> Self {
        self.represent_name = Some(f);
        self
    }

    pub fn default_style(mut self, style: impl Into<String>) -> Self {
        self.default_style = Some(style.into());
        self
    }

    /// Accept `alias` wherever `style` is expected (e.g. `hex` for `hexadecimal`).
    pub fn style_alias(mut self, alias: impl Into<String>, style: impl Into<String>) -> Self {
        self.style_aliases.push((alias.into(), style.into()));
        self
    }

    pub fn build(self) -> Result<TypeDescriptor, SchemaError> {
        let invalid = |reason: &str| {
            Err(SchemaError::InvalidType {
                tag: self.tag.clone(),
                reason: reason.to_owned(),
            })
        };
        if self.tag.is_empty() {
            return invalid("tag must not be empty");
        }

        let hooks = match self.kind {
            Kind::Scalar => {
                if self.node_resolve.is_some() || self.node_construct.is_some() {
                    return invalid("node hooks are only valid for sequence or mapping types");
                }
                Hooks::Scalar {
                    resolve: self.scalar_resolve.unwrap_or(resolve_any),
                    construct: self.scalar_construct.unwrap_or(construct_string),
                }
            }
            Kind::Sequence | Kind::Mapping => {
                if self.scalar_resolve.is_some() || self.scalar_construct.is_some() {
                    return invalid("scalar hooks are only valid for scalar types");
                }
                Hooks::Node {
                    resolve: self.node_resolve.unwrap_or(resolve_any_node),
                    construct: self.node_construct.unwrap_or(construct_identity),
                }
            }
        };

        if self.represent_name.is_some() && !self.multi {
            return invalid("represent_name is only valid for multi types");
        }

        let style_names: Vec<&str> = match &self.represent {
            Some(Represent::Styles(styles)) => styles.iter().map(|(n, _)| n.as_str()).collect(),
            _ => Vec::new(),
        };
        let offers = |style: &str| match &self.represent {
            Some(Represent::Styles(_)) => style_names.contains(&style),
            Some(Represent::Function(_)) => true,
            None => false,
        };
        if let Some(style) = &self.default_style
            && !offers(style)
        {
            return invalid(&format!("default style \"{style}\" is not offered by the representer"));
        }
        let mut style_aliases = HashMap::with_capacity(self.style_aliases.len());
        for (alias, style) in &self.style_aliases {
            if !offers(style) {
                return invalid(&format!(
                    "style alias \"{alias}\" points to unknown style \"{style}\""
                ));
            }
            style_aliases.insert(alias.clone(), style.clone());
        }

        Ok(TypeDescriptor {
            tag: self.tag,
            kind: self.kind,
            multi: self.multi,
            hooks,
            predicate: self.predicate,
            represent: self.represent,
            represent_name: self.represent_name,
            default_style: self.default_style,
            style_aliases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(v: &Value, _: &str) -> String {
        v.as_str().unwrap_or_default().to_uppercase()
    }

    fn lower(v: &Value, _: &str) -> String {
        v.as_str().unwrap_or_default().to_lowercase()
    }

    #[test]
    fn kind_from_str() {
        assert_eq!("mapping".parse::<Kind>().unwrap(), Kind::Mapping);
        assert!(matches!(
            "map".parse::<Kind>(),
            Err(SchemaError::UnknownKind(k)) if k == "map"
        ));
    }

    #[test]
    fn defaults_construct_strings() {
        let t = TypeDescriptor::builder("!s", Kind::Scalar).build().unwrap();
        assert!(t.resolve_scalar("anything", "!s"));
        assert_eq!(t.construct_scalar("x", "!s"), Ok(Value::from("x")));
    }

    #[test]
    fn rejects_empty_tag() {
        assert!(TypeDescriptor::builder("", Kind::Scalar).build().is_err());
    }

    #[test]
    fn rejects_hooks_of_wrong_kind() {
        let err = TypeDescriptor::builder("!s", Kind::Sequence)
            .resolve_scalar(|_, _| true)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("scalar hooks"));
    }

    #[test]
    fn rejects_unknown_default_style() {
        let err = TypeDescriptor::builder("!s", Kind::Scalar)
            .represent_style("upper", upper)
            .default_style("lower")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("default style"));
    }

    #[test]
    fn styles_and_aliases() {
        let t = TypeDescriptor::builder("!s", Kind::Scalar)
            .represent_style("upper", upper)
            .represent_style("lower", lower)
            .default_style("lower")
            .style_alias("U", "upper")
            .build()
            .unwrap();
        let v = Value::from("MiXed");
        assert_eq!(t.represent(&v, None).unwrap().unwrap(), "mixed");
        assert_eq!(t.represent(&v, Some("U")).unwrap().unwrap(), "MIXED");
        assert!(t.represent(&v, Some("title")).is_err());
        assert!(t.accepts_style("U"));
        assert!(!t.accepts_style("title"));
    }

    #[test]
    fn represent_name_requires_multi() {
        assert!(TypeDescriptor::builder("!x", Kind::Scalar)
            .represent_name(|_| "!x:1".into())
            .build()
            .is_err());
        let t = TypeDescriptor::builder("!x", Kind::Scalar)
            .multi(true)
            .represent_name(|_| "!x:1".into())
            .build()
            .unwrap();
        assert_eq!(t.output_tag(&Value::Null), "!x:1");
    }
}

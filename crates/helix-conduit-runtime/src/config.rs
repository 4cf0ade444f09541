//! Configuration trees, templates, substitution, and the typed lowering.
//!
//! Configuration enters the kernel as XML text and moves through three
//! explicit stages:
//!
//! 1. **Parse** — [`parse_config`] turns XML into a generic [`ConfigNode`]
//!    tree (name, attributes, children, text). This is also the shape
//!    handed to each service's `configuring` as its private `<config>`
//!    subtree.
//! 2. **Substitute** — [`substitute`] replaces `${KEY}` placeholders from a
//!    parameter map, producing a new tree. Placeholders that survive are a
//!    hard error, caught here rather than at scattered lookup sites.
//! 3. **Lower** — [`AppConfig::lower`] validates the tree into a typed AST
//!    of object/service/channel declarations at a single boundary; the
//!    launcher walks the AST, never raw XML.
//!
//! # Dialect
//!
//! ```xml
//! <config>
//!     <object uid="image" type="imaging::image"/>
//!     <service uid="reader" type="io::volume_reader" auto_start="true">
//!         <inout key="target" uid="image"/>
//!         <config path="${SERIES_PATH}"/>
//!     </service>
//!     <connect channel="image-modified">
//!         <signal>image/modified</signal>
//!         <slot>reader/refresh</slot>
//!     </connect>
//!     <proxy channel="${APP_CHANNEL}">
//!         <signal>reader/started</signal>
//!     </proxy>
//! </config>
//! ```
//!
//! `<connect>` may omit its channel (the launcher generates an internal
//! name); `<proxy>` declares a named channel shared with other
//! configurations. Endpoint references are written `uid/key`.
//!
//! Templates wrap a config body with declared parameters:
//!
//! ```xml
//! <template id="viewer">
//!     <param name="WID_PARENT"/>
//!     <param name="BACKGROUND" default="#000000"/>
//!     <config>...</config>
//! </template>
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::ConfigError;
use crate::service::AccessMode;

// ============================================================================
// ConfigNode
// ============================================================================

/// A generic configuration tree node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigNode {
    name: String,
    attributes: HashMap<String, String>,
    children: Vec<ConfigNode>,
    text: String,
}

impl ConfigNode {
    /// Create an empty node with the given element name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Get a required attribute, with a lowering-friendly error.
    pub fn require_attribute(&self, name: &str) -> Result<&str, ConfigError> {
        self.attribute(name)
            .ok_or_else(|| ConfigError::malformed(&self.name, format!("missing attribute '{name}'")))
    }

    /// Set an attribute value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Whether the attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Iterate over all attributes.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The child elements.
    pub fn children(&self) -> &[ConfigNode] {
        &self.children
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: ConfigNode) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All children with the given name.
    pub fn children_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// The concatenated text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse XML text into a [`ConfigNode`] tree.
pub fn parse_config(xml: &str) -> Result<ConfigNode, ConfigError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<ConfigNode> = Vec::new();
    let mut root: Option<ConfigNode> = None;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(start)) => {
                stack.push(node_from_tag(&start)?);
            }
            Ok(Event::End(_)) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| ConfigError::Xml("unbalanced end tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => {
                        if root.is_some() {
                            return Err(ConfigError::Xml(
                                "multiple root elements".to_string(),
                            ));
                        }
                        root = Some(node);
                    }
                }
            }
            Ok(Event::Empty(empty)) => {
                let node = node_from_tag(&empty)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => {
                        if root.is_some() {
                            return Err(ConfigError::Xml(
                                "multiple root elements".to_string(),
                            ));
                        }
                        root = Some(node);
                    }
                }
            }
            Ok(Event::Text(text)) => {
                let content = text
                    .unescape()
                    .map_err(|e| ConfigError::Xml(e.to_string()))?;
                if !content.is_empty() {
                    if let Some(parent) = stack.last_mut() {
                        parent.text.push_str(&content);
                    }
                }
            }
            // Declarations, comments, CDATA, and processing instructions
            // carry nothing the configuration dialect uses.
            Ok(_) => {}
            Err(e) => return Err(ConfigError::Xml(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(ConfigError::Xml("unclosed element".to_string()));
    }

    root.ok_or_else(|| ConfigError::Xml("document has no root element".to_string()))
}

fn node_from_tag(tag: &quick_xml::events::BytesStart<'_>) -> Result<ConfigNode, ConfigError> {
    let name = String::from_utf8_lossy(tag.name().as_ref()).to_string();
    let mut node = ConfigNode::new(name);
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| ConfigError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| ConfigError::Xml(e.to_string()))?
            .to_string();
        node.attributes.insert(key, value);
    }
    Ok(node)
}

// ============================================================================
// Substitution
// ============================================================================

/// Replace every `${KEY}` placeholder in attribute values and text.
///
/// Produces a new tree; the input is untouched. A key absent from `params`
/// is a hard error — required placeholders never survive into the lowered
/// configuration.
pub fn substitute(
    node: &ConfigNode,
    params: &HashMap<String, String>,
) -> Result<ConfigNode, ConfigError> {
    let mut result = ConfigNode::new(node.name.clone());
    for (key, value) in &node.attributes {
        result
            .attributes
            .insert(key.clone(), substitute_text(value, params)?);
    }
    result.text = substitute_text(&node.text, params)?;
    for child in &node.children {
        result.children.push(substitute(child, params)?);
    }
    Ok(result)
}

/// Replace `${KEY}` occurrences in one string.
fn substitute_text(
    text: &str,
    params: &HashMap<String, String>,
) -> Result<String, ConfigError> {
    if !text.contains("${") {
        return Ok(text.to_string());
    }

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(ConfigError::UnresolvedPlaceholder {
                key: after.to_string(),
            });
        };
        let key = &after[..end];
        match params.get(key) {
            Some(value) => result.push_str(value),
            None => {
                return Err(ConfigError::UnresolvedPlaceholder {
                    key: key.to_string(),
                });
            }
        }
        rest = &after[end + 1..];
    }
    result.push_str(rest);
    Ok(result)
}

// ============================================================================
// Templates
// ============================================================================

/// A parameter declared by a configuration template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParam {
    /// The placeholder key.
    pub name: String,
    /// Value used when the caller supplies none. `None` marks the
    /// parameter required.
    pub default: Option<String>,
}

/// A named configuration template: declared parameters plus a config body.
#[derive(Debug, Clone)]
pub struct ConfigTemplate {
    /// Registry identifier.
    pub id: String,
    /// Declared parameters.
    pub parameters: Vec<TemplateParam>,
    /// The `<config>` body, still holding placeholders.
    pub body: ConfigNode,
}

impl ConfigTemplate {
    /// Parse a `<template id="...">` document.
    pub fn parse(xml: &str) -> Result<Self, ConfigError> {
        let root = parse_config(xml)?;
        if root.name() != "template" {
            return Err(ConfigError::malformed(
                root.name(),
                "expected a <template> root element",
            ));
        }
        let id = root.require_attribute("id")?.to_string();

        let mut parameters = Vec::new();
        for param in root.children_by_name("param") {
            parameters.push(TemplateParam {
                name: param.require_attribute("name")?.to_string(),
                default: param.attribute("default").map(str::to_string),
            });
        }

        let body = root
            .child("config")
            .cloned()
            .ok_or_else(|| ConfigError::malformed("template", "missing <config> body"))?;

        Ok(Self {
            id,
            parameters,
            body,
        })
    }

    /// Fill the parameter map with defaults and check that every declared
    /// parameter has a value, then substitute over the body.
    pub fn resolve(
        &self,
        supplied: &HashMap<String, String>,
    ) -> Result<ConfigNode, ConfigError> {
        let mut params = supplied.clone();
        for parameter in &self.parameters {
            if !params.contains_key(&parameter.name) {
                match &parameter.default {
                    Some(default) => {
                        params.insert(parameter.name.clone(), default.clone());
                    }
                    None => {
                        return Err(ConfigError::MissingParameter {
                            template: self.id.clone(),
                            name: parameter.name.clone(),
                        });
                    }
                }
            }
        }
        substitute(&self.body, &params)
    }
}

/// Registry of named configuration templates.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: RwLock<HashMap<String, Arc<ConfigTemplate>>>,
}

impl TemplateRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a `<template>` document. Returns the template id.
    pub fn register_str(&self, xml: &str) -> Result<String, ConfigError> {
        let template = ConfigTemplate::parse(xml)?;
        let id = template.id.clone();
        self.register(template);
        Ok(id)
    }

    /// Register an already-built template. Replaces any previous entry
    /// under the same id.
    pub fn register(&self, template: ConfigTemplate) {
        let id = template.id.clone();
        if self
            .templates
            .write()
            .insert(id.clone(), Arc::new(template))
            .is_some()
        {
            tracing::warn!(
                target: "helix_conduit_runtime::config",
                %id,
                "configuration template replaced"
            );
        }
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Option<Arc<ConfigTemplate>> {
        self.templates.read().get(id).cloned()
    }

    /// Resolve a template with the supplied parameters.
    pub fn resolve(
        &self,
        id: &str,
        params: &HashMap<String, String>,
    ) -> Result<ConfigNode, ConfigError> {
        let template = self
            .get(id)
            .ok_or_else(|| ConfigError::UnknownTemplate(id.to_string()))?;
        template.resolve(params)
    }
}

// ============================================================================
// Typed lowering
// ============================================================================

/// A `uid/key` endpoint reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRef {
    /// UID of the owning service or data object.
    pub uid: String,
    /// Signal or slot key on the owner.
    pub key: String,
}

impl EndpointRef {
    /// Parse the `uid/key` spelling.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        match text.split_once('/') {
            Some((uid, key)) if !uid.is_empty() && !key.is_empty() => Ok(Self {
                uid: uid.to_string(),
                key: key.to_string(),
            }),
            _ => Err(ConfigError::malformed(
                "connect",
                format!("endpoint '{text}' is not of the form uid/key"),
            )),
        }
    }
}

/// A declared data object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDecl {
    pub uid: String,
    pub kind: String,
}

/// A declared object binding on a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBinding {
    pub key: String,
    pub uid: String,
    pub access: AccessMode,
}

/// A declared service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDecl {
    pub uid: String,
    pub kind: String,
    /// Configure and start during launch.
    pub auto_start: bool,
    /// Run one update right after start.
    pub auto_update: bool,
    /// Name of the worker this service's slots are affined to.
    pub worker: Option<String>,
    pub bindings: Vec<ObjectBinding>,
    /// The service-private `<config>` subtree (empty node when absent).
    pub config: ConfigNode,
}

/// A declared channel: `<connect>` (anonymous allowed) or `<proxy>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDecl {
    /// Explicit channel key; `None` lets the launcher generate one.
    pub channel: Option<String>,
    pub signals: Vec<EndpointRef>,
    pub slots: Vec<EndpointRef>,
}

/// The typed configuration AST the launcher executes.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub objects: Vec<ObjectDecl>,
    pub services: Vec<ServiceDecl>,
    pub channels: Vec<ChannelDecl>,
}

impl AppConfig {
    /// Validate and lower a substituted `<config>` tree.
    ///
    /// All structural checking happens here: unknown access modes,
    /// missing attributes, duplicate UIDs, malformed endpoint references.
    pub fn lower(root: &ConfigNode) -> Result<Self, ConfigError> {
        if root.name() != "config" {
            return Err(ConfigError::malformed(
                root.name(),
                "expected a <config> root element",
            ));
        }

        let mut config = AppConfig::default();
        let mut seen_uids: Vec<String> = Vec::new();
        let mut claim_uid = |uid: &str, seen: &mut Vec<String>| -> Result<(), ConfigError> {
            if seen.iter().any(|existing| existing == uid) {
                return Err(ConfigError::DuplicateUid(uid.to_string()));
            }
            seen.push(uid.to_string());
            Ok(())
        };

        for child in root.children() {
            match child.name() {
                "object" => {
                    let uid = child.require_attribute("uid")?.to_string();
                    claim_uid(&uid, &mut seen_uids)?;
                    config.objects.push(ObjectDecl {
                        uid,
                        kind: child.require_attribute("type")?.to_string(),
                    });
                }
                "service" => {
                    let decl = Self::lower_service(child)?;
                    claim_uid(&decl.uid, &mut seen_uids)?;
                    config.services.push(decl);
                }
                "connect" => {
                    config.channels.push(Self::lower_channel(child, false)?);
                }
                "proxy" => {
                    config.channels.push(Self::lower_channel(child, true)?);
                }
                other => {
                    return Err(ConfigError::malformed(
                        "config",
                        format!("unexpected <{other}> element"),
                    ));
                }
            }
        }

        Ok(config)
    }

    fn lower_service(node: &ConfigNode) -> Result<ServiceDecl, ConfigError> {
        let uid = node.require_attribute("uid")?.to_string();
        let kind = node.require_attribute("type")?.to_string();
        let auto_start = Self::bool_attribute(node, "auto_start")?;
        let auto_update = Self::bool_attribute(node, "auto_update")?;
        let worker = node.attribute("worker").map(str::to_string);

        let mut bindings = Vec::new();
        let mut config = None;
        for child in node.children() {
            match child.name() {
                "in" | "inout" | "out" => {
                    let access = AccessMode::parse(child.name())
                        .expect("access mode names are matched above");
                    bindings.push(ObjectBinding {
                        key: child.require_attribute("key")?.to_string(),
                        uid: child.require_attribute("uid")?.to_string(),
                        access,
                    });
                }
                "config" => {
                    if config.replace(child.clone()).is_some() {
                        return Err(ConfigError::malformed(
                            "service",
                            format!("service '{uid}' declares more than one <config>"),
                        ));
                    }
                }
                other => {
                    return Err(ConfigError::malformed(
                        "service",
                        format!("unexpected <{other}> element in service '{uid}'"),
                    ));
                }
            }
        }

        Ok(ServiceDecl {
            uid,
            kind,
            auto_start,
            auto_update,
            worker,
            bindings,
            config: config.unwrap_or_else(|| ConfigNode::new("config")),
        })
    }

    fn lower_channel(node: &ConfigNode, named: bool) -> Result<ChannelDecl, ConfigError> {
        let channel = node.attribute("channel").map(str::to_string);
        if named && channel.is_none() {
            return Err(ConfigError::malformed(
                "proxy",
                "missing attribute 'channel'",
            ));
        }

        let mut signals = Vec::new();
        let mut slots = Vec::new();
        for child in node.children() {
            match child.name() {
                "signal" => signals.push(EndpointRef::parse(child.text())?),
                "slot" => slots.push(EndpointRef::parse(child.text())?),
                other => {
                    return Err(ConfigError::malformed(
                        node.name(),
                        format!("unexpected <{other}> element"),
                    ));
                }
            }
        }

        if signals.is_empty() && slots.is_empty() {
            return Err(ConfigError::malformed(
                node.name(),
                "declares neither signals nor slots",
            ));
        }

        Ok(ChannelDecl {
            channel,
            signals,
            slots,
        })
    }

    fn bool_attribute(node: &ConfigNode, name: &str) -> Result<bool, ConfigError> {
        match node.attribute(name) {
            None => Ok(false),
            Some("true") => Ok(true),
            Some("false") => Ok(false),
            Some(other) => Err(ConfigError::malformed(
                node.name(),
                format!("attribute '{name}' must be 'true' or 'false', got '{other}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWER: &str = r#"
        <config>
            <object uid="image" type="imaging::image"/>
            <service uid="reader" type="io::volume_reader" auto_start="true" auto_update="true" worker="io">
                <inout key="target" uid="image"/>
                <config path="/data/series.vtk"/>
            </service>
            <connect channel="image-modified">
                <signal>image/modified</signal>
                <slot>reader/refresh</slot>
            </connect>
            <proxy channel="status">
                <signal>reader/started</signal>
            </proxy>
        </config>
    "#;

    #[test]
    fn test_parse_nested_tree() {
        let root = parse_config(VIEWER).unwrap();
        assert_eq!(root.name(), "config");
        assert_eq!(root.children().len(), 4);

        let service = root.child("service").unwrap();
        assert_eq!(service.attribute("uid"), Some("reader"));
        assert_eq!(
            service.child("config").unwrap().attribute("path"),
            Some("/data/series.vtk")
        );

        let connect = root.child("connect").unwrap();
        assert_eq!(connect.child("signal").unwrap().text(), "image/modified");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_config("<config><object></config>"),
            Err(ConfigError::Xml(_))
        ));
        assert!(matches!(parse_config(""), Err(ConfigError::Xml(_))));
    }

    #[test]
    fn test_substitute_attributes_and_text() {
        let mut params = HashMap::new();
        params.insert("UID".to_string(), "negato".to_string());
        params.insert("KEY".to_string(), "update".to_string());

        let root = parse_config(
            r#"<config><connect><slot>${UID}/${KEY}</slot></connect></config>"#,
        )
        .unwrap();
        let substituted = substitute(&root, &params).unwrap();

        let slot = substituted.child("connect").unwrap().child("slot").unwrap();
        assert_eq!(slot.text(), "negato/update");
    }

    #[test]
    fn test_substitute_missing_key_fails() {
        let root = parse_config(r#"<config><object uid="${WHO}" type="t"/></config>"#).unwrap();
        let result = substitute(&root, &HashMap::new());
        assert!(matches!(
            result,
            Err(ConfigError::UnresolvedPlaceholder { key }) if key == "WHO"
        ));
    }

    #[test]
    fn test_substitute_leaves_plain_text_alone() {
        let root = parse_config(r#"<config><object uid="plain" type="t"/></config>"#).unwrap();
        let substituted = substitute(&root, &HashMap::new()).unwrap();
        assert_eq!(root, substituted);
    }

    #[test]
    fn test_lower_full_config() {
        let root = parse_config(VIEWER).unwrap();
        let config = AppConfig::lower(&root).unwrap();

        assert_eq!(config.objects.len(), 1);
        assert_eq!(config.objects[0].uid, "image");
        assert_eq!(config.objects[0].kind, "imaging::image");

        assert_eq!(config.services.len(), 1);
        let service = &config.services[0];
        assert_eq!(service.uid, "reader");
        assert!(service.auto_start);
        assert!(service.auto_update);
        assert_eq!(service.worker.as_deref(), Some("io"));
        assert_eq!(service.bindings.len(), 1);
        assert_eq!(service.bindings[0].access, AccessMode::InOut);
        assert_eq!(service.config.attribute("path"), Some("/data/series.vtk"));

        assert_eq!(config.channels.len(), 2);
        assert_eq!(config.channels[0].channel.as_deref(), Some("image-modified"));
        assert_eq!(
            config.channels[0].signals,
            vec![EndpointRef {
                uid: "image".to_string(),
                key: "modified".to_string()
            }]
        );
        assert_eq!(config.channels[1].channel.as_deref(), Some("status"));
    }

    #[test]
    fn test_lower_rejects_duplicate_uid() {
        let root = parse_config(
            r#"<config>
                <object uid="x" type="a"/>
                <service uid="x" type="b"/>
            </config>"#,
        )
        .unwrap();
        assert!(matches!(
            AppConfig::lower(&root),
            Err(ConfigError::DuplicateUid(uid)) if uid == "x"
        ));
    }

    #[test]
    fn test_lower_rejects_bad_bool() {
        let root = parse_config(r#"<config><service uid="s" type="t" auto_start="yes"/></config>"#)
            .unwrap();
        assert!(matches!(
            AppConfig::lower(&root),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_lower_rejects_bad_endpoint() {
        let root = parse_config(
            r#"<config><connect><signal>no-slash</signal></connect></config>"#,
        )
        .unwrap();
        assert!(matches!(
            AppConfig::lower(&root),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_lower_requires_proxy_channel() {
        let root = parse_config(
            r#"<config><proxy><signal>a/b</signal></proxy></config>"#,
        )
        .unwrap();
        assert!(matches!(
            AppConfig::lower(&root),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_template_defaults_and_required() {
        let registry = TemplateRegistry::new();
        let id = registry
            .register_str(
                r##"<template id="viewer">
                    <param name="TARGET"/>
                    <param name="BACKGROUND" default="#000000"/>
                    <config>
                        <object uid="${TARGET}" type="imaging::image"/>
                        <service uid="view" type="viz::negato" auto_start="true">
                            <config color="${BACKGROUND}"/>
                        </service>
                    </config>
                </template>"##,
            )
            .unwrap();
        assert_eq!(id, "viewer");

        // Missing required parameter fails.
        assert!(matches!(
            registry.resolve("viewer", &HashMap::new()),
            Err(ConfigError::MissingParameter { name, .. }) if name == "TARGET"
        ));

        // Supplied parameter + default fills in.
        let mut params = HashMap::new();
        params.insert("TARGET".to_string(), "ct-image".to_string());
        let resolved = registry.resolve("viewer", &params).unwrap();
        assert_eq!(
            resolved.child("object").unwrap().attribute("uid"),
            Some("ct-image")
        );
        assert_eq!(
            resolved
                .child("service")
                .unwrap()
                .child("config")
                .unwrap()
                .attribute("color"),
            Some("#000000")
        );
    }

    #[test]
    fn test_unknown_template() {
        let registry = TemplateRegistry::new();
        assert!(matches!(
            registry.resolve("ghost", &HashMap::new()),
            Err(ConfigError::UnknownTemplate(id)) if id == "ghost"
        ));
    }
}

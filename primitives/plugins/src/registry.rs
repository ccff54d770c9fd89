//! Plugin registry.
//!
//! The registry is the explicit resolution map the orchestrator's caller
//! builds: every available plugin is registered under its kind and name, and
//! configuration keys are resolved against it. There is no process-wide
//! registry and no dynamic loading.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::{
    Adapter, AnyPlugin, ApiStyle, Auth, Database, Deploy, Generator, Parser, Plugin,
    PluginKind, SourceInput,
};

/// Plugin registry for managing plugins
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<AnyPlugin>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self { Self { plugins: Vec::new() } }

    /// Register a plugin. A plugin of the same kind and name is replaced in
    /// place, keeping its original registration position.
    pub fn register(&mut self, plugin: AnyPlugin) -> &mut Self {
        let kind = plugin.kind();
        match self.plugins.iter_mut().find(|p| p.kind() == kind && p.name() == plugin.name()) {
            Some(existing) => {
                debug!(kind = %kind, name = plugin.name(), "replacing registered plugin");
                *existing = plugin;
            }
            None => {
                debug!(kind = %kind, name = plugin.name(), "registering plugin");
                self.plugins.push(plugin);
            }
        }
        self
    }

    /// Builder-style registration
    pub fn with(mut self, plugin: AnyPlugin) -> Self {
        self.register(plugin);
        self
    }

    /// Get a plugin by kind and name
    pub fn get(&self, kind: PluginKind, name: &str) -> Option<&AnyPlugin> {
        self.plugins.iter().find(|p| p.kind() == kind && p.name() == name)
    }

    /// All plugins of one kind in registration order
    pub fn of_kind(&self, kind: PluginKind) -> impl Iterator<Item = &AnyPlugin> {
        self.plugins.iter().filter(move |p| p.kind() == kind)
    }

    /// Names of all plugins of one kind
    pub fn names(&self, kind: PluginKind) -> Vec<&str> { self.of_kind(kind).map(|p| p.name()).collect() }

    /// Total number of registered plugins
    pub fn len(&self) -> usize { self.plugins.len() }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool { self.plugins.is_empty() }

    /// All parsers in registration order
    pub fn parsers(&self) -> Vec<Arc<dyn Parser>> {
        self.plugins
            .iter()
            .filter_map(|p| match p {
                AnyPlugin::Parser(parser) => Some(Arc::clone(parser)),
                _ => None,
            })
            .collect()
    }

    /// First parser that recognizes `path` (and `input`, when given).
    pub fn parser_for(&self, path: &Path, input: Option<&SourceInput>) -> Option<Arc<dyn Parser>> {
        let empty = SourceInput::Text(String::new());
        let input = input.unwrap_or(&empty);
        self.parsers().into_iter().find(|parser| parser.can_parse(input, Some(path)))
    }

    /// Generators producing `style`, in registration order
    pub fn generators_for(&self, style: ApiStyle) -> Vec<Arc<dyn Generator>> {
        self.plugins
            .iter()
            .filter_map(|p| match p {
                AnyPlugin::Generator(generator) if generator.style() == style => {
                    Some(Arc::clone(generator))
                }
                _ => None,
            })
            .collect()
    }

    /// Adapter for a framework, matched on framework or plugin name
    pub fn adapter(&self, framework: &str) -> Option<Arc<dyn Adapter>> {
        self.plugins.iter().find_map(|p| match p {
            AnyPlugin::Adapter(a) if a.framework() == framework || a.name() == framework => {
                Some(Arc::clone(a))
            }
            _ => None,
        })
    }

    /// Auth plugin for a strategy, matched on strategy or plugin name
    pub fn auth(&self, strategy: &str) -> Option<Arc<dyn Auth>> {
        self.plugins.iter().find_map(|p| match p {
            AnyPlugin::Auth(a) if a.strategy() == strategy || a.name() == strategy => {
                Some(Arc::clone(a))
            }
            _ => None,
        })
    }

    /// Database plugin for a library, matched on adapter or plugin name
    pub fn database(&self, adapter: &str) -> Option<Arc<dyn Database>> {
        self.plugins.iter().find_map(|p| match p {
            AnyPlugin::Database(d) if d.adapter() == adapter || d.name() == adapter => {
                Some(Arc::clone(d))
            }
            _ => None,
        })
    }

    /// Deploy plugin for a target, matched on target or plugin name
    pub fn deploy(&self, target: &str) -> Option<Arc<dyn Deploy>> {
        self.plugins.iter().find_map(|p| match p {
            AnyPlugin::Deploy(d) if d.target() == target || d.name() == target => {
                Some(Arc::clone(d))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testing::StubPlugin;

    #[test]
    fn test_register_and_lookup_by_kind() {
        let registry = PluginRegistry::new()
            .with(AnyPlugin::parser(StubPlugin::new("prisma").with_extensions(&["prisma"])))
            .with(AnyPlugin::generator(StubPlugin::new("rest")))
            .with(AnyPlugin::adapter(StubPlugin::new("express-adapter").with_tag("express")));

        assert_eq!(registry.len(), 3);
        assert!(registry.get(PluginKind::Parser, "prisma").is_some());
        assert!(registry.get(PluginKind::Generator, "prisma").is_none());
        assert_eq!(registry.names(PluginKind::Generator), vec!["rest"]);
        assert!(registry.adapter("express").is_some());
        assert!(registry.adapter("express-adapter").is_some());
        assert!(registry.adapter("fastify").is_none());
    }

    #[test]
    fn test_same_name_different_kind_coexist() {
        let registry = PluginRegistry::new()
            .with(AnyPlugin::auth(StubPlugin::new("jwt")))
            .with(AnyPlugin::generator(StubPlugin::new("jwt")));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_reregistering_replaces_in_place() {
        let registry = PluginRegistry::new()
            .with(AnyPlugin::generator(StubPlugin::new("a")))
            .with(AnyPlugin::generator(StubPlugin::new("b")))
            .with(AnyPlugin::generator(StubPlugin::new("a").with_priority(7)));

        assert_eq!(registry.names(PluginKind::Generator), vec!["a", "b"]);
        let generators = registry.generators_for(ApiStyle::Rest);
        assert_eq!(generators[0].priority(), 7);
    }

    #[test]
    fn test_generators_filtered_by_style() {
        let registry = PluginRegistry::new()
            .with(AnyPlugin::generator(StubPlugin::new("rest")))
            .with(AnyPlugin::generator(StubPlugin::new("gql").with_style(ApiStyle::Graphql)));

        assert_eq!(registry.generators_for(ApiStyle::Rest).len(), 1);
        assert_eq!(registry.generators_for(ApiStyle::Graphql)[0].name(), "gql");
        assert!(registry.generators_for(ApiStyle::Trpc).is_empty());
    }

    #[test]
    fn test_parser_for_matches_extension() {
        let registry = PluginRegistry::new()
            .with(AnyPlugin::parser(StubPlugin::new("openapi").with_extensions(&["yaml", "yml"])))
            .with(AnyPlugin::parser(StubPlugin::new("prisma").with_extensions(&["prisma"])));

        let found = registry.parser_for(&PathBuf::from("db/schema.prisma"), None);
        assert_eq!(found.map(|p| p.name().to_string()), Some("prisma".to_string()));
        assert!(registry.parser_for(&PathBuf::from("api.YML"), None).is_some());
        assert!(registry.parser_for(&PathBuf::from("schema.graphql"), None).is_none());
    }
}

//! Building an orchestrator from `apigen.toml` and a plugin registry.

use config::Config;
use plugins::PluginRegistry;
use tracing::warn;

use crate::Orchestrator;

impl Orchestrator {
    /// Select plugins named by `config` from `registry`.
    ///
    /// Names that do not resolve are returned as warnings rather than
    /// errors; `validate` still reports a missing parser or generator.
    pub fn from_config(config: &Config, registry: &PluginRegistry) -> (Self, Vec<String>) {
        let mut orchestrator =
            Orchestrator::new().merge_strategy(config.merge.strategy).strict(config.strict);
        let mut warnings = Vec::new();

        match registry.parser_for(&config.schema, None) {
            Some(parser) => orchestrator = orchestrator.parser(parser),
            None => warnings.push(format!("no parser recognizes `{}`", config.schema.display())),
        }

        for style in config.api.styles() {
            let generators = registry.generators_for(style);
            if generators.is_empty() {
                warnings.push(format!("no generator registered for the `{}` API style", style));
            }
            for generator in generators {
                orchestrator = orchestrator.generator(generator);
            }
        }

        if let Some(name) = &config.adapter {
            match registry.adapter(name) {
                Some(adapter) => orchestrator = orchestrator.adapter(adapter),
                None => warnings.push(format!("adapter `{}` is not registered", name)),
            }
        }

        for name in &config.auth {
            match registry.auth(name) {
                Some(auth) => orchestrator = orchestrator.auth(auth),
                None => warnings.push(format!("auth strategy `{}` is not registered", name)),
            }
        }

        if let Some(name) = &config.database {
            match registry.database(name) {
                Some(database) => orchestrator = orchestrator.database(database),
                None => warnings.push(format!("database adapter `{}` is not registered", name)),
            }
        }

        for name in &config.deploy {
            match registry.deploy(name) {
                Some(deploy) => orchestrator = orchestrator.deploy(deploy),
                None => warnings.push(format!("deploy target `{}` is not registered", name)),
            }
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        (orchestrator, warnings)
    }
}

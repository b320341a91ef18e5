//! Plugin load order.

use crate::config::PluginSpec;
use crate::error::{RuntimeError, RuntimeResult};
use crate::plugin::{PluginConfig, PluginType};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

struct Resolver<'c> {
    configured: &'c [PluginSpec],
    ordered: Vec<(PluginType, PluginConfig)>,
    done: HashSet<&'static str>,
    path: Vec<&'static str>,
}

impl<'c> Resolver<'c> {
    fn config_for(&self, id: &'static str) -> PluginConfig {
        let value = self
            .configured
            .iter()
            .rev()
            .find(|spec| spec.plugin.id == id)
            .map_or(Value::Null, |spec| spec.config.clone());
        PluginConfig::new(id, value)
    }

    fn visit(&mut self, plugin: PluginType) -> RuntimeResult<()> {
        if self.done.contains(plugin.id) {
            return Ok(());
        }
        if let Some(start) = self.path.iter().position(|id| *id == plugin.id) {
            let mut cycle: Vec<&str> = self.path[start..].to_vec();
            cycle.push(plugin.id);
            return Err(RuntimeError::DependencyCycle(cycle.join(" -> ")));
        }

        self.path.push(plugin.id);
        for dependency in (plugin.dependencies)() {
            self.visit(dependency)?;
        }
        self.path.pop();

        self.done.insert(plugin.id);
        let config = self.config_for(plugin.id);
        self.ordered.push((plugin, config));
        Ok(())
    }
}

/// Dependencies first, otherwise configuration order. Dependencies missing
/// from the configuration are added with an empty config.
pub fn resolve_order(configured: &[PluginSpec]) -> RuntimeResult<Vec<(PluginType, PluginConfig)>> {
    let mut resolver = Resolver {
        configured,
        ordered: Vec::new(),
        done: HashSet::new(),
        path: Vec::new(),
    };
    for spec in configured {
        resolver.visit(spec.plugin)?;
    }
    debug!(
        order = ?resolver.ordered.iter().map(|(plugin, _)| plugin.id).collect::<Vec<_>>(),
        "Resolved plugin order"
    );
    Ok(resolver.ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeResult;
    use crate::plugin::{Plugin, PluginDefinition};

    macro_rules! plugin {
        ($name:ident, $id:literal, [$($dep:ident),*]) => {
            struct $name;
            impl Plugin for $name {}
            impl PluginDefinition for $name {
                const ID: &'static str = $id;
                fn dependencies() -> Vec<PluginType> {
                    vec![$(PluginType::of::<$dep>()),*]
                }
                fn create(_config: &PluginConfig) -> RuntimeResult<Self> {
                    Ok($name)
                }
            }
        };
    }

    plugin!(Base, "base", []);
    plugin!(Middle, "middle", [Base]);
    plugin!(Top, "top", [Middle, Base]);
    plugin!(Ping, "ping", [Pong]);
    plugin!(Pong, "pong", [Ping]);

    fn ids(order: &[(PluginType, PluginConfig)]) -> Vec<&'static str> {
        order.iter().map(|(plugin, _)| plugin.id).collect()
    }

    #[test]
    fn test_dependencies_load_first_in_any_configured_order() {
        let forward = [PluginSpec::of::<Base>(), PluginSpec::of::<Top>()];
        let backward = [PluginSpec::of::<Top>(), PluginSpec::of::<Base>()];
        assert_eq!(ids(&resolve_order(&forward).unwrap()), ["base", "middle", "top"]);
        assert_eq!(ids(&resolve_order(&backward).unwrap()), ["base", "middle", "top"]);
    }

    #[test]
    fn test_auto_added_dependency_gets_empty_config() {
        let order = resolve_order(&[PluginSpec::of::<Middle>()]).unwrap();
        assert_eq!(ids(&order), ["base", "middle"]);
        assert!(order[0].1.value().is_null());
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let err = resolve_order(&[PluginSpec::of::<Ping>()]).unwrap_err();
        assert_eq!(err, RuntimeError::DependencyCycle("ping -> pong -> ping".to_string()));
    }
}

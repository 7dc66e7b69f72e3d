use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::discovery::{
    DEFAULT_LISTING_ARRAY_RATIO, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, DiscoveryLimits,
};
use crate::hints::FieldHintSchema;
use crate::metrics::Thresholds;
use crate::parse::images::DEFAULT_IMAGE_LIMIT;
use crate::registry::{MoneyUnit, PlatformAdapter};

pub const DEFAULT_MAX_SAMPLES: usize = 200;
pub const MIN_SAMPLES: usize = 20;
pub const MAX_FAILURE_SAMPLES: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub image_limit: usize,
    pub max_samples: usize,
    pub discovery: DiscoveryLimits,
    pub thresholds: Thresholds,
    pub prefer_deposit_first: bool,
    pub money_unit: MoneyUnit,
    pub field_hints: FieldHintSchema,
}

impl EngineConfig {
    pub fn for_adapter(adapter: &PlatformAdapter) -> Self {
        Self {
            image_limit: DEFAULT_IMAGE_LIMIT,
            max_samples: DEFAULT_MAX_SAMPLES,
            discovery: DiscoveryLimits {
                max_depth: DEFAULT_MAX_DEPTH,
                max_nodes: DEFAULT_MAX_NODES,
                listing_array_ratio: DEFAULT_LISTING_ARRAY_RATIO,
            },
            thresholds: Thresholds::default(),
            prefer_deposit_first: adapter.prefer_deposit_first,
            money_unit: adapter.money_unit,
            field_hints: adapter.field_hints.clone(),
        }
    }

    pub fn apply(&mut self, overrides: &EngineConfigOverrides) {
        if let Some(v) = overrides.image_limit {
            self.image_limit = v;
        }
        if let Some(v) = overrides.max_samples {
            self.max_samples = v;
        }
        if let Some(v) = overrides.max_depth {
            self.discovery.max_depth = v;
        }
        if let Some(v) = overrides.max_nodes {
            self.discovery.max_nodes = v;
        }
        if let Some(v) = overrides.listing_array_ratio {
            self.discovery.listing_array_ratio = v;
        }
        if let Some(v) = overrides.prefer_deposit_first {
            self.prefer_deposit_first = v;
        }
        if let Some(v) = overrides.money_unit {
            self.money_unit = v;
        }
        if let Some(thresholds) = &overrides.thresholds {
            if let Some(v) = thresholds.required_fields_rate {
                self.thresholds.required_fields_rate = v;
            }
            if let Some(v) = thresholds.image_valid_rate {
                self.thresholds.image_valid_rate = v;
            }
        }
        if let Some(extra) = &overrides.field_hints {
            self.field_hints.extend(extra);
        }
    }

    pub fn sample_cap(&self) -> usize {
        self.max_samples.max(MIN_SAMPLES)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOverrides {
    pub required_fields_rate: Option<f64>,
    pub image_valid_rate: Option<f64>,
}

/// YAML file layered over the registry defaults. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfigOverrides {
    pub image_limit: Option<usize>,
    pub max_samples: Option<usize>,
    pub max_depth: Option<usize>,
    pub max_nodes: Option<usize>,
    pub listing_array_ratio: Option<f64>,
    pub prefer_deposit_first: Option<bool>,
    pub money_unit: Option<MoneyUnit>,
    pub thresholds: Option<ThresholdOverrides>,
    /// Appended after the platform's own aliases.
    pub field_hints: Option<FieldHintSchema>,
}

impl EngineConfigOverrides {
    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parse config yaml: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hints::HintField;
    use crate::registry::Registry;

    #[test]
    fn yaml_overrides_layer_onto_adapter_defaults() -> anyhow::Result<()> {
        let registry = Registry::builtin();
        let adapter = registry.require("zigbang")?;
        let mut config = EngineConfig::for_adapter(adapter);
        assert!(config.prefer_deposit_first);

        let overrides: EngineConfigOverrides = serde_yaml::from_str(
            "image_limit: 8\n\
max_nodes: 500\n\
prefer_deposit_first: false\n\
thresholds:\n  required_fields_rate: 0.5\n\
field_hints:\n  rent:\n    - wolse\n",
        )?;
        config.apply(&overrides);

        assert_eq!(config.image_limit, 8);
        assert_eq!(config.discovery.max_nodes, 500);
        assert_eq!(config.discovery.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!config.prefer_deposit_first);
        assert_eq!(config.thresholds.required_fields_rate, 0.5);
        assert_eq!(config.thresholds.image_valid_rate, 0.9);
        let rent = config.field_hints.aliases(HintField::Rent);
        assert_eq!(rent.last().map(String::as_str), Some("wolse"));
        Ok(())
    }

    #[test]
    fn unknown_yaml_keys_are_rejected() {
        let parsed = serde_yaml::from_str::<EngineConfigOverrides>("max_nodez: 1\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn sample_cap_has_a_floor() -> anyhow::Result<()> {
        let registry = Registry::builtin();
        let mut config = EngineConfig::for_adapter(registry.require("generic")?);
        config.max_samples = 3;
        assert_eq!(config.sample_cap(), MIN_SAMPLES);
        Ok(())
    }
}

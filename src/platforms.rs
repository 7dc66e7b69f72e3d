use std::io::Write as _;

use anyhow::Context as _;
use serde::Serialize;

use crate::cli::PlatformsArgs;
use crate::hints::FieldHintSchema;
use crate::registry::{CollectionMode, MoneyUnit, Registry};

#[derive(Debug, Serialize)]
struct PlatformEntry<'a> {
    code: &'a str,
    name: &'a str,
    collection_mode: CollectionMode,
    notes: &'a str,
    prefer_deposit_first: bool,
    money_unit: MoneyUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_hints: Option<&'a FieldHintSchema>,
}

pub fn run(args: PlatformsArgs) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    let yaml = render(&registry, args.hints)?;
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(yaml.as_bytes())
        .context("write platforms to stdout")?;
    Ok(())
}

pub fn render(registry: &Registry, with_hints: bool) -> anyhow::Result<String> {
    let entries: Vec<PlatformEntry<'_>> = registry
        .iter()
        .map(|adapter| PlatformEntry {
            code: &adapter.code,
            name: &adapter.name,
            collection_mode: adapter.collection_mode,
            notes: &adapter.notes,
            prefer_deposit_first: adapter.prefer_deposit_first,
            money_unit: adapter.money_unit,
            field_hints: with_hints.then_some(&adapter.field_hints),
        })
        .collect();
    serde_yaml::to_string(&entries).context("serialize platforms yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_lists_every_platform() -> anyhow::Result<()> {
        let registry = Registry::builtin();
        let yaml = render(&registry, false)?;
        for code in ["generic", "zigbang", "dabang", "naver", "hogangnono"] {
            assert!(yaml.contains(&format!("code: {code}")), "code={code}");
        }
        assert!(yaml.contains("collection_mode: STEALTH_AUTOMATION"));
        assert!(!yaml.contains("field_hints"));
        Ok(())
    }

    #[test]
    fn render_with_hints_includes_aliases() -> anyhow::Result<()> {
        let registry = Registry::builtin();
        let yaml = render(&registry, true)?;
        assert!(yaml.contains("field_hints"));
        assert!(yaml.contains("atclNo"));
        Ok(())
    }
}

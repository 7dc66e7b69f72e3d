use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::NormalizeArgs;
use crate::config::{EngineConfig, EngineConfigOverrides};
use crate::engine::{NormalizeOptions, Normalizer};
use crate::formats::RunResult;
use crate::registry::Registry;

pub fn run(args: NormalizeArgs) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    let adapter = registry.require(&args.platform)?;

    let mut config = EngineConfig::for_adapter(adapter);
    if let Some(path) = &args.config {
        let overrides = EngineConfigOverrides::from_yaml_file(Path::new(path))?;
        config.apply(&overrides);
    }
    config.apply(&EngineConfigOverrides {
        image_limit: args.image_limit,
        max_samples: args.max_samples,
        ..EngineConfigOverrides::default()
    });

    let out_path = args.out.as_ref().map(PathBuf::from);
    let items_path = args.items_jsonl.as_ref().map(PathBuf::from);
    for path in out_path.iter().chain(items_path.iter()) {
        if path.exists() && !args.force {
            anyhow::bail!("output already exists: {} (use --force)", path.display());
        }
    }

    let options = NormalizeOptions {
        max_items: args.max_items,
        include_raw: args.include_raw,
    };
    let input = PathBuf::from(&args.input);
    let result = Normalizer::new(adapter, config)
        .normalize(&input, &options)
        .with_context(|| format!("normalize {}", input.display()))?;

    match &out_path {
        Some(path) => {
            let file = create_output(path, args.force)?;
            write_manifest(BufWriter::new(file), &result)
                .with_context(|| format!("write manifest: {}", path.display()))?;
        }
        None => {
            write_manifest(std::io::stdout().lock(), &result).context("write manifest to stdout")?;
        }
    }

    if let Some(path) = &items_path {
        let file = create_output(path, args.force)?;
        write_items_jsonl(BufWriter::new(file), &result)
            .with_context(|| format!("write items jsonl: {}", path.display()))?;
    }

    Ok(())
}

fn create_output(path: &Path, force: bool) -> anyhow::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    options
        .open(path)
        .with_context(|| format!("create output: {}", path.display()))
}

pub fn write_manifest(mut out: impl std::io::Write, result: &RunResult) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, result).context("serialize manifest")?;
    out.write_all(b"\n").context("write newline")?;
    out.flush().context("flush manifest")?;
    Ok(())
}

pub fn write_items_jsonl(mut out: impl std::io::Write, result: &RunResult) -> anyhow::Result<()> {
    for item in &result.items {
        serde_json::to_writer(&mut out, item).context("serialize item")?;
        out.write_all(b"\n").context("write newline")?;
    }
    out.flush().context("flush items")?;
    Ok(())
}

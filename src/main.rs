//! Retrobooth CLI - apply retro recipes to photos from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use retrobooth::config::AppConfig;
use retrobooth::export::{export, ExportFormat};
use retrobooth::import::{collect_inputs, load_path};
use retrobooth::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "retrobooth", version, about = "Retro photo filters")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available recipes
    List,

    /// Show a recipe's parameters
    Info {
        /// Recipe id, e.g. caramel_fade
        recipe: String,
    },

    /// Apply a recipe to photos and write the results
    Apply {
        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Recipe id (defaults to the configured recipe)
        #[arg(short, long)]
        recipe: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "retrobooth-out")]
        out: PathBuf,

        /// Parameter override as name=value, repeatable
        #[arg(short, long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Fixed grain seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format: png or jpg
        #[arg(short, long, default_value = "png")]
        format: String,
    },
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retrobooth")
        .join("config.toml")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let registry = RecipeRegistry::with_builtins();
    config.validate(&registry)?;

    match cli.command {
        Commands::List => list_recipes(&registry),
        Commands::Info { recipe } => recipe_info(&registry, &recipe)?,
        Commands::Apply {
            inputs,
            recipe,
            out,
            params,
            seed,
            format,
        } => {
            let recipe = recipe.unwrap_or_else(|| config.render.default_recipe.clone());
            let options = RenderOptions {
                seed: seed.or(config.render.seed),
            };
            apply(
                &registry,
                &config,
                ApplyArgs {
                    inputs: &inputs,
                    recipe: &recipe,
                    out: &out,
                    params: &params,
                    options,
                    format: ExportFormat::parse(&format)?,
                },
            )?;
        }
    }
    Ok(())
}

fn list_recipes(registry: &RecipeRegistry) {
    println!("🎞️  Retrobooth v{}", retrobooth::VERSION);
    println!("Available recipes ({} total):", registry.len());
    println!();

    for (category, recipes) in registry.grouped_by_category() {
        println!("  📁 {}", category.display_name());
        for metadata in recipes {
            println!("      • {} - {}", metadata.id, metadata.description);
        }
        println!();
    }
}

fn recipe_info(registry: &RecipeRegistry, id: &str) -> Result<()> {
    let Some(metadata) = registry.metadata(id) else {
        let error = ValidationError::UnknownRecipe(id.to_string());
        if let Some(fix) = error.suggested_fix() {
            eprintln!("{}", fix);
        }
        bail!(error);
    };

    println!("Recipe: {}", metadata.name);
    println!("ID: {}", metadata.id);
    println!("Category: {}", metadata.category.display_name());
    if !metadata.deterministic {
        println!("Uses procedural grain: output varies unless --seed is given");
    }
    println!();
    println!("Description:");
    println!("  {}", metadata.description);
    if !metadata.tags.is_empty() {
        println!("Tags: {}", metadata.tags.join(", "));
    }
    println!();

    println!("Parameters:");
    for param in &metadata.parameters {
        let range = param
            .range()
            .map(|(min, max)| format!(" [{} .. {}]", min, max))
            .unwrap_or_default();
        println!(
            "  • {} = {:?}{}",
            param.name, param.default_value, range
        );
        if !param.description.is_empty() {
            println!("    {}", param.description);
        }
    }
    Ok(())
}

struct ApplyArgs<'a> {
    inputs: &'a [PathBuf],
    recipe: &'a str,
    out: &'a Path,
    params: &'a [String],
    options: RenderOptions,
    format: ExportFormat,
}

/// `<index>-<stem>-<recipe>.<ext>`, 1-based so inputs sharing a stem stay apart.
fn output_name(index: usize, path: &Path, recipe: &str, format: ExportFormat) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "photo".to_string());
    format!("{:02}-{}-{}.{}", index + 1, stem, recipe, format.extension())
}

fn apply(registry: &RecipeRegistry, config: &AppConfig, args: ApplyArgs<'_>) -> Result<()> {
    let recipe = registry.require(args.recipe).map_err(|error| {
        if let Some(fix) = error.suggested_fix() {
            eprintln!("{}", fix);
        }
        error
    })?;

    let mut overrides = ParameterSet::new();
    for assignment in args.params {
        overrides.parse_assignment(assignment)?;
    }
    // Overrides are checked once, before any photo is loaded.
    recipe.metadata().resolve(&overrides)?;

    let files = collect_inputs(args.inputs);
    if files.is_empty() {
        bail!("No images found in the given inputs");
    }
    std::fs::create_dir_all(args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    println!(
        "⚙️  Applying '{}' to {} photos -> {}",
        args.recipe,
        files.len(),
        args.out.display()
    );

    let engine = RenderEngine::with_options(args.options.clone());
    let target_width = config.import.target_width;

    let results: Vec<Result<PathBuf>> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| -> Result<PathBuf> {
            let source = load_path(path, target_width).map_err(|error| {
                log::warn!("{}", error);
                anyhow::anyhow!("{}: {}", path.display(), error.notice())
            })?;
            let output = engine
                .render_with_report(Some(&source), recipe.as_ref(), &overrides)
                .with_context(|| format!("rendering {}", path.display()))?;
            for fallback in &output.report.fallbacks {
                println!(
                    "⚠️  {}: skipped '{}' ({})",
                    path.display(),
                    fallback.stage,
                    fallback.reason
                );
            }

            let target = args
                .out
                .join(output_name(index, path, args.recipe, args.format));
            export(&output.bitmap, &target, args.format)?;
            Ok(target)
        })
        .collect();

    let mut failed = 0;
    for result in results {
        match result {
            Ok(path) => println!("   • {}", path.display()),
            Err(error) => {
                failed += 1;
                eprintln!("❌ {}", error);
            }
        }
    }

    let stats = engine.stats();
    println!(
        "✅ {} rendered, {} failed in {:?}",
        stats.renders, failed, stats.total_duration
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_distinct_for_shared_stem() {
        let first = output_name(0, Path::new("a/x.jpg"), "caramel_fade", ExportFormat::Png);
        let second = output_name(1, Path::new("b/x.png"), "caramel_fade", ExportFormat::Png);
        assert_eq!(first, "01-x-caramel_fade.png");
        assert_eq!(second, "02-x-caramel_fade.png");
        assert_ne!(first, second);
    }

    #[test]
    fn test_output_name_without_stem() {
        let name = output_name(9, Path::new(""), "retro_pixel", ExportFormat::Jpeg { quality: 90 });
        assert_eq!(name, "10-photo-retro_pixel.jpg");
    }
}

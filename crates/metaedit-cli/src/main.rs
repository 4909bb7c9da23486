//! Metaedit CLI
//!
//! Inspect container definitions from the command line:
//! - list the compiled palettes of a container
//! - resolve the palette (and visible fields) for a record
//! - print the record hierarchy of a JSON data set
//! - look up the structural parent of a record

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use metaedit_model::{FetchConfig, Model, ModelId, ProviderRegistry, Record};
use metaedit_relations::{ContainerDefinition, ContainerMode, ModelCollector};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

mod data;

#[derive(Parser)]
#[command(name = "metaedit")]
#[command(author, version, about = "Metaedit: palettes and record relationships")]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List palettes with their conditions and legends
    Palettes {
        /// Container definition (JSON)
        container: PathBuf,
    },

    /// Select the palette for a record and print its visible fields
    Resolve {
        /// Container definition (JSON)
        container: PathBuf,

        /// Committed record values, as a JSON object
        #[arg(long)]
        record: String,

        /// Pending input values, as a JSON object
        #[arg(long)]
        input: Option<String>,
    },

    /// Print the record hierarchy of a data set
    Tree {
        /// Container definition (JSON)
        container: PathBuf,

        /// Data set: `{"<provider>": [<record>, ...]}`
        #[arg(long)]
        data: PathBuf,

        /// Property shown next to each record id
        #[arg(long, default_value = "title")]
        label: String,
    },

    /// Print the structural parent of a record
    Parent {
        /// Container definition (JSON)
        container: PathBuf,

        /// Data set: `{"<provider>": [<record>, ...]}`
        #[arg(long)]
        data: PathBuf,

        /// Record id, e.g. `tl_page::3`
        model_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Palettes { container } => cmd_palettes(&container),
        Commands::Resolve {
            container,
            record,
            input,
        } => cmd_resolve(&container, &record, input.as_deref()),
        Commands::Tree {
            container,
            data,
            label,
        } => cmd_tree(&container, &data, &label),
        Commands::Parent {
            container,
            data,
            model_id,
        } => cmd_parent(&container, &data, &model_id),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_container(path: &Path) -> Result<ContainerDefinition> {
    ContainerDefinition::from_path(path)
        .with_context(|| format!("loading container definition {}", path.display()))
}

fn cmd_palettes(container: &Path) -> Result<()> {
    let definition = load_container(container)?;
    println!(
        "{} {} ({})",
        "Container".green().bold(),
        definition.name(),
        definition.basic().mode
    );

    let palettes = definition.palettes();
    if palettes.is_empty() {
        println!("  {}", "no palettes".dimmed());
        return Ok(());
    }

    for palette in palettes.palettes() {
        println!();
        println!("{} {}", "Palette".cyan().bold(), palette.name().bold());
        println!("  {} {}", "when".dimmed(), palette.condition());
        for legend in palette.legends() {
            let hidden = if legend.is_initially_visible() {
                String::new()
            } else {
                format!(" {}", "(hidden)".dimmed())
            };
            println!("  {}{}", legend.name().yellow(), hidden);
            for property in legend.properties() {
                match property.visible_condition() {
                    Some(condition) => {
                        println!("    - {} {} {}", property.name(), "if".dimmed(), condition)
                    }
                    None => println!("    - {}", property.name()),
                }
            }
        }
    }
    Ok(())
}

fn cmd_resolve(container: &Path, record: &str, input: Option<&str>) -> Result<()> {
    let definition = load_container(container)?;
    let record = data::parse_record(&definition.basic().data_provider, record)?;
    let input = input.map(data::parse_input).transpose()?;
    let record: &dyn Record = &record;

    let palette = definition
        .palettes()
        .find_palette(Some(record), input.as_ref())
        .context("resolving palette")?;

    println!("{} {}", "Palette".green().bold(), palette.name().bold());
    for legend in palette.legends() {
        let visible = legend.visible_properties(Some(record), input.as_ref());
        if visible.is_empty() {
            continue;
        }
        println!("  {}", legend.name().yellow());
        for property in visible {
            let editable = if property.is_editable(Some(record), input.as_ref()) {
                ""
            } else {
                " (read-only)"
            };
            println!("    - {}{}", property.name(), editable.dimmed());
        }
    }
    Ok(())
}

fn cmd_tree(container: &Path, data: &Path, label: &str) -> Result<()> {
    let definition = load_container(container)?;
    let providers = data::load_data_set(data)?;
    let collector = ModelCollector::new(&definition, &providers);

    println!(
        "{} {} ({})",
        "Tree".green().bold(),
        definition.name(),
        definition.basic().mode
    );

    let tops = top_level_records(&definition, &providers, &collector)?;
    if tops.is_empty() {
        println!("  {}", "no records".dimmed());
    }

    let mut visited = BTreeSet::new();
    for top in &tops {
        print_subtree(&collector, top, label, 1, &mut visited)?;
    }
    Ok(())
}

/// Records printed at the first level of the tree.
fn top_level_records(
    definition: &ContainerDefinition,
    providers: &ProviderRegistry,
    collector: &ModelCollector<'_>,
) -> Result<Vec<Model>> {
    let basic = definition.basic();
    if basic.mode == ContainerMode::ParentedList {
        let parent_provider = basic
            .parent_data_provider
            .as_deref()
            .ok_or_else(|| anyhow!("parented container has no parent data provider"))?;
        return Ok(providers.get(parent_provider)?.fetch_all(&FetchConfig::default())?);
    }

    let mut tops = Vec::new();
    for id in collector.collect_root_ids()? {
        if let Some(model) = collector.get_model(&id)? {
            tops.push(model);
        }
    }
    Ok(tops)
}

fn print_subtree(
    collector: &ModelCollector<'_>,
    model: &Model,
    label: &str,
    depth: usize,
    visited: &mut BTreeSet<ModelId>,
) -> Result<()> {
    let indent = "  ".repeat(depth);
    let Some(id) = model.model_id() else {
        println!("{indent}{}", "<record without id>".dimmed());
        return Ok(());
    };

    let text = match model.property(label) {
        Some(serde_json::Value::String(s)) => format!(" {s}"),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => format!(" {other}"),
    };

    if !visited.insert(id.clone()) {
        println!("{indent}{}{} {}", id.to_string().bold(), text, "(cycle)".red());
        return Ok(());
    }
    println!("{indent}{}{}", id.to_string().bold(), text);

    for child in collector.collect_children_of(model, None)? {
        print_subtree(collector, &child, label, depth + 1, visited)?;
    }
    Ok(())
}

fn cmd_parent(container: &Path, data: &Path, model_id: &str) -> Result<()> {
    let definition = load_container(container)?;
    let providers = data::load_data_set(data)?;
    let collector = ModelCollector::new(&definition, &providers);

    let model = collector
        .get_model_from_serialized(model_id)
        .with_context(|| format!("looking up {model_id}"))?
        .ok_or_else(|| anyhow!("record {model_id} not found"))?;

    if collector.manager().is_root(&model) {
        println!("{} {}", model_id.bold(), "is a root record".cyan());
        return Ok(());
    }

    match collector.search_parent_of(&model)? {
        Some(parent) => {
            let parent_id = parent
                .model_id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<record without id>".to_string());
            println!("{} {} {}", model_id.bold(), "→".green(), parent_id.bold());
        }
        None => println!("{} {}", model_id.bold(), "has no parent".yellow()),
    }
    Ok(())
}

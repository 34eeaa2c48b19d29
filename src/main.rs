//! Pomforge CLI entry point

use clap::Parser;
use pomforge::commands::{Cli, Commands};
use pomforge::{
    plan_add_module, plan_restrict, plan_set_version, restore_pruned, ClosureEngine, Ga,
    ProfileSelection, RemovalStrategy, Resolver, Result, SelfClosingStyle, SourceTree,
    WildcardSet,
};
use std::path::Path;
use std::process;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    pomforge::logging::init()?;
    let cli = Cli::parse();

    let selection = cli
        .profiles
        .as_deref()
        .map(ProfileSelection::parse)
        .unwrap_or_default();
    let style: SelfClosingStyle = cli.self_closing.parse()?;
    let root = Path::new(&cli.dir);

    match &cli.command {
        Commands::List => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let resolver = Resolver::new(&tree, selection.clone());
            if cli.json {
                let rows: Vec<serde_json::Value> = tree
                    .modules()
                    .iter()
                    .map(|m| {
                        let gav = resolver.resolve_gav(m)?;
                        Ok(serde_json::json!({
                            "path": m.path,
                            "coordinates": gav.to_string(),
                        }))
                    })
                    .collect::<Result<_>>()?;
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for module in tree.modules() {
                    let gav = resolver.resolve_gav(module)?;
                    println!("{}\t{}", module.path, gav);
                }
            }
        }

        Commands::Closure { seeds } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let engine = ClosureEngine::new(&tree, selection.clone());
            let closure = engine.required_modules(&parse_gas(seeds)?)?;
            print_gas(&closure, cli.json)?;
        }

        Commands::Complement { seeds } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let engine = ClosureEngine::new(&tree, selection.clone());
            let closure = engine.required_modules(&parse_gas(seeds)?)?;
            print_gas(&engine.complement(&closure), cli.json)?;
        }

        Commands::Deps { ga, transitive } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let engine = ClosureEngine::new(&tree, selection.clone());
            let ga: Ga = ga.parse()?;
            let deps = if *transitive {
                engine.collect_transitive_dependencies(&ga)?
            } else {
                engine.collect_own_dependencies(&ga)?
            };
            if cli.json {
                let rows: Vec<String> = deps.iter().map(|d| d.to_string()).collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for dep in deps {
                    println!("{}", dep);
                }
            }
        }

        Commands::Filter { patterns } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let engine = ClosureEngine::new(&tree, selection.clone());
            let set = WildcardSet::parse(patterns)?;
            print_gas(&engine.filter_dependencies(&set)?, cli.json)?;
        }

        Commands::SetVersion { version } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let resolver = Resolver::new(&tree, selection.clone());
            let edits = plan_set_version(&tree, &resolver, version)?;
            let report = pomforge::apply_edit_set(tree.root_dir(), &edits, style)?;
            print_report(&report, cli.json)?;
        }

        Commands::Restrict { seeds, tag } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let engine = ClosureEngine::new(&tree, selection.clone());
            let required = engine
                .required_modules(&parse_gas(seeds)?)?
                .into_iter()
                .collect();
            let strategy = match tag {
                Some(tag) => RemovalStrategy::CommentOut { tag: tag.clone() },
                None => RemovalStrategy::Delete,
            };
            let edits = plan_restrict(&tree, &required, &strategy)?;
            let report = pomforge::apply_edit_set(tree.root_dir(), &edits, style)?;
            print_report(&report, cli.json)?;
        }

        Commands::Restore { tag } => {
            let (tree, report) = restore_pruned(root, &cli.manifest, &selection, tag, style)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "changed": report.changed,
                        "modules": tree.modules().len(),
                    }))?
                );
            } else {
                for file in &report.changed {
                    println!("restored links in {}", file);
                }
                println!("{} modules in tree", tree.modules().len());
            }
        }

        Commands::AddModule { link } => {
            let tree = SourceTree::load_with(root, &cli.manifest, &selection)?;
            let edits = plan_add_module(tree.root(), link);
            let report = pomforge::apply_edit_set(tree.root_dir(), &edits, style)?;
            print_report(&report, cli.json)?;
        }
    }

    Ok(())
}

fn parse_gas(spec: &str) -> Result<Vec<Ga>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn print_gas(gas: &[Ga], json: bool) -> Result<()> {
    if json {
        let rows: Vec<String> = gas.iter().map(Ga::to_string).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for ga in gas {
            println!("{}", ga);
        }
    }
    Ok(())
}

fn print_report(report: &pomforge::edit::ApplyReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for file in &report.changed {
            println!("updated {}", file);
        }
        if report.changed.is_empty() {
            println!("nothing to change");
        }
    }
    Ok(())
}

//! Novelist - Main Entry Point
//!
//! Command line front end for the `novelist` library: create, inspect,
//! repair and back up writing projects.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use novelist::project::word_totals;
use novelist::{AppConfig, CustomLayout, ItemClass, NewProjectData, NovelProject, Population};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Novelist - project tree and persistence tool for novel writing projects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new project
    New {
        /// Folder for the new project
        path: PathBuf,
        /// Project name
        #[arg(long, default_value = "New Project")]
        name: String,
        /// Book title
        #[arg(long, default_value = "")]
        title: String,
        /// Author name, may be repeated
        #[arg(long = "author")]
        authors: Vec<String>,
        /// Copy the sample project
        #[arg(long, conflicts_with_all = ["chapters", "scenes", "roots"])]
        sample: bool,
        /// Number of chapters in a custom layout
        #[arg(long)]
        chapters: Option<usize>,
        /// Number of scenes (per chapter) in a custom layout
        #[arg(long)]
        scenes: Option<usize>,
        /// Put each chapter in its own folder
        #[arg(long)]
        chapter_folders: bool,
        /// Extra root classes, e.g. plot,character,timeline
        #[arg(long, value_delimiter = ',', value_parser = parse_class)]
        roots: Vec<ItemClass>,
    },
    /// Show a summary of a project
    Info {
        path: PathBuf,
        /// Open even if the project is locked
        #[arg(long)]
        force: bool,
    },
    /// Open, repair and save a project (migration and orphan recovery)
    Check {
        path: PathBuf,
        /// Open even if the project is locked
        #[arg(long)]
        force: bool,
    },
    /// Write a backup archive of a project
    Backup {
        path: PathBuf,
        /// Backup destination, overriding the configuration
        #[arg(long)]
        to: Option<PathBuf>,
        /// Open even if the project is locked
        #[arg(long)]
        force: bool,
    },
    /// Check words against the dictionary
    Spell {
        words: Vec<String>,
        /// Dictionary language
        #[arg(long)]
        lang: Option<String>,
    },
}

fn parse_class(value: &str) -> Result<ItemClass, String> {
    value.trim().to_uppercase().parse()
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Check if no arguments were provided (except the program name)
    if std::env::args().len() == 1 {
        let mut cmd = Args::command();
        cmd.print_help().ok();
        println!();
        std::process::exit(2);
    }

    let args = Args::parse();
    init_logging(args.verbose);
    let config = AppConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::New {
            path,
            name,
            title,
            authors,
            sample,
            chapters,
            scenes,
            chapter_folders,
            roots,
        } => {
            let populate = if sample {
                Population::Sample
            } else if chapters.is_some() || scenes.is_some() || !roots.is_empty() {
                Population::Custom(CustomLayout {
                    add_roots: roots,
                    num_chapters: chapters.unwrap_or(0),
                    num_scenes: scenes.unwrap_or(0),
                    chapter_folders,
                })
            } else {
                Population::Minimal
            };
            let mut project = NovelProject::new(config);
            project
                .new_project(NewProjectData {
                    name,
                    title,
                    authors: authors.join("\n"),
                    path: Some(path.clone()),
                    populate,
                })
                .with_context(|| format!("Failed to create project in {}", path.display()))?;
            println!("Created project with {} items", project.tree().len());
            project.close_project()?;
        }
        Command::Info { path, force } => {
            let project = open(config, &path, force)?;
            let (novel, notes) = word_totals(project.tree());
            println!("Name:     {}", project.project_name());
            println!("Title:    {}", project.book_title());
            println!("Authors:  {}", project.book_authors().join(", "));
            println!("Items:    {}", project.tree().len());
            println!("Words:    {} novel, {} notes", novel, notes);
            println!("Saved:    {} times", project.index_meta().save_count);
            close(project)?;
        }
        Command::Check { path, force } => {
            let mut project = open(config, &path, force)?;
            project.save_project().context("Failed to save project")?;
            println!("Project checked, {} items", project.tree().len());
            close(project)?;
        }
        Command::Backup { path, to, force } => {
            let mut config = config;
            if to.is_some() {
                config.backup_path = to;
            }
            let project = open(config, &path, force)?;
            let archive = project.zip_it(true).context("Backup failed")?;
            println!("Backup written to {}", archive.display());
            close(project)?;
        }
        Command::Spell { words, lang } => {
            let mut checker = novelist::spellcheck::select_backend(&config.dict_path);
            let lang = lang.unwrap_or_else(|| config.spell_language.clone());
            checker.set_language(&lang, None);
            for word in words {
                if checker.check_word(&word) {
                    println!("{}: ok", word);
                } else {
                    println!("{}: {}", word, checker.suggest_words(&word).join(", "));
                }
            }
        }
    }
    Ok(())
}

fn open(config: AppConfig, path: &Path, force: bool) -> Result<NovelProject> {
    let mut project = NovelProject::new(config);
    project
        .open_project(path, force)
        .with_context(|| format!("Failed to open project {}", path.display()))?;
    Ok(project)
}

fn close(mut project: NovelProject) -> Result<()> {
    project.close_project().context("Failed to close project")
}

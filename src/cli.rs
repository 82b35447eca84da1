use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use buildlens::build::BuildSource;
use buildlens::clock::SystemClock;
use buildlens::config::{Config, SearchConfig};
use buildlens::locale::Locale;
use buildlens::output;
use buildlens::report::{DeltaReport, SearchReport, SuggestionReport, TreeReport};
use buildlens::search::SearchEngine;
use buildlens::snapshot::BuildSnapshot;
use buildlens::tree::{
    BuildTree, BuildsDelta, GroupingSpec, PartialSucceededTreatmentMode, TreeBuilder,
};

#[derive(Parser)]
#[command(name = "buildlens")]
#[command(author, version, about = "Build tree, status change and search tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./buildlens.toml and friends)
    #[arg(short, long, global = true, env = "BUILDLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Write JSON to this file instead of printing tables
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,

    /// Keyword and date language, overrides the configuration
    #[arg(short, long, global = true)]
    locale: Option<Locale>,
}

#[derive(Subcommand)]
enum Commands {
    /// Arrange builds into a tree
    Tree {
        /// JSON or YAML file with the builds
        builds: PathBuf,

        /// Comma separated dimensions, e.g. "source,branch,definition"
        #[arg(short, long)]
        grouping: Option<GroupingSpec>,

        /// Builds of an earlier refresh; the new tree is merged into their tree
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Only keep builds matching this search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List builds that changed into a terminal status between two refreshes
    Delta {
        /// Builds of the earlier refresh
        previous: PathBuf,

        /// Builds of the later refresh
        current: PathBuf,

        /// treat-as-succeeded, treat-as-failed or ignore
        #[arg(long)]
        partial: Option<PartialSucceededTreatmentMode>,
    },
    /// Show how a search is parsed and which builds it matches
    Search {
        builds: PathBuf,

        query: String,
    },
    /// Autocomplete the end of a search
    Suggest {
        builds: PathBuf,

        #[arg(default_value = "")]
        text: String,
    },
}

impl Cli {
    fn execute_tree(
        &self,
        config: &Config,
        builds: &Path,
        grouping: Option<&GroupingSpec>,
        previous: Option<&Path>,
        search: Option<&str>,
    ) -> Result<()> {
        let grouping = grouping.unwrap_or(&config.tree.grouping).clone();
        info!("Arranging builds by [{}]", grouping);

        let builder = TreeBuilder::new(grouping);
        let mut tree = build_tree(&builder, builds)?;

        if let Some(previous) = previous {
            let fresh = tree;
            tree = build_tree(&builder, previous)?;
            let summary = tree.merge(fresh);
            info!(
                "Merged into previous tree: {} retained, {} inserted, {} removed",
                summary.retained, summary.inserted, summary.removed
            );
        }

        if let Some(query) = search {
            let engine = self.search_engine(&config.search);
            tree = tree.filtered(&engine.parse(query));
        }

        self.emit(&TreeReport::new(&tree), output::print_tree)
    }

    fn execute_delta(
        &self,
        config: &Config,
        previous: &Path,
        current: &Path,
        partial: Option<PartialSucceededTreatmentMode>,
    ) -> Result<()> {
        let mode = partial.unwrap_or(config.notifications.partial_succeeded_treatment);
        let builder = TreeBuilder::new(config.tree.grouping.clone());

        let snapshot = build_tree(&builder, previous)?.status_snapshot();
        let tree = build_tree(&builder, current)?;
        let delta = BuildsDelta::between(&tree, &snapshot, mode);
        info!("{} builds changed into a terminal status", delta.len());

        self.emit(&DeltaReport::new(&delta, mode), output::print_delta)
    }

    fn execute_search(&self, config: &Config, builds: &Path, query: &str) -> Result<()> {
        let cache = load_snapshot(builds)?.into_cache();
        let engine = self.search_engine(&config.search);
        engine.refresh_caches(&cache);

        let search = engine.parse(query);
        let report = SearchReport::new(&search, cache.cached_builds(), engine.locale());
        info!(
            "{} of {} builds match '{}'",
            report.matched.len(),
            report.total_builds,
            query
        );

        self.emit(&report, output::print_search)
    }

    fn execute_suggest(&self, config: &Config, builds: &Path, text: &str) -> Result<()> {
        let cache = load_snapshot(builds)?.into_cache();
        let engine = self.search_engine(&config.search);
        engine.refresh_caches(&cache);

        let suggestions: Vec<SuggestionReport> = engine
            .suggest(text)
            .iter()
            .map(SuggestionReport::from)
            .collect();

        self.emit(&suggestions, |s| output::print_suggestions(s))
    }

    fn search_engine(&self, config: &SearchConfig) -> SearchEngine {
        let locale = self.locale.unwrap_or(config.locale);
        let mut engine = SearchEngine::new(locale)
            .with_limits(config.max_suggestions, config.suggestions_per_criteria);
        engine.register_defaults(Rc::new(SystemClock), config.max_dates_to_suggest);
        engine.set_parsed_observer(|parsed| {
            for block in parsed.search.blocks() {
                debug!("Search block {:?}", block);
            }
        });
        engine
    }

    /// Writes `report` as JSON when requested, otherwise renders it for the terminal.
    fn emit<T, F>(&self, report: &T, render: F) -> Result<()>
    where
        T: Serialize,
        F: FnOnce(&T),
    {
        if !self.json && self.output.is_none() {
            render(report);
            return Ok(());
        }

        let json_output = if self.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output).with_context(|| {
                format!("Failed to write output file: {}", output_path.display())
            })?;
            info!("Report written to: {}", output_path.display());
        } else {
            println!("{}", json_output);
        }

        Ok(())
    }

    pub fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        match &self.command {
            Commands::Tree {
                builds,
                grouping,
                previous,
                search,
            } => self.execute_tree(
                &config,
                builds,
                grouping.as_ref(),
                previous.as_deref(),
                search.as_deref(),
            ),
            Commands::Delta {
                previous,
                current,
                partial,
            } => self.execute_delta(&config, previous, current, *partial),
            Commands::Search { builds, query } => self.execute_search(&config, builds, query),
            Commands::Suggest { builds, text } => self.execute_suggest(&config, builds, text),
        }
    }
}

fn load_snapshot(path: &Path) -> Result<BuildSnapshot> {
    BuildSnapshot::load(path)
        .with_context(|| format!("Failed to load builds from: {}", path.display()))
}

fn build_tree(builder: &TreeBuilder, path: &Path) -> Result<BuildTree> {
    let snapshot = load_snapshot(path)?;
    Ok(builder.build(&snapshot.builds))
}

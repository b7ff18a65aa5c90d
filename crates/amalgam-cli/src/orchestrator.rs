//! The end-to-end amalgamation run.
//!
//! ```text
//! database -> normalize -> skip list -> hoist defines
//!          -> stage 1 synthesize + write -> resolve collisions
//!          -> stage 2 synthesize + write -> [verify] -> report
//! ```
//!
//! Every artifact is overwritten wholesale, so a run can be repeated or
//! interrupted at any point.

use crate::compiler::Compiler;
use crate::config::AmalgamateConfig;
use crate::resolver::{ConflictResolver, Resolution};
use amalgam_codegen::{Amalgamation, ArtifactPaths, Synthesizer};
use amalgam_core::{CommonDefineSet, RenamingTable, SkipSet};
use amalgam_parser::{CompileDatabaseLoader, GccRedefinitionGrammar, InvocationNormalizer};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Shell-ready commands for the final unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedCommands {
    pub preprocess: String,
    pub compile: String,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct AmalgamationReport {
    /// Units in the database after deduplication
    pub units: usize,
    pub common_defines: CommonDefineSet,
    pub skip: SkipSet,
    /// Collisions found compiling the stage-1 unit
    pub resolution: Resolution,
    /// Collisions still present in the stage-2 unit, when verified
    pub residual: Option<Resolution>,
    /// The final, stage-2 unit
    pub amalgamation: Amalgamation,
    pub commands: ReportedCommands,
}

pub struct Orchestrator<C> {
    config: AmalgamateConfig,
    compiler: C,
}

impl<C: Compiler> Orchestrator<C> {
    pub fn new(config: AmalgamateConfig, compiler: C) -> Self {
        Self { config, compiler }
    }

    pub fn config(&self) -> &AmalgamateConfig {
        &self.config
    }

    pub fn run(self) -> Result<AmalgamationReport> {
        let config = self.config;
        let root = config.project_root.clone();

        let records = CompileDatabaseLoader::new()
            .load_file(&config.database)
            .with_context(|| {
                format!(
                    "Failed to load compilation database {}",
                    config.database.display()
                )
            })?;
        info!(
            "Loaded {} compile records from {}",
            records.len(),
            config.database.display()
        );

        let units = InvocationNormalizer::new(&root)
            .with_denied_flags(config.denied_flags.iter().cloned())
            .normalize_all(&records)
            .context("Failed to normalize compile commands")?;

        let skip = SkipSet::load(&config.skip_list, &root)
            .with_context(|| format!("Failed to read skip list {}", config.skip_list.display()))?;
        skip.save(&config.skip_list)
            .with_context(|| format!("Failed to write skip list {}", config.skip_list.display()))?;
        info!(
            "Skip list {} holds {} files",
            config.skip_list.display(),
            skip.len()
        );

        let common_defines = CommonDefineSet::hoist(&units);
        info!("Hoisted {} defines shared by every unit", common_defines.len());

        let paths = ArtifactPaths::new(&config.output_dir, config.name.as_str())
            .context("Invalid artifact name")?;
        let synthesizer = Synthesizer::new(&root, config.compiler.as_str(), paths)
            .with_unit_test_marker(config.unit_test_marker.as_str());

        let stage = |renamings: &RenamingTable, label: &str| -> Result<Amalgamation> {
            let amalgamation = synthesizer.synthesize(&units, &common_defines, &skip, renamings);
            amalgamation
                .write()
                .with_context(|| format!("Failed to write {} artifacts", label))?;
            info!(
                "Wrote {} unit to {}",
                label,
                amalgamation.paths().source().display()
            );
            Ok(amalgamation)
        };

        let first = stage(&RenamingTable::new(), "stage 1")?;

        let grammar = GccRedefinitionGrammar::new()?;
        let resolver = ConflictResolver::new(self.compiler, grammar, &root);
        let resolution = resolver
            .resolve(&first)
            .context("Failed to resolve name collisions")?;

        let amalgamation = stage(&resolution.renamings, "stage 2")?;

        let residual = if config.verify {
            let residual = resolver
                .resolve(&amalgamation)
                .context("Failed to verify the final unit")?;
            for collision in &residual.collisions {
                warn!(
                    "{}:{}:{}: `{}` still collides after renaming",
                    collision.file, collision.line, collision.column, collision.identifier
                );
            }
            Some(residual)
        } else {
            None
        };

        let commands = ReportedCommands {
            preprocess: amalgamation.preprocess_invocation().shell_command(),
            compile: amalgamation.compile_invocation().shell_command(),
            link: amalgamation.link_invocation(&config.link_args).shell_command(),
        };

        Ok(AmalgamationReport {
            units: units.len(),
            common_defines,
            skip,
            resolution,
            residual,
            amalgamation,
            commands,
        })
    }
}

impl AmalgamationReport {
    /// Units that made it into the final source.
    pub fn included_units(&self) -> Vec<&str> {
        self.amalgamation.unit.included_files().collect()
    }

    /// Whether verification ran and found nothing left to rename.
    pub fn verified_clean(&self) -> Option<bool> {
        self.residual.as_ref().map(|r| !r.has_collisions())
    }
}


//! `sweep clean`: apply a retention policy to one or more repositories.

use crate::context::AppContext;
use crate::credentials;
use crate::format::{self, Formattable, OutputFormat, OutputFormatter};
use chrono::{DateTime, Utc};
use clap::Args;
use libsweep::config::Clean as CleanDefaults;
use libsweep::format::{format_optional_size, format_timestamp};
use libsweep::{CleanOptions, Cleaner, ManifestRecord, Plan, Policy, Repository};
use serde::Serialize;
use tabled::Tabled;

/// Arguments of the clean subcommand
///
/// Flags left unset fall back to the `clean` section of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct CleanArgs {
    /// Repositories to clean (e.g. gcr.io/my-project/app)
    #[arg(required = true)]
    pub repositories: Vec<String>,

    /// Only delete images uploaded longer ago than this (e.g. 30days, 720h)
    #[arg(long, conflicts_with = "since")]
    pub grace: Option<String>,

    /// Only delete images uploaded before this RFC 3339 timestamp
    #[arg(long)]
    pub since: Option<String>,

    /// Keep at least this many of the newest deletable images
    #[arg(long)]
    pub keep: Option<usize>,

    /// Also delete tagged images
    #[arg(long, overrides_with = "no_allow_tagged")]
    pub allow_tagged: bool,

    /// Protect tagged images even if the config allows deleting them
    #[arg(long, overrides_with = "allow_tagged")]
    pub no_allow_tagged: bool,

    /// Clean child repositories too
    #[arg(short, long, overrides_with = "no_recursive")]
    pub recursive: bool,

    /// Only clean the named repositories even if the config is recursive
    #[arg(long, overrides_with = "recursive")]
    pub no_recursive: bool,

    /// Report what would be deleted without deleting anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Maximum number of images deleted at the same time
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Output format: pretty, json, yaml
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Flags merged with config defaults
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub options: CleanOptions,
    pub concurrency: usize,
    pub format: OutputFormat,
}

impl Settings {
    pub(crate) fn resolve(
        args: &CleanArgs,
        defaults: &CleanDefaults,
        format: OutputFormat,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        let since = resolve_since(args, defaults, now)?;
        let allow_tagged = switch(
            args.allow_tagged,
            args.no_allow_tagged,
            defaults.allow_tagged,
        );
        let recursive = switch(args.recursive, args.no_recursive, defaults.recursive);

        let policy = Policy::new(since)
            .with_allow_tagged(allow_tagged)
            .with_keep(args.keep.unwrap_or(defaults.keep));
        let options = CleanOptions::new(policy)
            .with_recursive(recursive)
            .with_dry_run(args.dry_run);

        Ok(Self {
            options,
            concurrency: args.concurrency.unwrap_or(defaults.concurrency),
            format: args
                .format
                .as_deref()
                .map(OutputFormat::from)
                .unwrap_or(format),
        })
    }
}

/// A `--flag`/`--no-flag` pair over a config default.
fn switch(on: bool, off: bool, default: bool) -> bool {
    !off && (on || default)
}

/// Work out the upload cutoff: an explicit `--since`, else now minus the
/// grace period from the flag or the config.
pub(crate) fn resolve_since(
    args: &CleanArgs,
    defaults: &CleanDefaults,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, String> {
    if let Some(since) = &args.since {
        return DateTime::parse_from_rfc3339(since)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| format!("Invalid --since '{}': {}", since, e));
    }

    let grace = match &args.grace {
        Some(grace) => humantime::parse_duration(grace)
            .map_err(|e| format!("Invalid --grace '{}': {}", grace, e))?,
        None => defaults.grace_duration().map_err(|e| e.to_string())?,
    };
    let grace = chrono::Duration::from_std(grace)
        .map_err(|_| "Grace period is too large".to_string())?;

    now.checked_sub_signed(grace)
        .ok_or_else(|| "Grace period is too large".to_string())
}

/// Outcome of cleaning one repository
#[derive(Debug, Serialize)]
pub struct CleanReport {
    pub repository: String,
    pub dry_run: bool,
    pub policy: Option<Policy>,
    /// Eligible images preserved by `--keep`
    pub kept: usize,
    /// Images too recent, or tagged while tags are protected
    pub ineligible: usize,
    /// Deleted images, or on a dry run the ones that would be
    pub deleted: Vec<ManifestRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanReport {
    pub(crate) fn new(
        repository: &Repository,
        options: &CleanOptions,
        plan: &Plan,
        deleted: Vec<ManifestRecord>,
        error: Option<String>,
    ) -> Self {
        Self {
            repository: repository.to_string(),
            dry_run: options.dry_run,
            policy: Some(options.policy.clone()),
            kept: plan.kept_count(),
            ineligible: plan.ineligible_count(),
            deleted,
            error,
        }
    }

    pub(crate) fn failed(repository: &str, options: &CleanOptions, error: String) -> Self {
        Self {
            repository: repository.to_string(),
            dry_run: options.dry_run,
            policy: None,
            kept: 0,
            ineligible: 0,
            deleted: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Tabled)]
struct DeletedRow {
    #[tabled(rename = "DIGEST")]
    digest: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
    #[tabled(rename = "TAGS")]
    tags: String,
    #[tabled(rename = "CREATED")]
    created: String,
    #[tabled(rename = "SIZE")]
    size: String,
}

impl From<&ManifestRecord> for DeletedRow {
    fn from(record: &ManifestRecord) -> Self {
        let tags = if record.tags().is_empty() {
            "<none>".to_string()
        } else {
            record.tags().join(", ")
        };
        Self {
            digest: record.digest().short().to_string(),
            repository: record.repository().to_string(),
            tags,
            created: format_timestamp(&record.info().created),
            size: format_optional_size(record.info().size_bytes),
        }
    }
}

impl Formattable for CleanReport {
    fn format_pretty(&self) -> String {
        use tabled::{Table, settings::Style};

        let verb = if self.dry_run { "Would delete" } else { "Deleted" };
        let mut output = format!(
            "{}: {} {} image(s), kept {}, {} ineligible\n",
            self.repository,
            verb,
            self.deleted.len(),
            self.kept,
            self.ineligible
        );

        if !self.deleted.is_empty() {
            let rows: Vec<DeletedRow> = self.deleted.iter().map(DeletedRow::from).collect();
            output.push_str(&Table::new(&rows).with(Style::empty()).to_string());
            output.push('\n');
        }

        if let Some(ref error) = self.error {
            output.push_str(&format!("Error: {}\n", error));
        }

        output
    }
}

/// Handle the clean subcommand
pub async fn handle_clean(ctx: &AppContext, args: &CleanArgs) {
    let formatter = format::create_formatter(ctx.color);

    let settings = match Settings::resolve(args, &ctx.config.clean, ctx.format, Utc::now()) {
        Ok(settings) => settings,
        Err(e) => {
            formatter.error(&e);
            std::process::exit(1);
        }
    };
    tracing::debug!(?settings, "resolved clean settings");

    let mut reports = Vec::with_capacity(args.repositories.len());
    for path in &args.repositories {
        reports.push(clean_repository(ctx, &settings, path, formatter.as_ref()).await);
    }

    match format::format_output_vec(&reports, settings.format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            formatter.error(&e);
            std::process::exit(1);
        }
    }

    let failed = reports.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        formatter.error(&format!(
            "{} of {} repositories failed",
            failed,
            reports.len()
        ));
        std::process::exit(1);
    }
}

async fn clean_repository(
    ctx: &AppContext,
    settings: &Settings,
    path: &str,
    formatter: &dyn OutputFormatter,
) -> CleanReport {
    let options = &settings.options;

    let repository: Repository = match path.parse() {
        Ok(repository) => repository,
        Err(e) => return CleanReport::failed(path, options, format!("{}", e)),
    };

    let cleaner = match Cleaner::builder()
        .credentials(credentials::resolve(
            repository.registry(),
            &ctx.credentials_path,
        ))
        .client_config(ctx.config.client_config())
        .concurrency(settings.concurrency)
        .build()
    {
        Ok(cleaner) => cleaner,
        Err(e) => return CleanReport::failed(path, options, format!("{}", e)),
    };

    let spinner = formatter.spinner(&format!("Collecting images from {}", repository));
    let plan = match cleaner.plan(&repository, options).await {
        Ok(plan) => {
            formatter.finish_progress(
                spinner,
                &format!(
                    "Collected {} images from {}",
                    plan.decisions().len(),
                    repository
                ),
            );
            plan
        }
        Err(e) => {
            formatter.abandon_progress(spinner);
            return CleanReport::failed(path, options, format!("{}", e));
        }
    };

    let spinner = (!options.dry_run && !plan.doomed().is_empty())
        .then(|| formatter.spinner(&format!("Deleting {} images", plan.doomed().len())));
    let execution = cleaner.execute(&plan, options.dry_run).await;
    if let Some(spinner) = spinner {
        formatter.abandon_progress(spinner);
    }

    let error = execution.error.as_ref().map(|e| {
        format!(
            "cleaning stopped after deleting {} manifests: {}",
            execution.deleted.len(),
            e
        )
    });
    CleanReport::new(&repository, options, &plan, execution.deleted, error)
}

#[cfg(test)]
#[path = "clean_tests.rs"]
mod tests;

//! # Surface Builder CLI
//!
//! Command-line tools around `builder-core`.
//!
//! ## Usage
//!
//! ```bash
//! builder-cli check page.json
//! builder-cli normalize page.json --strict -o clean.json
//! builder-cli prepare page.json --app-id app-1 --api-url https://api.example.com/v1
//! builder-cli widget hero --widget-version 1.2.0 --app-id app-1
//! ```
//!
//! API settings fall back to `BUILDER_API_URL`, `BUILDER_APP_ID` and
//! `BUILDER_TOKEN`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use builder_client::ApiClient;
use builder_core::assets::storage_paths;
use builder_core::{
    normalize_report, parse_raw, prepare_surface, AssetResolver, BuilderConfig, Version,
    WidgetRef, WidgetResolver,
};
use clap::{Parser, Subcommand};

/// Command-line arguments for builder-cli.
#[derive(Debug, Clone, Parser)]
#[command(name = "builder-cli")]
#[command(about = "Inspect, normalize and prepare Surface Builder documents")]
#[command(version)]
pub struct CliArgs {
    /// Builder API base URL (e.g., <https://api.example.com/v1>)
    #[arg(long, env = "BUILDER_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Application ID used for widget and storage lookups
    #[arg(long, env = "BUILDER_APP_ID", global = true)]
    pub app_id: Option<String>,

    /// Bearer token for the builder API
    #[arg(long, env = "BUILDER_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// JSON file with builder settings
    #[arg(long, env = "BUILDER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Drop props the schema registry does not know
    #[arg(long, global = true)]
    pub strict: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate a surface file and report problems
    Check {
        /// Surface JSON file
        file: PathBuf,
    },
    /// Normalize every component against the schema registry
    Normalize {
        /// Surface JSON file
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace storage paths with signed URLs
    Prepare {
        /// Surface JSON file
        file: PathBuf,
        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch a widget definition
    Widget {
        /// Widget ID
        widget_id: String,
        /// Pinned version (x.y.z)
        #[arg(long = "widget-version")]
        widget_version: Option<String>,
    },
}

/// Resolved CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Builder API base URL.
    pub api_url: Option<String>,
    /// Application ID.
    pub app_id: Option<String>,
    /// Bearer token.
    pub token: Option<String>,
    /// Builder settings file.
    pub config_file: Option<PathBuf>,
    /// Strict normalization requested on the command line.
    pub strict: bool,
}

impl From<CliArgs> for CliConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            api_url: args.api_url,
            app_id: args.app_id,
            token: args.token,
            config_file: args.config,
            strict: args.strict,
        }
    }
}

impl CliConfig {
    /// Load builder settings, applying command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed.
    pub fn builder_config(&self) -> anyhow::Result<BuilderConfig> {
        let mut config = match &self.config_file {
            Some(path) => BuilderConfig::from_json(&read(path)?)
                .with_context(|| format!("invalid settings in {}", path.display()))?,
            None => BuilderConfig::default(),
        };
        if self.strict {
            config.strict_normalization = true;
        }
        Ok(config)
    }

    /// Build an API client from the configured URL and token.
    ///
    /// # Errors
    ///
    /// Returns an error if no URL is configured or it is invalid.
    pub fn client(&self) -> anyhow::Result<ApiClient> {
        let url = self
            .api_url
            .as_deref()
            .ok_or_else(|| anyhow!("no API URL configured (use --api-url or BUILDER_API_URL)"))?;
        Ok(ApiClient::new(url, self.token.clone())?)
    }

    /// The configured application ID.
    ///
    /// # Errors
    ///
    /// Returns an error if none is configured.
    pub fn app_id(&self) -> anyhow::Result<&str> {
        self.app_id
            .as_deref()
            .ok_or_else(|| anyhow!("no application ID configured (use --app-id or BUILDER_APP_ID)"))
    }
}

/// Run a parsed command line and return what should be printed.
///
/// # Errors
///
/// Returns an error if input cannot be read, is rejected, or a remote call
/// fails.
pub async fn run(args: CliArgs) -> anyhow::Result<String> {
    let command = args.command.clone();
    let config = CliConfig::from(args);
    let builder = config.builder_config()?;

    match command {
        Command::Check { file } => check(&read(&file)?, &builder),
        Command::Normalize { file, output } => {
            let json = normalize(&read(&file)?, builder.strict_normalization)?;
            emit(json, output.as_deref())
        }
        Command::Prepare { file, output } => {
            let client = config.client()?;
            let json = prepare(&read(&file)?, &client, config.app_id()?).await?;
            emit(json, output.as_deref())
        }
        Command::Widget {
            widget_id,
            widget_version,
        } => {
            let mut widget = WidgetRef::new(config.app_id()?, widget_id);
            if let Some(version) = widget_version {
                let version: Version = version.parse().map_err(|e: String| anyhow!(e))?;
                widget = widget.with_version(version);
            }
            let resolver = WidgetResolver::new(Arc::new(config.client()?), builder.widget_cache);
            fetch_widget(&resolver, &widget).await
        }
    }
}

/// Summarize a surface: root, counts, unknown kinds, dangling references
/// and normalization warnings.
///
/// # Errors
///
/// Returns an error if the surface is rejected on import.
pub fn check(text: &str, config: &BuilderConfig) -> anyhow::Result<String> {
    let export = parse_raw(text)?;
    let document = export.to_document()?;

    let mut out = String::new();
    writeln!(out, "root: {}", document.root_id())?;
    writeln!(out, "components: {}", document.len())?;
    writeln!(out, "widgets: {}", export.widget_refs.len())?;
    writeln!(out, "storage paths: {}", storage_paths(document.nodes()).len())?;

    let unknown: Vec<String> = document
        .nodes()
        .filter(|node| node.kind.known().is_none())
        .map(|node| format!("{} ({})", node.id, node.kind))
        .collect();
    let dangling = document.dangling_references();
    let report = normalize_report(document.nodes().cloned().collect(), config.strict_normalization);

    for entry in &unknown {
        writeln!(out, "unknown kind: {entry}")?;
    }
    for (parent, child) in &dangling {
        writeln!(out, "dangling reference: {parent} -> {child}")?;
    }
    for warning in &report.warnings {
        writeln!(out, "warning: {warning}")?;
    }

    let problems = unknown.len() + dangling.len();
    if problems == 0 {
        write!(out, "ok")?;
    } else {
        write!(out, "{problems} problem(s)")?;
    }
    tracing::info!(components = document.len(), problems, "surface checked");
    Ok(out)
}

/// Normalize every component and return the surface as JSON.
///
/// Components of unknown kind are dropped.
///
/// # Errors
///
/// Returns an error if the surface is rejected on import.
pub fn normalize(text: &str, strict: bool) -> anyhow::Result<String> {
    let mut export = parse_raw(text)?;
    export.to_document()?;
    let report = normalize_report(export.components, strict);
    tracing::info!(
        kept = report.nodes.len(),
        dropped = report.dropped.len(),
        warnings = report.warnings.len(),
        "surface normalized"
    );
    export.components = report.nodes;
    Ok(export.to_json()?)
}

/// Resolve storage paths through `resolver` and return the surface as JSON.
///
/// # Errors
///
/// Returns an error if the surface is rejected or presigning fails.
pub async fn prepare(text: &str, resolver: &dyn AssetResolver, app_id: &str) -> anyhow::Result<String> {
    let mut export = parse_raw(text)?;
    export.to_document()?;
    let rewritten = prepare_surface(&mut export, resolver, app_id).await?;
    tracing::info!(app_id, rewritten, "surface prepared");
    Ok(export.to_json()?)
}

/// Fetch a widget definition and return it as JSON.
///
/// # Errors
///
/// Returns an error if the fetch fails.
pub async fn fetch_widget(resolver: &WidgetResolver, widget: &WidgetRef) -> anyhow::Result<String> {
    let definition = resolver.resolve_widget(widget).await?;
    Ok(serde_json::to_string_pretty(&definition)?)
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn emit(json: String, output: Option<&Path>) -> anyhow::Result<String> {
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(format!("wrote {}", path.display()))
        }
        None => Ok(json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use builder_core::{ResolvedAsset, ServiceError};

    const SURFACE: &str = r##"{
        "components": [
            {"id": "page", "kind": "column", "props": {"children": {"explicitList": ["hero", "gone"]}}},
            {"id": "hero", "kind": "image", "props": {"src": {"literalString": "uploads/hero.png"}, "fit": "stretchy"}},
            {"id": "x", "kind": "carousel"}
        ],
        "canvasSettings": {"backgroundColor": "#fafafa", "padding": "8px"}
    }"##;

    struct FakeResolver;

    #[async_trait]
    impl AssetResolver for FakeResolver {
        async fn resolve(
            &self,
            _app_id: &str,
            paths: &[String],
        ) -> Result<Vec<ResolvedAsset>, ServiceError> {
            Ok(paths
                .iter()
                .map(|path| ResolvedAsset {
                    path: path.clone(),
                    url: Some(format!("https://cdn.example/{path}")),
                    error: None,
                })
                .collect())
        }
    }

    fn write_surface(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("page.json");
        std::fs::write(&path, SURFACE).expect("should write fixture");
        path
    }

    #[test]
    fn test_parse_args_with_env_style_flags() {
        let args = CliArgs::try_parse_from([
            "builder-cli",
            "widget",
            "hero",
            "--widget-version",
            "1.0.0",
            "--app-id",
            "app-1",
        ])
        .expect("should parse");
        let config = CliConfig::from(args.clone());
        assert_eq!(config.app_id.as_deref(), Some("app-1"));
        assert!(matches!(args.command, Command::Widget { ref widget_id, .. } if widget_id == "hero"));
    }

    #[test]
    fn test_check_reports_problems() {
        let report = check(SURFACE, &BuilderConfig::default()).expect("should check");
        assert!(report.contains("root: page"));
        assert!(report.contains("components: 3"));
        assert!(report.contains("storage paths: 1"));
        assert!(report.contains("unknown kind: x (carousel)"));
        assert!(report.contains("dangling reference: page -> gone"));
        assert!(report.ends_with("2 problem(s)"));
    }

    #[test]
    fn test_check_rejects_bad_input() {
        assert!(check(r#"{"components": [{"kind": "text"}]}"#, &BuilderConfig::default()).is_err());
    }

    #[test]
    fn test_normalize_drops_unknown_and_fixes_values() {
        let json = normalize(SURFACE, true).expect("should normalize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        let components = value["components"].as_array().expect("components");
        assert_eq!(components.len(), 2);
        assert_eq!(value["canvasSettings"]["backgroundColor"], "#fafafa");
    }

    #[tokio::test]
    async fn test_prepare_rewrites_storage_paths() {
        let json = prepare(SURFACE, &FakeResolver, "app-1")
            .await
            .expect("should prepare");
        assert!(json.contains("https://cdn.example/uploads/hero.png"));
        assert!(!json.contains("\"uploads/hero.png\""));
    }

    #[tokio::test]
    async fn test_run_check_from_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_surface(&dir);
        let args = CliArgs::try_parse_from(["builder-cli", "check", path.to_str().expect("utf-8")])
            .expect("should parse");
        let out = run(args).await.expect("should run");
        assert!(out.starts_with("root: page"));
    }

    #[tokio::test]
    async fn test_run_normalize_to_output_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_surface(&dir);
        let output = dir.path().join("clean.json");
        let args = CliArgs::try_parse_from([
            "builder-cli",
            "--strict",
            "normalize",
            path.to_str().expect("utf-8"),
            "-o",
            output.to_str().expect("utf-8"),
        ])
        .expect("should parse");
        let message = run(args).await.expect("should run");
        assert!(message.starts_with("wrote "));
        let written = std::fs::read_to_string(&output).expect("should read output");
        assert!(written.contains("\"page\""));
        assert!(!written.contains("carousel"));
    }

    #[tokio::test]
    async fn test_run_reads_settings_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = write_surface(&dir);
        let settings = dir.path().join("builder.json");
        std::fs::write(&settings, r#"{"strictNormalization": true}"#).expect("should write");
        let args = CliArgs::try_parse_from([
            "builder-cli",
            "--config",
            settings.to_str().expect("utf-8"),
            "check",
            path.to_str().expect("utf-8"),
        ])
        .expect("should parse");
        let config = CliConfig::from(args.clone());
        assert!(config.builder_config().expect("should load").strict_normalization);
        run(args).await.expect("should run");
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let args = CliArgs::try_parse_from(["builder-cli", "check", "/definitely/not/here.json"])
            .expect("should parse");
        let err = run(args).await.expect_err("should fail");
        assert!(err.to_string().contains("failed to read"));
    }
}

//! CLI Tooling
//!
//! Loads a workspace directory into a workbench and runs one export
//! operation against it.

use crate::config::{ConfigLoader, WorkbenchConfig};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::sync::{FsDirectoryTarget, GitCredentials, PushRequest, Visibility};
use crate::tree::FileNode;
use crate::workbench::Workbench;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;

/// Workbench CLI - export a project directory as an archive, a directory copy or a git commit
#[derive(Parser)]
#[command(name = "workbench")]
#[command(about = "Export a project as a ZIP archive, a directory copy or a GitHub commit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging section with command-line overrides applied
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what the workspace holds
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write the project to a ZIP archive
    Export {
        /// Output directory or file path (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Copy the project into a local directory
    Sync {
        /// Destination directory, created if missing
        #[arg(long)]
        target: PathBuf,
    },
    /// Commit the project to a GitHub repository, creating it if needed
    Push {
        /// Repository name
        #[arg(long)]
        repo: String,
        /// Commit message (prompted for when omitted on a terminal)
        #[arg(long)]
        message: Option<String>,
        /// Create the repository as private
        #[arg(long, conflicts_with = "public")]
        private: bool,
        /// Create the repository as public
        #[arg(long)]
        public: bool,
        /// GitHub username (default: WORKBENCH_GIT_USERNAME)
        #[arg(long)]
        username: Option<String>,
        /// Access token (default: WORKBENCH_GIT_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

/// Workspace-scoped CLI state
pub struct CliContext {
    workspace_root: PathBuf,
    config: WorkbenchConfig,
    workbench: Workbench,
}

impl CliContext {
    /// Load configuration; the workspace itself is loaded by `execute`
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = load_config(&workspace_root, config_path.as_deref())?;
        Self::with_config(workspace_root, config)
    }

    /// Context over an already loaded configuration
    pub fn with_config(workspace_root: PathBuf, config: WorkbenchConfig) -> Result<Self, ApiError> {
        let workbench = Workbench::new(config.clone())?;
        Ok(Self {
            workspace_root,
            config,
            workbench,
        })
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn workbench(&self) -> &Workbench {
        &self.workbench
    }

    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        if !matches!(command, Commands::Config) {
            self.workbench.load_directory(&self.workspace_root)?;
        }
        match command {
            Commands::Status { format } => self.handle_status(format),
            Commands::Export { out } => self.handle_export(out.as_deref()).await,
            Commands::Sync { target } => self.handle_sync(target).await,
            Commands::Push {
                repo,
                message,
                private,
                public,
                username,
                token,
            } => {
                let visibility = match (*private, *public) {
                    (true, _) => Some(Visibility::Private),
                    (_, true) => Some(Visibility::Public),
                    _ => None,
                };
                let credentials = resolve_credentials(username.clone(), token.clone());
                let message = match message {
                    Some(message) => Some(message.clone()),
                    None => self.prompt_commit_message()?,
                };
                self.handle_push(PushRequest {
                    repo_name: repo.clone(),
                    commit_message: message,
                    credentials,
                    visibility,
                })
                .await
            }
            Commands::Config => toml::to_string_pretty(&self.config)
                .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e))),
        }
    }

    fn handle_status(&self, format: &str) -> Result<String, ApiError> {
        let files = self.workbench.files();
        let folders = files.iter().filter(|n| n.is_folder()).count();
        let binary = files
            .iter()
            .filter_map(FileNode::as_file)
            .filter(|f| f.is_binary())
            .count();
        let file_count = files.len() - folders;
        let bytes: usize = files
            .iter()
            .filter_map(FileNode::as_file)
            .map(|f| f.content.len())
            .sum();

        match format {
            "json" => {
                let value = json!({
                    "workspace": self.workspace_root.display().to_string(),
                    "files": file_count,
                    "folders": folders,
                    "binary_files": binary,
                    "bytes": bytes,
                    "project_name": self.config.archive.project_name,
                });
                serde_json::to_string_pretty(&value)
                    .map_err(|e| ApiError::ConfigError(format!("Failed to render status: {}", e)))
            }
            "text" => Ok(format!(
                "Workspace: {}\nFiles: {} ({} binary)\nFolders: {}\nSize: {} bytes",
                self.workspace_root.display(),
                file_count,
                binary,
                folders,
                bytes
            )),
            other => Err(ApiError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    async fn handle_export(&self, out: Option<&Path>) -> Result<String, ApiError> {
        let export = self.workbench.export_archive().await?;
        let destination = match out {
            Some(path) if path.extension().map(|e| e == "zip").unwrap_or(false) => path.to_path_buf(),
            Some(dir) => dir.join(&export.file_name),
            None => PathBuf::from(&export.file_name),
        };
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&destination, &export.bytes).await?;
        info!(path = %destination.display(), "Archive written");
        Ok(format!(
            "Wrote {} ({} entries, {} bytes)",
            destination.display(),
            export.entry_count,
            export.bytes.len()
        ))
    }

    async fn handle_sync(&self, target: &Path) -> Result<String, ApiError> {
        tokio::fs::create_dir_all(target).await?;
        let report = self
            .workbench
            .sync_to_directory(&FsDirectoryTarget::new(target))
            .await?;
        Ok(format!(
            "Synced to {}: {} files, {} directories",
            target.display(),
            report.files_written,
            report.directories_created
        ))
    }

    async fn handle_push(&self, request: PushRequest) -> Result<String, ApiError> {
        let repo = request.repo_name.clone();
        let url = self.workbench.push_to_remote(request).await?;
        Ok(format!("Pushed {} to {}", repo, url))
    }

    fn prompt_commit_message(&self) -> Result<Option<String>, ApiError> {
        if !std::io::stdin().is_terminal() {
            return Ok(None);
        }
        use dialoguer::Input;
        let message: String = Input::new()
            .with_prompt("Commit message")
            .default(self.config.git.default_commit_message.clone())
            .interact_text()
            .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;
        Ok(Some(message))
    }
}

fn load_config(
    workspace_root: &Path,
    config_path: Option<&Path>,
) -> Result<WorkbenchConfig, ApiError> {
    Ok(ConfigLoader::resolve(workspace_root, config_path)?)
}

/// Load only the configuration, for logging setup before the context exists
pub fn load_config_for(cli: &Cli) -> Result<WorkbenchConfig, ApiError> {
    load_config(&cli.workspace, cli.config.as_deref())
}

fn resolve_credentials(username: Option<String>, token: Option<String>) -> GitCredentials {
    let username = username
        .or_else(|| std::env::var("WORKBENCH_GIT_USERNAME").ok())
        .unwrap_or_default();
    let token = token
        .or_else(|| std::env::var("WORKBENCH_GIT_TOKEN").ok())
        .unwrap_or_default();
    GitCredentials::new(username, token)
}

//! comment-to-issue - turn annotated source comments into tracker issues
//!
//! Scans a workspace for `// ERROR: ... [key:value]` comments, keeps them in a
//! state file next to the sources, and files GitHub issues for them.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use comment_to_issue::config::ProjectConfig;
use comment_to_issue::git::RealGitOperations;
use comment_to_issue::model::format_issue_marker;
use comment_to_issue::scanner::ScanReport;
use comment_to_issue::source::FsFileSource;
use comment_to_issue::tracker::{GitHubTracker, IssueTracker};
use comment_to_issue::view::{CommentTree, TreeNode};
use comment_to_issue::workflow::{MarkerWrite, Workspace};
use comment_to_issue::writeback::WriteBackOutcome;
use comment_to_issue::{CommentToIssueError, Result};

#[derive(Parser)]
#[command(name = "comment-to-issue")]
#[command(version)]
#[command(about = "Turn annotated source comments into GitHub issues", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Workspace directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// GitHub token used to create issues
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the workspace and save the results
    Scan {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the last saved results without scanning
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create an issue for the comment at FILE:LINE
    CreateIssue {
        /// Workspace-relative file path
        file: String,

        /// 1-based line number
        line: u32,

        /// Create a new issue even if the comment is already linked
        #[arg(short, long)]
        force: bool,
    },

    /// Print the link to FILE:LINE on the current branch
    Open {
        file: String,
        line: u32,
    },

    /// Print the link to FILE:LINE pinned to the current commit
    Permalink {
        file: String,
        line: u32,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    let filter = if cli.verbose {
        "comment_to_issue=debug,info"
    } else {
        "comment_to_issue=info,warn"
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let project_path = cli.project.canonicalize().with_context(|| {
        format!(
            "Project directory does not exist: {}",
            cli.project.display()
        )
    })?;

    if let Err(e) = run(cli.command, &project_path, cli.token).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(hint) = hint(&e) {
            eprintln!("{} {}", "Hint:".cyan(), hint);
        }
        std::process::exit(e.exit_code());
    }
    Ok(())
}

async fn run(command: Commands, project_path: &Path, token: Option<String>) -> Result<()> {
    match command {
        Commands::Scan { json } => {
            let config = ProjectConfig::load(project_path)?;
            let source =
                FsFileSource::new(project_path).with_gitignore(config.respect_gitignore);
            let mut workspace = Workspace::open(project_path, config)?;
            let report = workspace.scan(&source).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report.records)?);
            } else {
                print_tree(workspace.tree());
                print_summary(&report);
            }
        }

        Commands::List { json } => {
            let mut workspace = Workspace::open(project_path, ProjectConfig::load(project_path)?)?;
            let tree = workspace.load_persisted();

            if json {
                println!("{}", serde_json::to_string_pretty(tree.comments())?);
            } else if tree.comments().is_empty() {
                println!(
                    "{} No saved comments. Run {} first.",
                    "Info:".cyan(),
                    "comment-to-issue scan".bold()
                );
            } else {
                print_tree(tree);
            }
        }

        Commands::CreateIssue { file, line, force } => {
            let config = ProjectConfig::load(project_path)?;
            let tracker = github_tracker(&config, project_path, token);
            let source =
                FsFileSource::new(project_path).with_gitignore(config.respect_gitignore);
            let mut workspace = Workspace::open(project_path, config)?;
            let file = normalize_file(&file);

            workspace.load_persisted();
            if workspace.find(&file, line).is_none() {
                workspace.scan(&source).await?;
            }

            let created = workspace.create_issue(&tracker, &file, line, force).await?;
            println!(
                "{} Created issue #{} for {}:{}",
                "OK".green().bold(),
                created.info.number,
                file,
                line
            );
            println!("   {}", created.info.html_url.underline());
            match created.marker {
                MarkerWrite::Written(WriteBackOutcome::Inserted { .. }) => {
                    println!(
                        "   Marker {} added to the source line",
                        format_issue_marker(created.info.number).cyan()
                    );
                }
                MarkerWrite::Written(WriteBackOutcome::AlreadyMarked) => {
                    println!("   Source line already carries a marker; left unchanged");
                }
                MarkerWrite::Failed(reason) => {
                    println!(
                        "   {} Marker not written: {}",
                        "Warning:".yellow(),
                        reason
                    );
                }
            }
        }

        Commands::Open { file, line } => {
            let config = ProjectConfig::load(project_path)?;
            let tracker = github_tracker(&config, project_path, token);
            println!("{}", tracker.remote_url(&normalize_file(&file), line).await?);
        }

        Commands::Permalink { file, line } => {
            let config = ProjectConfig::load(project_path)?;
            let tracker = github_tracker(&config, project_path, token);
            println!("{}", tracker.permalink(&normalize_file(&file), line).await?);
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                let config = ProjectConfig::load(project_path)?;
                let path = ProjectConfig::config_path(project_path);
                if json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    let source = if path.exists() {
                        path.display().to_string()
                    } else {
                        "defaults".to_string()
                    };
                    println!("{} {}", "# Source:".dimmed(), source.dimmed());
                    print!("{}", config.to_toml()?);
                }
                if let Err(e) = config.validate() {
                    eprintln!("{} {}", "Warning:".yellow(), e);
                }
            }

            ConfigAction::Init { force } => {
                let path = ProjectConfig::write_default(project_path, force)?;
                println!("{} Wrote {}", "OK".green().bold(), path.display());
            }
        },
    }

    Ok(())
}

fn github_tracker(
    config: &ProjectConfig,
    project_path: &Path,
    token: Option<String>,
) -> GitHubTracker {
    let token = token.filter(|t| !t.trim().is_empty());
    GitHubTracker::new(
        config.github_settings(token),
        Arc::new(RealGitOperations::new(project_path)),
    )
}

/// What the user can do about `e`, if anything.
fn hint(e: &CommentToIssueError) -> Option<&'static str> {
    match e {
        CommentToIssueError::Tracker(_) if e.requires_reconfigure() => Some(
            "Pass --token or set GITHUB_TOKEN, and set [github] owner and repo \
             in .comment-to-issue.toml",
        ),
        _ if e.requires_reconfigure() => {
            Some("Fix .comment-to-issue.toml, or run `comment-to-issue config init --force`")
        }
        CommentToIssueError::StaleComment { .. } => {
            Some("Run `comment-to-issue scan` and try again")
        }
        _ if e.is_recoverable() => Some("This may succeed if retried"),
        _ => None,
    }
}

/// Accept `./src/a.ts` and `src\a.ts` as `src/a.ts`.
fn normalize_file(file: &str) -> String {
    let file = file.replace('\\', "/");
    file.trim_start_matches("./").to_string()
}

fn print_tree(tree: &CommentTree) {
    for root in tree.roots() {
        if let TreeNode::File(node) = &root {
            if node.directory.is_empty() {
                println!("{}", node.label().bold());
            } else {
                println!("{}  {}", node.label().bold(), node.directory.dimmed());
            }
        }
        for child in tree.children(&root) {
            if let TreeNode::Comment(comment) = child {
                let description = comment.description();
                if comment.is_linked() {
                    println!("  {} {}", comment.label(), description.green());
                } else {
                    println!("  {}", comment.label());
                }
            }
        }
    }
}

fn print_summary(report: &ScanReport) {
    let linked = report
        .records
        .iter()
        .filter(|r| r.issue_number.is_some())
        .count();
    println!(
        "\n{} Scanned {} files: {} comments, {} linked",
        "OK".green().bold(),
        report.files_scanned,
        report.records.len(),
        linked
    );
    if !report.failed_files.is_empty() {
        println!(
            "   {} {} files could not be read: {}",
            "Warning:".yellow(),
            report.failed_files.len(),
            report.failed_files.join(", ")
        );
    }
}

use bitflow::config::{CloneConfig, LogConfig, OutputFormat};
use bitflow::{
    Author, CommitRequest, CommitSummary, DiffFilter, DiffRecord, HistoryOptions, ObjectId,
    Reference, Repository,
};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use colored::Colorize;
use is_terminal::IsTerminal;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "bitflow",
    version,
    author = "Sami Barbut-Dica",
    about = "A small version-control engine",
    long_about = "bitflow clones repositories from local paths or dumb HTTP remotes, \
    creates branches, commits single-file changes and reports history and diffs. \
    Results are printed to stdout as JSON unless --format text is given.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
",
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(
        long = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Json,
        help = "Output format for results"
    )]
    format: OutputFormat,

    #[command(flatten)]
    log: LogConfig,

    #[command(flatten)]
    clone: CloneConfig,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes an empty repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "clone",
        about = "Clone a repository",
        long_about = "This command copies every branch and object of a remote into a new repository \
        and checks out its primary branch. The remote is a path, a file:// URL or an http(s):// URL \
        served with git's dumb HTTP protocol."
    )]
    Clone {
        #[arg(index = 1, help = "The remote location")]
        remote: String,
        #[arg(index = 2, help = "The destination directory")]
        destination: PathBuf,
    },
    #[command(
        name = "branch",
        about = "Create or list branches",
        long_about = "Without a name this command lists every branch. With a name it creates the branch \
        at the tip of the source ref, HEAD by default."
    )]
    Branch {
        #[arg(index = 1, help = "The branch to create")]
        name: Option<String>,
        #[arg(index = 2, help = "The ref to start the branch at")]
        source: Option<String>,
        #[arg(long, default_value = ".", help = "The repository path")]
        repo: PathBuf,
    },
    #[command(
        name = "commit",
        about = "Commit a single-file change",
        long_about = "This command writes one file onto the tip of a branch and commits the result. \
        The author is taken from the flags, or from GIT_AUTHOR_NAME, GIT_AUTHOR_EMAIL and GIT_AUTHOR_DATE."
    )]
    Commit {
        #[arg(long, default_value = ".", help = "The repository path")]
        repo: PathBuf,
        #[arg(long, help = "The branch to commit on; defaults to the branch HEAD names")]
        branch: Option<String>,
        #[arg(long = "file", help = "Repository-relative path of the file")]
        path: String,
        #[arg(
            long,
            conflicts_with = "content_file",
            required_unless_present = "content_file",
            help = "The new file content"
        )]
        content: Option<String>,
        #[arg(long, help = "Read the new file content from this path")]
        content_file: Option<PathBuf>,
        #[arg(short, long, help = "The commit message")]
        message: String,
        #[arg(long, requires = "author_email", help = "The author name")]
        author_name: Option<String>,
        #[arg(long, requires = "author_name", help = "The author email")]
        author_email: Option<String>,
        #[arg(long, help = "Fail unless the branch still points at this commit")]
        expected_tip: Option<String>,
    },
    #[command(
        name = "history",
        about = "Show commit history",
        long_about = "This command lists the commits reachable from a ref, newest first, \
        with the files each one changed."
    )]
    History {
        #[arg(index = 1, default_value = "HEAD", help = "The ref to start from")]
        start: String,
        #[arg(long, default_value = ".", help = "The repository path or remote location")]
        repo: String,
        #[arg(short = 'n', long, help = "Limit the number of commits")]
        max_count: Option<usize>,
    },
    #[command(
        name = "diff",
        about = "Show changes between two commits",
        long_about = "This command reports added and deleted lines per file going from the first \
        commit to the second."
    )]
    Diff {
        #[arg(index = 1, help = "The old commit")]
        old: String,
        #[arg(index = 2, help = "The new commit")]
        new: String,
        #[arg(long, default_value = ".", help = "The repository path or remote location")]
        repo: String,
        #[arg(long, help = "Restrict to added (A), deleted (D) or modified (M) files, e.g. AM")]
        filter: Option<String>,
    },
    #[command(
        name = "update-server-info",
        about = "Prepare a repository for dumb HTTP serving",
        long_about = "This command writes info/refs so the git directory can be served by a static file server."
    )]
    UpdateServerInfo {
        #[arg(long, default_value = ".", help = "The repository path")]
        repo: PathBuf,
    },
}

#[derive(Serialize)]
struct MessagePayload {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_id: Option<ObjectId>,
}

#[derive(Serialize)]
struct BranchesPayload {
    branches: Vec<Reference>,
}

#[derive(Serialize)]
struct HistoryPayload {
    commit_history: Vec<CommitSummary>,
}

#[derive(Serialize)]
struct DiffPayload {
    diff_changes: Vec<DiffRecord>,
}

enum Output {
    Message(MessagePayload),
    Branches(BranchesPayload),
    History(HistoryPayload),
    Diff(DiffPayload),
}

impl Output {
    fn message(message: &'static str) -> Self {
        Output::Message(MessagePayload {
            message,
            commit_id: None,
        })
    }

    fn to_json(&self) -> serde_json::Result<String> {
        match self {
            Output::Message(payload) => serde_json::to_string_pretty(payload),
            Output::Branches(payload) => serde_json::to_string_pretty(payload),
            Output::History(payload) => serde_json::to_string_pretty(payload),
            Output::Diff(payload) => serde_json::to_string_pretty(payload),
        }
    }

    fn to_text(&self) -> String {
        match self {
            Output::Message(payload) => match &payload.commit_id {
                Some(commit_id) => format!("{} {}", payload.message, commit_id.to_string().yellow()),
                None => payload.message.to_string(),
            },
            Output::Branches(payload) => payload
                .branches
                .iter()
                .map(|reference| {
                    format!("{} {}", reference.target.to_short_oid().yellow(), reference.name)
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Output::History(payload) => payload
                .commit_history
                .iter()
                .map(|summary| {
                    let mut lines = vec![
                        format!("commit {}", summary.commit_id).yellow().to_string(),
                        format!("Author: {}", summary.author),
                        format!("Date:   {}", summary.commit_time.to_rfc2822()),
                        String::new(),
                        format!("    {}", summary.message),
                        String::new(),
                    ];
                    lines.extend(summary.changed_files.iter().map(|file| format!("    {file}")));
                    lines.join("\n")
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            Output::Diff(payload) => {
                let mut lines = payload
                    .diff_changes
                    .iter()
                    .map(|record| colorize_stat(&record.summary))
                    .collect::<Vec<_>>();
                let added = payload.diff_changes.iter().map(|record| record.added).sum::<usize>();
                let deleted = payload.diff_changes.iter().map(|record| record.deleted).sum::<usize>();
                lines.push(format!(
                    " {} files changed, {} insertions(+), {} deletions(-)",
                    payload.diff_changes.len(),
                    added,
                    deleted
                ));
                lines.join("\n")
            }
        }
    }
}

fn colorize_stat(line: &str) -> String {
    let Some((head, bar)) = line.rsplit_once(' ') else {
        return line.to_string();
    };
    if !bar.chars().all(|c| c == '+' || c == '-') {
        return line.to_string();
    }

    let plus = bar.chars().filter(|c| *c == '+').count();
    let minus = bar.len() - plus;
    format!(
        "{head} {}{}",
        "+".repeat(plus).green(),
        "-".repeat(minus).red()
    )
}

fn author_from(name: Option<String>, email: Option<String>) -> anyhow::Result<Author> {
    match (name, email) {
        (Some(name), Some(email)) => match std::env::var("GIT_AUTHOR_DATE").ok() {
            Some(date) => Ok(Author::new_with_timestamp(name, email, Author::parse_date(&date)?)),
            None => Ok(Author::new(name, email)),
        },
        _ => Author::load_from_env(),
    }
}

fn current_dir_or(path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

async fn run(cli: Cli) -> anyhow::Result<Output> {
    let output = match cli.command {
        Commands::Init { path } => {
            let path = current_dir_or(path)?;
            Repository::init(&path, &cli.clone.default_branch()?)?;

            Output::message("Repository initialized successfully")
        }
        Commands::Clone {
            remote,
            destination,
        } => {
            Repository::clone_remote(&remote, &destination, &cli.clone.to_options()?).await?;

            Output::message("Repository cloned successfully")
        }
        Commands::Branch { name, source, repo } => {
            let repository = Repository::open(&repo)?;

            match name {
                Some(name) => {
                    repository.create_branch(&name, source.as_deref())?;
                    Output::message("Branch created successfully")
                }
                None => Output::Branches(BranchesPayload {
                    branches: repository.list_branches()?,
                }),
            }
        }
        Commands::Commit {
            repo,
            branch,
            path,
            content,
            content_file,
            message,
            author_name,
            author_email,
            expected_tip,
        } => {
            let repository = Repository::open(&repo)?;
            let branch = match branch {
                Some(branch) => branch,
                None => repository.primary_branch()?.to_string(),
            };
            let content = match (content, content_file) {
                (Some(content), _) => Bytes::from(content),
                (None, Some(content_file)) => Bytes::from(std::fs::read(&content_file)?),
                (None, None) => anyhow::bail!("either --content or --content-file is required"),
            };
            let expected_tip = expected_tip
                .map(|tip| {
                    ObjectId::try_parse(tip.clone())
                        .map_err(|_| bitflow::Error::CommitNotFound(tip))
                })
                .transpose()?;

            let commit_id = repository.commit(CommitRequest {
                branch,
                path,
                content,
                message,
                author: author_from(author_name, author_email)?,
                expected_tip,
            })?;

            Output::Message(MessagePayload {
                message: "Changes committed successfully",
                commit_id: Some(commit_id),
            })
        }
        Commands::History {
            start,
            repo,
            max_count,
        } => {
            let repository = Repository::resolve(&repo, &cli.clone.to_options()?).await?;
            let commit_history = repository.history(&start, HistoryOptions { max_count })?;

            Output::History(HistoryPayload { commit_history })
        }
        Commands::Diff {
            old,
            new,
            repo,
            filter,
        } => {
            let filter = filter
                .map(|filter| {
                    DiffFilter::try_parse(&filter)
                        .ok_or_else(|| anyhow::anyhow!("invalid diff filter {filter}; expected letters from ADM"))
                })
                .transpose()?;
            let repository = Repository::resolve(&repo, &cli.clone.to_options()?).await?;
            let diff_changes = repository.diff(&old, &new, filter)?;

            Output::Diff(DiffPayload { diff_changes })
        }
        Commands::UpdateServerInfo { repo } => {
            Repository::open(&repo)?.update_server_info()?;

            Output::message("Server info updated successfully")
        }
    };

    Ok(output)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = bitflow::logging::init_tracing(&cli.log.level, &cli.log.format) {
        eprintln!("warning: unable to initialize logging: {err:#}");
    }

    let format = cli.format;
    match run(cli).await {
        Ok(output) => {
            let rendered = match format {
                OutputFormat::Json => match output.to_json() {
                    Ok(json) => json,
                    Err(err) => {
                        eprintln!("error: {err}");
                        return ExitCode::FAILURE;
                    }
                },
                OutputFormat::Text => {
                    colored::control::set_override(std::io::stdout().is_terminal());
                    output.to_text()
                }
            };
            println!("{rendered}");

            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

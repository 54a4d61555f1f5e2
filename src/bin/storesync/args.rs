use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "storesync",
    about = "Mirror store resources between the Admin API and a local directory",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub resource: ResourceCommand,
}

#[derive(Subcommand, Debug)]
pub enum ResourceCommand {
    /// Store pages
    Pages(SyncCommand),
    /// Uploaded files
    Files(SyncCommand),
    /// Navigation menus
    Menus(SyncCommand),
    /// Products
    Products(SyncCommand),
    /// Custom collections
    Collections(SyncCommand),
    /// Webhook subscriptions
    Webhooks(SyncCommand),
    /// URL redirects
    Redirects(SyncCommand),
    /// Shop metafields
    Metafields(SyncCommand),
    /// Metaobjects
    Metaobjects(SyncCommand),
    /// Blog articles
    Blogs(SyncCommand),
}

#[derive(Args, Debug)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub direction: Direction,
}

#[derive(Subcommand, Debug)]
pub enum Direction {
    /// Download remote items into a local directory
    Pull(PullArgs),
    /// Upload local items to the store
    Push(PushArgs),
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Store domain, e.g. my-store.example.com
    /// (falls back to STORESYNC_SITE)
    #[arg(long)]
    pub site: Option<String>,
    /// Admin API access token
    /// (falls back to STORESYNC_ACCESS_TOKEN)
    #[arg(long)]
    pub access_token: Option<String>,
}

#[derive(Args, Debug)]
pub struct PullArgs {
    /// Directory the resource tree is written under
    #[arg(long)]
    pub output: PathBuf,
    /// Stop after this many items (sampling; incompatible with --mirror)
    #[arg(long)]
    pub max_items: Option<usize>,
    /// Report what would happen without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Delete local items that no longer exist remotely
    #[arg(long)]
    pub mirror: bool,
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Directory the resource tree is read from
    #[arg(long)]
    pub input: PathBuf,
    /// Report what would happen without calling any mutations
    #[arg(long)]
    pub dry_run: bool,
    /// Delete remote items that do not exist locally
    #[arg(long)]
    pub mirror: bool,
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

use anyhow::Context;
use clap::Parser;
use secrecy::SecretString;

use storesync::resources::{
    Blogs, Collections, Files, Menus, Metafields, Metaobjects, Pages, Products, Redirects,
    Resource, Webhooks,
};
use storesync::{sync, LocalStore, RetryPolicy, StoreClient, SyncOptions, SyncReport};

use crate::args::{Cli, ConnectionArgs, Direction, ResourceCommand, SyncCommand};

const SITE_ENV: &str = "STORESYNC_SITE";
const TOKEN_ENV: &str = "STORESYNC_ACCESS_TOKEN";

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.resource {
        ResourceCommand::Pages(cmd) => dispatch(&Pages, cmd).await,
        ResourceCommand::Files(cmd) => dispatch(&Files, cmd).await,
        ResourceCommand::Menus(cmd) => dispatch(&Menus, cmd).await,
        ResourceCommand::Products(cmd) => dispatch(&Products, cmd).await,
        ResourceCommand::Collections(cmd) => dispatch(&Collections, cmd).await,
        ResourceCommand::Webhooks(cmd) => dispatch(&Webhooks, cmd).await,
        ResourceCommand::Redirects(cmd) => dispatch(&Redirects, cmd).await,
        ResourceCommand::Metafields(cmd) => dispatch(&Metafields, cmd).await,
        ResourceCommand::Metaobjects(cmd) => dispatch(&Metaobjects, cmd).await,
        ResourceCommand::Blogs(cmd) => dispatch(&Blogs, cmd).await,
    }
}

async fn dispatch<R: Resource>(resource: &R, command: SyncCommand) -> anyhow::Result<()> {
    let policy = RetryPolicy::default();
    match command.direction {
        Direction::Pull(args) => {
            let client = connect(&args.connection)?;
            let store = LocalStore::new(args.output);
            let options = SyncOptions {
                dry_run: args.dry_run,
                mirror: args.mirror,
                max_items: args.max_items,
            };
            let report = sync::pull(resource, &client, &store, &policy, &options).await?;
            finish(resource.name(), "pull", &options, report)
        }
        Direction::Push(args) => {
            let client = connect(&args.connection)?;
            let store = LocalStore::new(args.input);
            let options = SyncOptions {
                dry_run: args.dry_run,
                mirror: args.mirror,
                max_items: None,
            };
            let report = sync::push(resource, &client, &store, &policy, &options).await?;
            finish(resource.name(), "push", &options, report)
        }
    }
}

fn connect(connection: &ConnectionArgs) -> anyhow::Result<StoreClient> {
    let site = connection
        .site
        .clone()
        .or_else(|| std::env::var(SITE_ENV).ok())
        .with_context(|| format!("no store domain; pass --site or set {SITE_ENV}"))?;
    let token = connection
        .access_token
        .clone()
        .or_else(|| std::env::var(TOKEN_ENV).ok())
        .with_context(|| format!("no access token; pass --access-token or set {TOKEN_ENV}"))?;
    Ok(StoreClient::new(&site, SecretString::new(token))?)
}

fn finish(
    name: &str,
    verb: &str,
    options: &SyncOptions,
    report: SyncReport,
) -> anyhow::Result<()> {
    let prefix = if options.dry_run { "[dry-run] " } else { "" };
    println!(
        "{prefix}{name} {verb}: {} transferred, {} deleted, {} failed",
        report.transferred,
        report.deleted,
        report.failures.len()
    );
    for (handle, err) in &report.failures {
        eprintln!("  {handle}: {err}");
    }
    if report.failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} {} items failed", report.failures.len(), name)
    }
}

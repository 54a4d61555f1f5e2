#[path = "storesync/args.rs"]
mod args;
#[path = "storesync/run.rs"]
mod run;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run::run().await
}

//! Key command - print the cache key for a tree

use crate::cli::args::KeyArgs;
use crate::config::Config;
use crate::error::TreeCacheResult;
use crate::exec::SystemRunner;

/// Execute the key command
pub async fn execute(args: KeyArgs, config: &Config) -> TreeCacheResult<()> {
    let tree = args.tree.spec(&config.store)?;
    let (_, key) = tree.resolve(&SystemRunner).await?;
    println!("{}", key);
    Ok(())
}

use crate::config::Config;
use crate::split::check_output_conflict;
use crate::storage::SandboxFs;
use anyhow::Result;

pub fn run(config: &Config, path: &str) -> Result<()> {
    let storage = SandboxFs::new(config.sandbox_root()?);
    let exists = check_output_conflict(&storage, path)?;
    println!("{}", exists);
    Ok(())
}

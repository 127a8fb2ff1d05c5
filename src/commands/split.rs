use crate::config::Config;
use crate::page_range::PageSpan;
use crate::pdf::LopdfCodec;
use crate::persist::DocumentPersister;
use crate::split::{check_output_conflict, split_loaded, SplitRequest};
use crate::storage::SandboxFs;
use anyhow::Result;
use dialoguer::Confirm;
use std::io::{self, IsTerminal};

pub struct SplitArgs {
    pub path: String,
    pub pages: String,
    pub name: Option<String>,
    pub overwrite: bool,
    pub no_clobber: bool,
}

pub fn run(config: &Config, args: SplitArgs) -> Result<()> {
    let storage = SandboxFs::new(config.sandbox_root()?);
    let persister = DocumentPersister::new(&storage, LopdfCodec, config.commit);

    let source = persister.load_source(&args.path, config.max_source_bytes)?;
    let (start, end) = PageSpan::parse(&args.pages)?.resolve(source.page_count())?;

    let mut request = SplitRequest {
        source: args.path,
        start,
        end,
        output_dir: None,
        filename: args.name,
        overwrite: args.overwrite,
    };

    let candidate = request.output_candidate(config)?;
    if !args.overwrite && check_output_conflict(&storage, &candidate)? {
        request.overwrite = !args.no_clobber && confirm_overwrite(&candidate)?;
    }

    let output = split_loaded(&storage, &persister, config, &source, &request)?;

    println!("Extracted {} page(s) to {}", end - start + 1, output);

    Ok(())
}

/// Ask on a terminal; anywhere else the answer is no.
fn confirm_overwrite(path: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", path))
        .default(false)
        .interact()?;
    Ok(answer)
}

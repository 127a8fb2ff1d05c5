use crate::config::Config;
use crate::pdf::LopdfCodec;
use crate::persist::DocumentPersister;
use crate::storage::SandboxFs;
use anyhow::Result;

pub fn run(config: &Config, path: &str) -> Result<()> {
    let storage = SandboxFs::new(config.sandbox_root()?);
    let persister = DocumentPersister::new(&storage, LopdfCodec, config.commit);
    let doc = persister.load_source(path, config.max_source_bytes)?;
    let info = doc.get_info();

    println!("File: {}", doc.path);
    println!("Pages: {}", info.page_count);

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }

    Ok(())
}

/// Turn `D:YYYYMMDDHHmmSS...` into `YYYY-MM-DD HH:mm:SS`.
fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    if d.len() < 8 || !d.is_ascii() {
        return date.to_string();
    }
    let time = if d.len() >= 14 {
        format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14])
    } else {
        String::new()
    };
    format!("{}-{}-{}{}", &d[0..4], &d[4..6], &d[6..8], time)
}

use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Config;
use crate::page_range::PageSpan;
use crate::pdf::LopdfCodec;
use crate::persist::DocumentPersister;
use crate::split::{check_output_conflict, split_loaded, SplitRequest};
use crate::storage::SandboxFs;

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path inside the sandbox, using '/' separators")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path of the source PDF inside the sandbox")]
    pub path: String,
    #[schemars(description = "Inclusive page range (e.g., '3-5', '7', '4-end')")]
    pub pages: String,
    #[schemars(description = "Output folder inside the sandbox (default: configured output folder)")]
    #[serde(default)]
    pub output_dir: Option<String>,
    #[schemars(description = "Output file name (default: '<name>_<start>-<end>.pdf')")]
    #[serde(default)]
    pub filename: Option<String>,
    #[schemars(description = "Replace the output file if it already exists (default: false)")]
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    config: Config,
    root: PathBuf,
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new(config: Config, root: PathBuf) -> Self {
        Self {
            config,
            root,
            tool_router: Self::tool_router(),
        }
    }

    fn storage(&self) -> SandboxFs {
        SandboxFs::new(&self.root)
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get the page count and metadata (title, author, creator, producer, creation date) of a PDF in the sandbox")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let storage = self.storage();
        let persister = DocumentPersister::new(&storage, LopdfCodec, self.config.commit);
        match persister.load_source(&path, self.config.max_source_bytes) {
            Ok(doc) => {
                let info = doc.get_info();
                let result = PdfInfoResult {
                    path: doc.path,
                    page_count: info.page_count,
                    title: info.title,
                    author: info.author,
                    creator: info.creator,
                    producer: info.producer,
                    creation_date: info.creation_date,
                    subject: info.subject,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Check whether a file already exists at an output path in the sandbox. Call before pdf_split to decide whether to overwrite.")]
    fn pdf_check_conflict(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match check_output_conflict(&self.storage(), &path) {
            Ok(exists) => {
                let result = ConflictResult { path, exists };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Extract an inclusive page range from a PDF into a new PDF inside the sandbox. Fails if the output exists unless overwrite is true.")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        let storage = self.storage();
        let persister = DocumentPersister::new(&storage, LopdfCodec, self.config.commit);

        let source = match persister.load_source(&req.path, self.config.max_source_bytes) {
            Ok(s) => s,
            Err(e) => return format!("Error: {}", e),
        };

        let span = match PageSpan::parse(&req.pages) {
            Ok(s) => s,
            Err(e) => return format!("Error: {}", e),
        };
        let (start, end) = match span.resolve(source.page_count()) {
            Ok(r) => r,
            Err(e) => return format!("Error: {}", e),
        };

        let request = SplitRequest {
            source: req.path,
            start,
            end,
            output_dir: req.output_dir,
            filename: req.filename,
            overwrite: req.overwrite,
        };

        match split_loaded(&storage, &persister, &self.config, &source, &request) {
            Ok(output) => {
                let result = SplitResult {
                    output_path: output.to_string(),
                    page_count: end - start + 1,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PdfInfoResult {
    pub path: String,
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ConflictResult {
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SplitResult {
    pub output_path: String,
    pub page_count: u32,
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Split PDFs inside a sandboxed folder. Use pdf_info for the page count, \
                 pdf_check_conflict to see whether an output path is taken, and pdf_split to \
                 extract a page range into a new PDF. All paths are relative to the sandbox."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let root = config.sandbox_root()?;
    let server = PdfServer::new(config, root);

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::sample_pdf;

    fn server_with_book() -> (tempfile::TempDir, PdfServer) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Books")).unwrap();
        std::fs::write(dir.path().join("Books").join("book.pdf"), sample_pdf(6)).unwrap();
        let server = PdfServer::new(Config::default(), dir.path().to_path_buf());
        (dir, server)
    }

    fn split_request(pages: &str, overwrite: bool) -> PdfSplitRequest {
        PdfSplitRequest {
            path: "Books/book.pdf".to_string(),
            pages: pages.to_string(),
            output_dir: Some("Out".to_string()),
            filename: None,
            overwrite,
        }
    }

    #[test]
    fn test_split_then_conflict() {
        let (dir, server) = server_with_book();

        let out = server.pdf_split(Parameters(split_request("2-end", false)));
        let result: SplitResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.output_path, "Out/book_2-6.pdf");
        assert_eq!(result.page_count, 5);
        assert!(dir.path().join("Out").join("book_2-6.pdf").is_file());

        let out = server.pdf_check_conflict(Parameters(PathRequest {
            path: result.output_path.clone(),
        }));
        let conflict: ConflictResult = serde_json::from_str(&out).unwrap();
        assert!(conflict.exists);

        let again = server.pdf_split(Parameters(split_request("2-end", false)));
        assert!(again.starts_with("Error:"), "{}", again);
        let forced = server.pdf_split(Parameters(split_request("2-end", true)));
        assert!(!forced.starts_with("Error:"), "{}", forced);
    }

    #[test]
    fn test_info_and_errors() {
        let (_dir, server) = server_with_book();

        let out = server.pdf_info(Parameters(PathRequest {
            path: "Books/book.pdf".to_string(),
        }));
        let info: PdfInfoResult = serde_json::from_str(&out).unwrap();
        assert_eq!(info.page_count, 6);

        let out = server.pdf_info(Parameters(PathRequest {
            path: "../book.pdf".to_string(),
        }));
        assert!(out.starts_with("Error:"));

        let out = server.pdf_split(Parameters(split_request("5-9", false)));
        assert!(out.contains("end page beyond page count"), "{}", out);
    }
}

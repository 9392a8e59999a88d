//! # Compressor Module
//!
//! Questo modulo incapsula i tool esterni che riscrivono le immagini sul posto.
//!
//! ## Tool utilizzati:
//!
//! | Formato | Tool        | Comando                                  |
//! |---------|-------------|------------------------------------------|
//! | JPEG    | guetzli     | `guetzli --quality <N> <path> <path>`    |
//! | PNG     | zopflipng   | `zopflipng -m -y <path> <path>`          |
//!
//! ## Gestione errori:
//! - Tool non trovato: `MissingDependency`
//! - Exit code diverso da zero: `Tool`, con stdout e stderr catturati
//! - Nessun retry, nessun rollback del file riscritto a metà
//!
//! Il trait `Compressor` è il punto di innesto per il dispatcher: in
//! produzione `ExternalCompressor`, nei test un compressore finto.

use crate::args;
use crate::error::OptimizeError;
use crate::tool_resolver::ToolPathResolver;
use crate::walker::{ImageFile, ImageKind};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub const GUETZLI: &str = "guetzli";
pub const ZOPFLIPNG: &str = "zopflipng";

/// Captured result of a successful compressor run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub tool: String,
    /// stdout followed by stderr
    pub output: String,
}

/// Rewrites an image in place.
#[allow(async_fn_in_trait)]
pub trait Compressor {
    async fn compress(&self, file: &ImageFile) -> Result<ToolOutput, OptimizeError>;
}

/// Runs guetzli / zopflipng as child processes.
#[derive(Debug, Clone)]
pub struct ExternalCompressor {
    jpeg_quality: u32,
    jpeg_tool: String,
    png_tool: String,
    resolver: ToolPathResolver,
}

impl ExternalCompressor {
    pub fn new(jpeg_quality: u32, resolver: ToolPathResolver) -> Self {
        Self {
            jpeg_quality,
            jpeg_tool: GUETZLI.to_string(),
            png_tool: ZOPFLIPNG.to_string(),
            resolver,
        }
    }

    /// Substitute the programs invoked for each format, keeping their arguments.
    pub fn with_tools(mut self, jpeg_tool: &str, png_tool: &str) -> Self {
        self.jpeg_tool = jpeg_tool.to_string();
        self.png_tool = png_tool.to_string();
        self
    }

    /// Program name and arguments for compressing `file` in place.
    pub fn command_line(&self, file: &ImageFile) -> (&str, Vec<OsString>) {
        let path = file.path.as_path();
        match file.kind {
            ImageKind::Jpeg => (
                self.jpeg_tool.as_str(),
                args!["--quality", self.jpeg_quality.to_string(), path, path],
            ),
            ImageKind::Png => (self.png_tool.as_str(), args!["-m", "-y", path, path]),
        }
    }
}

impl Compressor for ExternalCompressor {
    async fn compress(&self, file: &ImageFile) -> Result<ToolOutput, OptimizeError> {
        let (tool, args) = self.command_line(file);
        let program = self
            .resolver
            .resolve_tool(tool)
            .ok_or_else(|| OptimizeError::MissingDependency(tool.to_string()))?;

        debug!("Command arguments: {:?} {:?}", program, args);
        let output = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OptimizeError::MissingDependency(tool.to_string()),
                _ => OptimizeError::Tool {
                    tool: tool.to_string(),
                    path: file.path.clone(),
                    status: format!("failed to start: {}", e),
                    output: String::new(),
                },
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(OptimizeError::Tool {
                tool: tool.to_string(),
                path: file.path.clone(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        Ok(ToolOutput {
            tool: tool.to_string(),
            output: combined,
        })
    }
}

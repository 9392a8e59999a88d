//! # Tool Path Resolver
//!
//! Finds the external compressors:
//! - `TOOLS_DIR` environment variable (bundled binaries)
//! - System `PATH`

use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tool path resolver for bundled and system-installed binaries
#[derive(Debug, Clone, Default)]
pub struct ToolPathResolver {
    /// Directory checked before `PATH`
    tools_dir: Option<PathBuf>,
}

impl ToolPathResolver {
    /// Resolver honouring the `TOOLS_DIR` override.
    pub fn from_env() -> Self {
        let tools_dir = env::var_os("TOOLS_DIR")
            .map(PathBuf::from)
            .filter(|dir| dir.is_dir());
        if let Some(ref dir) = tools_dir {
            debug!("Found tools directory via TOOLS_DIR: {:?}", dir);
        }
        Self { tools_dir }
    }

    pub fn with_tools_dir(tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: Some(tools_dir.into()),
        }
    }

    /// Resolve the path to a specific tool
    pub fn resolve_tool(&self, tool_name: &str) -> Option<PathBuf> {
        if let Some(ref tools_dir) = self.tools_dir {
            let bundled = tools_dir.join(executable_name(tool_name));
            if bundled.is_file() {
                debug!("Using bundled tool: {} -> {:?}", tool_name, bundled);
                return Some(bundled);
            }
        }

        let found = self.find_in_system_path(tool_name);
        match found {
            Some(ref path) => debug!("Using system tool: {} -> {:?}", tool_name, path),
            None => debug!("Tool not found: {}", tool_name),
        }
        found
    }

    /// Find tool in system PATH
    fn find_in_system_path(&self, tool_name: &str) -> Option<PathBuf> {
        let name = executable_name(tool_name);
        env::split_paths(&env::var_os("PATH")?)
            .map(|dir| dir.join(&name))
            .find(|path| is_executable(path))
    }
}

fn executable_name(tool_name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", tool_name)
    } else {
        tool_name.to_string()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

//! Test fixtures for creating reproducible workspaces.

use std::path::Path;
use tempfile::TempDir;

/// A temporary workspace directory.
///
/// Automatically cleans up when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::annotated_workspace();
/// assert!(fixture.path().join("src/auth.ts").exists());
/// ```
pub struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    /// Create an empty workspace.
    ///
    /// # Panics
    ///
    /// Panics if temporary directory creation fails.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a workspace with a few annotated source files.
    ///
    /// `src/auth.ts` carries the same comment on lines 5 and 9, the second
    /// one already linked to issue 42.
    ///
    /// # Panics
    ///
    /// Panics if file creation fails.
    #[must_use]
    pub fn annotated_workspace() -> Self {
        let fixture = Self::empty();
        fixture
            .write_file("src/auth.ts", Self::auth_ts_content())
            .expect("Failed to write src/auth.ts");
        fixture
            .write_file("src/util/index.ts", "// ERROR: handle empty input [sev:baja]\n")
            .expect("Failed to write src/util/index.ts");
        fixture
            .write_file("api/index.ts", "export {};\n// ERROR: paginate results\n")
            .expect("Failed to write api/index.ts");
        fixture
            .write_file("node_modules/dep/index.js", "// ERROR: not ours\n")
            .expect("Failed to write node_modules/dep/index.js");
        fixture
            .write_file("README.md", "// ERROR: docs are not scanned\n")
            .expect("Failed to write README.md");
        fixture
    }

    /// Get the path to the fixture directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file to the fixture directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_file(&self, relative_path: &str, content: &str) -> std::io::Result<()> {
        let path = self.temp_dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
    }

    /// Read a file from the fixture directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read_file(&self, relative_path: &str) -> std::io::Result<String> {
        std::fs::read_to_string(self.temp_dir.path().join(relative_path))
    }

    fn auth_ts_content() -> &'static str {
        "import { db } from './db';\n\
         \n\
         export function login(user: string) {\n\
         \x20 const row = db.find(user);\n\
         \x20 // ERROR: fix auth [sev:alta; area:auth]\n\
         \x20 return row;\n\
         }\n\
         \n\
         // ERROR: fix auth [sev:alta; area:auth] [GH-#42]\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotated_workspace_layout() {
        let fixture = TestFixture::annotated_workspace();
        let auth = fixture.read_file("src/auth.ts").unwrap();
        let lines: Vec<&str> = auth.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[4].trim(), "// ERROR: fix auth [sev:alta; area:auth]");
        assert!(lines[8].ends_with("[GH-#42]"));
        assert!(fixture.path().join("api/index.ts").exists());
    }

    #[test]
    fn test_write_file_creates_parents() {
        let fixture = TestFixture::empty();
        fixture.write_file("a/b/c.ts", "x").unwrap();
        assert_eq!(fixture.read_file("a/b/c.ts").unwrap(), "x");
    }
}

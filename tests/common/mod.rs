#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use record_merge::dataset::Dataset;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    /// Intermediate directories are created as needed.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// Builds a dataset from a header and rows given as string slices.
pub fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
    let rows: Vec<Vec<&str>> = rows.iter().map(|row| row.to_vec()).collect();
    Dataset::from_rows(headers, &rows).expect("valid dataset")
}

pub const BASE_CSV: &str = "\
registration_number,title,responsible_body,status,response_text,is_closed,last_updated,tags
2024/000001,Flood defences,Ministry of Environment,Pending,Initial reply,False,2024-02-09,\"[\"\"water\"\"]\"
2024/000002,School meals,Department of Education,Pending,,False,2024-03-01,
2024/000003,Rail safety,Transport Agency,Implemented,Done,True,2024-01-15,\"[\"\"rail\"\"]\"
";

pub const FOLLOWUP_CSV: &str = "\
registration_number,status,response_text,is_closed,last_updated,tags
2024/000001,Rejected,Further reply,True,2025-08-01,\"[\"\"budget\"\",\"\"water\"\"]\"
2024/000002,In progress,First reply,False,2024-01-01,
";

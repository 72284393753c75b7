use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditKind {
    TransactionSent,
    TransactionCompleted,
    QuerySent,
    TokenIssued,
    AccountsSynced,
    Airdrop,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub kind: AuditKind,
    pub summary: String,
}

/// Records what a test run did against the chain.
///
/// Every entry goes to the `log` facade; when a file is attached the entry is
/// also appended to it as one JSON line.
#[derive(Debug, Default)]
pub struct Audit {
    entries: Vec<AuditEntry>,
    file: Option<(PathBuf, File)>,
}

impl Audit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Audit {
            entries: Vec::new(),
            file: Some((path, file)),
        })
    }

    pub fn record(&mut self, kind: AuditKind, summary: impl Into<String>) {
        let entry = AuditEntry {
            kind,
            summary: summary.into(),
        };
        log::info!("[audit] {:?}: {}", entry.kind, entry.summary);

        if let Some((path, file)) = self.file.as_mut() {
            let written = serde_json::to_string(&entry)
                .map_err(std::io::Error::from)
                .and_then(|line| writeln!(file, "{line}"));
            if let Err(err) = written {
                log::warn!("cannot append audit entry to {}: {err}", path.display());
            }
        }

        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn count(&self, kind: AuditKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
}

//! File-backed identifier ledger.
//!
//! The ledger is a flat text file with one identifier per line and no header.
//! It only ever grows: [`FileLedger::append`] writes one line and syncs it
//! before returning, so a crash can at worst lose the line being written.
//! Every run first copies the ledger to
//! `<backup_dir>/processed_pmids-<stamp>.txt.bak`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pipeline::{ArticleId, IdentifierLedger, LedgerError, RunStamp, SeenSet, BACKUP_PREFIX};
use tracing::{debug, info};

/// Identifier ledger stored as a plain text file.
#[derive(Debug, Clone)]
pub struct FileLedger {
    ledger_file: PathBuf,
    backup_dir: PathBuf,
}

impl FileLedger {
    pub fn new(ledger_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            ledger_file: ledger_file.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn ledger_file(&self) -> &Path {
        &self.ledger_file
    }

    /// Location of the backup written for `stamp`.
    pub fn backup_path(&self, stamp: &RunStamp) -> PathBuf {
        self.backup_dir
            .join(format!("{BACKUP_PREFIX}{stamp}.txt.bak"))
    }

    /// Reads the ledger, creating an empty one if it does not exist yet.
    fn read_or_create(&self) -> io::Result<String> {
        if let Some(parent) = self.ledger_file.parent() {
            fs::create_dir_all(parent)?;
        }
        // Touch without truncating.
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.ledger_file)?;
        fs::read_to_string(&self.ledger_file)
    }

    fn write_backup(&self, stamp: &RunStamp, lines: &[&str]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.backup_dir)?;
        let path = self.backup_path(stamp);
        // A backup is never overwritten.
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.sync_all()?;
        Ok(path)
    }

    fn open_for_append(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.ledger_file)
    }
}

impl IdentifierLedger for FileLedger {
    fn snapshot_and_backup(&self, stamp: &RunStamp) -> Result<SeenSet, LedgerError> {
        let contents = self.read_or_create().map_err(|e| {
            LedgerError::Io(format!("{}: {e}", self.ledger_file.display()))
        })?;
        let lines: Vec<&str> = contents.lines().map(|l| l.trim_end_matches('\r')).collect();

        let backup = self.write_backup(stamp, &lines).map_err(|e| {
            LedgerError::Backup(format!("{}: {e}", self.backup_path(stamp).display()))
        })?;

        let seen: SeenSet = lines.iter().filter_map(|l| ArticleId::new(*l)).collect();
        info!(
            ledger = %self.ledger_file.display(),
            backup = %backup.display(),
            known = seen.len(),
            "Ledger snapshot taken"
        );
        Ok(seen)
    }

    fn append(&self, id: &ArticleId) -> Result<(), LedgerError> {
        let write = || -> io::Result<()> {
            let mut file = self.open_for_append()?;
            writeln!(file, "{id}")?;
            file.flush()?;
            file.sync_data()
        };
        write().map_err(|e| LedgerError::Io(format!("{}: {e}", self.ledger_file.display())))?;
        debug!(article = %id, "Recorded in ledger");
        Ok(())
    }
}

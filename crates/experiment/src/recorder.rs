//! Session recording.
//!
//! One CSV file per experiment cycle. The first session index is the count
//! of result files already present in the data directory, so repeated runs
//! extend a data set instead of clobbering it; the index then advances once
//! per completed session.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::ExperimentError;

const SESSION_EXTENSION: &str = "csv";
const HEADER: &str = "joint id, joint angle, joint velocity";

struct SessionWriter {
    file: BufWriter<File>,
    path: PathBuf,
}

pub struct SessionRecorder {
    data_dir: PathBuf,
    file_prefix: String,
    session_index: usize,
    writer: Option<SessionWriter>,
}

impl SessionRecorder {
    /// Prepares the data directory and allocates the first session index
    /// from the result files already in it.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
    ) -> Result<Self, ExperimentError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(|source| ExperimentError::DataDir {
            path: data_dir.clone(),
            source,
        })?;

        let mut existing = 0;
        let entries = fs::read_dir(&data_dir).map_err(|source| ExperimentError::DataDir {
            path: data_dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| ExperimentError::DataDir {
                path: data_dir.clone(),
                source,
            })?;
            if entry
                .path()
                .extension()
                .map_or(false, |ext| ext == SESSION_EXTENSION)
            {
                existing += 1;
            }
        }

        info!(
            data_dir = %data_dir.display(),
            existing, "session recorder ready"
        );

        Ok(Self {
            data_dir,
            file_prefix: file_prefix.into(),
            session_index: existing,
            writer: None,
        })
    }

    /// Index the next (or currently open) session file carries.
    #[must_use]
    pub fn session_index(&self) -> usize {
        self.session_index
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(format!(
            "{}{}.{SESSION_EXTENSION}",
            self.file_prefix, self.session_index
        ))
    }

    /// Opens (truncating) the session file and writes the header row.
    ///
    /// A session left open by an aborted cycle is closed first, so at most
    /// one stream ever exists.
    pub fn open(&mut self) -> Result<&Path, ExperimentError> {
        if self.writer.is_some() {
            self.close()?;
        }
        let path = self.session_path();
        let file = File::create(&path).map_err(|source| ExperimentError::OpenSession {
            path: path.clone(),
            source,
        })?;
        let mut file = BufWriter::new(file);
        writeln!(file, "{HEADER}")?;
        info!(path = %path.display(), "session opened");
        let writer = self.writer.insert(SessionWriter { file, path });
        Ok(&writer.path)
    }

    /// Appends one sample row. A no-op with a debug note when no session is
    /// open, which only happens if a snapshot command races an I/O failure.
    pub fn record(
        &mut self,
        joint_id: u32,
        angle: f32,
        velocity: f32,
    ) -> Result<(), ExperimentError> {
        match self.writer.as_mut() {
            Some(writer) => {
                writeln!(writer.file, "{joint_id}, {angle:.6}, {velocity:.6}")?;
                Ok(())
            }
            None => {
                debug!(joint_id, "snapshot with no open session, dropped");
                Ok(())
            }
        }
    }

    /// Flushes and closes the current session, advancing the index. Safe to
    /// call when no session is open.
    pub fn close(&mut self) -> Result<(), ExperimentError> {
        if let Some(mut writer) = self.writer.take() {
            writer.file.flush()?;
            info!(path = %writer.path.display(), "session closed");
            self.session_index += 1;
        }
        Ok(())
    }
}

// The BufWriter inside flushes on drop, so an experiment interrupted
// mid-session still leaves a complete file behind.

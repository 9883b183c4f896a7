//! The file register.
//!
//! Files are grouped per channel in upload order. The register enforces a
//! per-channel file count and a byte cap across all channels, and ages files
//! out lazily: mutating operations sweep every channel, reads prune only the
//! channel they look at.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use booklink_core::{
    draw_unique, is_expired, ChannelId, Clock, CodeSource, FileId, RandomCodes, SystemClock,
    LONG_CODE_BYTES,
};

use crate::error::{Result, StoreError};
use crate::file::RegisteredFile;

/// 100 MiB.
const DEFAULT_MAX_TOTAL_BYTES: u64 = 100 * 1024 * 1024;

/// Configuration for the file register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegisterConfig {
    /// Upper bound on files held per channel.
    pub max_files_in_channel: usize,
    /// Seconds a file is kept after upload.
    pub file_expiration_secs: u64,
    /// Byte cap across every channel.
    pub max_total_file_size_bytes: u64,
    /// Random draws before file id generation gives up.
    pub max_random_draws: usize,
}

impl Default for FileRegisterConfig {
    fn default() -> Self {
        Self {
            max_files_in_channel: 100,
            file_expiration_secs: 300,
            max_total_file_size_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_random_draws: 10,
        }
    }
}

/// Files of one channel, oldest first.
struct ChannelFiles<F> {
    files: Vec<(FileId, Arc<F>)>,
}

impl<F> Default for ChannelFiles<F> {
    fn default() -> Self {
        Self { files: Vec::new() }
    }
}

impl<F: RegisteredFile> ChannelFiles<F> {
    fn len(&self) -> usize {
        self.files.len()
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn contains(&self, file_id: &FileId) -> bool {
        self.files.iter().any(|(id, _)| id == file_id)
    }

    fn get(&self, file_id: &FileId) -> Option<&Arc<F>> {
        self.files
            .iter()
            .find(|(id, _)| id == file_id)
            .map(|(_, file)| file)
    }

    fn remove(&mut self, file_id: &FileId) -> Option<Arc<F>> {
        let pos = self.files.iter().position(|(id, _)| id == file_id)?;
        Some(self.files.remove(pos).1)
    }

    fn size_bytes(&self) -> u64 {
        self.files.iter().map(|(_, file)| file.size_bytes()).sum()
    }

    /// Drop expired files, returning how many went.
    fn prune(&mut self, ttl_secs: u64, now: i64) -> usize {
        let before = self.files.len();
        self.files
            .retain(|(_, file)| !is_expired(file.created_at(), ttl_secs, now));
        before - self.files.len()
    }
}

/// Stores files per channel with capacity limits and expiration.
///
/// Generic over the file representation; the register only needs
/// [`RegisteredFile`]. Files are handed out as `Arc<F>`, so a reader keeps
/// its copy even if the file is removed or expires meanwhile.
pub struct FileRegister<F> {
    config: FileRegisterConfig,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeSource>,
    channels: Mutex<HashMap<ChannelId, ChannelFiles<F>>>,
}

impl<F: RegisteredFile> FileRegister<F> {
    /// Create a register using wall-clock time and random ids.
    pub fn new(config: FileRegisterConfig) -> Self {
        Self::with_sources(config, Arc::new(SystemClock), Arc::new(RandomCodes))
    }

    /// Create a register with explicit time and code sources.
    pub fn with_sources(
        config: FileRegisterConfig,
        clock: Arc<dyn Clock>,
        codes: Arc<dyn CodeSource>,
    ) -> Self {
        Self {
            config,
            clock,
            codes,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &FileRegisterConfig {
        &self.config
    }

    /// Store `file` in `channel_id` and return its new id.
    ///
    /// Expired files are swept first, so their bytes and slots are free
    /// again. A rejected add leaves the register untouched, including not
    /// creating an entry for a previously unknown channel.
    pub fn add_file(&self, channel_id: &ChannelId, file: F) -> Result<FileId> {
        let mut channels = self.channels.lock();
        self.sweep(&mut channels);

        let requested = file.size_bytes();
        let used: u64 = channels.values().map(ChannelFiles::size_bytes).sum();
        let max = self.config.max_total_file_size_bytes;
        if used.saturating_add(requested) > max {
            warn!(used, requested, max, "file register byte cap reached");
            return Err(StoreError::TotalSizeExceeded {
                requested,
                used,
                max,
            });
        }

        let max = self.config.max_files_in_channel;
        if channels.get(channel_id).map_or(0, ChannelFiles::len) >= max {
            return Err(StoreError::ChannelFull {
                channel_id: channel_id.clone(),
                max,
            });
        }

        let attempts = self.config.max_random_draws;
        let file_id = draw_unique(
            attempts,
            || FileId::new(self.codes.url_code(LONG_CODE_BYTES)),
            |id| channels.values().any(|files| files.contains(id)),
        )
        .ok_or_else(|| {
            warn!(attempts, "file id space exhausted");
            StoreError::Exhausted { attempts }
        })?;

        debug!(channel_id = %channel_id, file_id = %file_id, size = requested, "stored file");
        channels
            .entry(channel_id.clone())
            .or_default()
            .files
            .push((file_id.clone(), Arc::new(file)));

        Ok(file_id)
    }

    /// Remove a file from whichever channel holds it.
    ///
    /// The channel entry is kept even if it becomes empty; the next full
    /// sweep drops it.
    pub fn remove_file(&self, file_id: &FileId) -> Result<Arc<F>> {
        let mut channels = self.channels.lock();
        let removed = channels
            .values_mut()
            .find_map(|files| files.remove(file_id))
            .ok_or_else(|| StoreError::FileNotFound(file_id.clone()))?;
        debug!(file_id = %file_id, "removed file");
        Ok(removed)
    }

    /// Live files of a channel, oldest first. Unknown channels have none.
    pub fn get_files_for_channel(&self, channel_id: &ChannelId) -> Vec<(FileId, Arc<F>)> {
        let mut channels = self.channels.lock();
        match self.prune_channel(&mut channels, channel_id) {
            Some(files) => files.files.clone(),
            None => Vec::new(),
        }
    }

    /// Ids of the live files of a channel, oldest first.
    pub fn get_file_ids_for_channel(&self, channel_id: &ChannelId) -> Vec<FileId> {
        let mut channels = self.channels.lock();
        match self.prune_channel(&mut channels, channel_id) {
            Some(files) => files.files.iter().map(|(id, _)| id.clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Look up a file within one channel.
    ///
    /// A file held by a different channel is reported as not found.
    pub fn get_file_for_channel(&self, channel_id: &ChannelId, file_id: &FileId) -> Result<Arc<F>> {
        let mut channels = self.channels.lock();
        let files = self
            .prune_channel(&mut channels, channel_id)
            .ok_or_else(|| StoreError::ChannelNotFound(channel_id.clone()))?;
        files
            .get(file_id)
            .cloned()
            .ok_or_else(|| StoreError::FileNotFound(file_id.clone()))
    }

    /// Sweep every channel and drop channels left without files.
    ///
    /// Returns the number of files removed.
    pub fn prune_expired_files(&self) -> usize {
        let mut channels = self.channels.lock();
        self.sweep(&mut channels)
    }

    /// Bytes currently held, expired files included until the next sweep.
    pub fn total_size_bytes(&self) -> u64 {
        self.channels
            .lock()
            .values()
            .map(ChannelFiles::size_bytes)
            .sum()
    }

    /// Number of channel entries.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Number of files across every channel.
    pub fn file_count(&self) -> usize {
        self.channels.lock().values().map(ChannelFiles::len).sum()
    }

    fn prune_channel<'a>(
        &self,
        channels: &'a mut HashMap<ChannelId, ChannelFiles<F>>,
        channel_id: &ChannelId,
    ) -> Option<&'a ChannelFiles<F>> {
        let files = channels.get_mut(channel_id)?;
        files.prune(self.config.file_expiration_secs, self.clock.now_millis());
        Some(files)
    }

    fn sweep(&self, channels: &mut HashMap<ChannelId, ChannelFiles<F>>) -> usize {
        let now = self.clock.now_millis();
        let ttl = self.config.file_expiration_secs;

        let removed: usize = channels
            .values_mut()
            .map(|files| files.prune(ttl, now))
            .sum();
        channels.retain(|_, files| !files.is_empty());

        if removed > 0 {
            debug!(removed, "pruned expired files");
        }
        removed
    }
}

impl<F> std::fmt::Debug for FileRegister<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRegister")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Flat directory of files that expire `ttl` after their last write.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FileCache {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        Self { dir, ttl }
    }

    /// Cache under the system temp dir.
    pub fn in_temp_dir(ttl: Duration) -> Self {
        Self::new(std::env::temp_dir().join("stocktracer-cache"), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn init(&self) -> io::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            debug!(cache_dir = ?self.dir, "Created cache directory");
        }
        Ok(())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.dir.join(safe_file_name(key))
    }

    fn age_of(&self, path: &Path) -> io::Result<Duration> {
        let modified = fs::metadata(path)?.modified()?;
        SystemTime::now()
            .duration_since(modified)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    pub fn is_valid(&self, key: &str) -> bool {
        let path = self.file_path(key);
        if !path.exists() {
            debug!(key, "Cache miss");
            return false;
        }

        match self.age_of(&path) {
            Ok(age) if age < self.ttl => {
                debug!(key, age_secs = age.as_secs(), "Cache hit");
                true
            }
            Ok(age) => {
                debug!(key, age_secs = age.as_secs(), ttl_secs = self.ttl.as_secs(), "Cache expired");
                false
            }
            Err(e) => {
                warn!(key, ?e, "Failed to determine cache entry age");
                false
            }
        }
    }

    pub fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.file_path(key))
    }

    pub fn write(&self, key: &str, content: &[u8]) -> io::Result<()> {
        self.init()?;
        debug!(key, content_size = content.len(), "Writing to cache");
        fs::write(self.file_path(key), content)
    }

    /// Remove every entry older than the TTL. Returns how many were removed.
    pub fn cleanup_expired(&self) -> io::Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed_count = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if let Ok(age) = self.age_of(&path) {
                if age > self.ttl && fs::remove_file(&path).is_ok() {
                    removed_count += 1;
                }
            }
        }

        if removed_count > 0 {
            debug!(removed_count, "Cleaned up expired cache files");
        }
        Ok(removed_count)
    }
}

fn safe_file_name(key: &str) -> String {
    key.replace("..", "_").replace(['/', '\\'], "_")
}

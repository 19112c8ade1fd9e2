//! One screenshot run: execute the task sequence, then persist the bytes.

use crate::tasks::screenshot_tasks;
use crate::{Result, ScreenshotConfig, Session};
use log::{error, info};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Banner logged at startup
pub fn banner() -> String {
    format!("## STARTING PAGESHOT VERSION {}, BUILD AT {}", crate::VERSION, crate::BUILD_DATE)
}

/// Capture `config.url` through `session` and write it to `config.filename`.
///
/// Nothing is written unless every step succeeded.
pub async fn run<S: Session>(
    config: &ScreenshotConfig,
    session: &S,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    config.validate()?;

    let mut buf = Vec::new();
    if let Err(e) = screenshot_tasks(config).run(session, cancel, &mut buf).await {
        error!("screenshot of {} failed: {}", config.url, e);
        return Err(e);
    }

    write_output(&config.filename, &buf).map_err(|e| {
        error!("writing {} failed: {}", config.filename.display(), e);
        e
    })?;
    info!("saved {} bytes to {}", buf.len(), config.filename.display());
    Ok(config.filename.clone())
}

/// Create or truncate `path` (rw-r--r-- on unix) and write `data`
pub fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}

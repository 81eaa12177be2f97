//! Free disk space on the filesystem holding a configured path.

use std::path::Path;

use async_trait::async_trait;
use serde_json::json;
use sysinfo::Disks;

use crate::lifecycle::{ManagedResource, ProbeOutcome, ReleaseOutcome};

pub const DISK_RESOURCE: &str = "disk";

pub struct DiskResource {
    path: String,
    min_free_ratio: f64,
}

impl DiskResource {
    pub fn new(path: impl Into<String>, min_free_ratio: f64) -> Self {
        Self {
            path: path.into(),
            min_free_ratio,
        }
    }
}

#[async_trait]
impl ManagedResource for DiskResource {
    fn name(&self) -> &str {
        DISK_RESOURCE
    }

    async fn probe(&self) -> ProbeOutcome {
        match filesystem_space(&self.path) {
            Ok(space) => classify(&self.path, space, self.min_free_ratio),
            Err(e) => ProbeOutcome::unhealthy(format!("cannot measure {}: {}", self.path, e)),
        }
    }

    async fn release(&self) -> ReleaseOutcome {
        ReleaseOutcome::Closed
    }
}

/// Byte counts for one filesystem.
#[derive(Debug, Clone, Copy)]
pub struct FilesystemSpace {
    pub total: u64,
    pub available: u64,
}

pub fn classify(path: &str, space: FilesystemSpace, min_free_ratio: f64) -> ProbeOutcome {
    let free_ratio = if space.total == 0 {
        0.0
    } else {
        space.available as f64 / space.total as f64
    };
    let details = json!({
        "path": path,
        "free": format!("{}MB", space.available / (1024 * 1024)),
        "total": format!("{}MB", space.total / (1024 * 1024)),
        "percentage_free": format!("{}%", (free_ratio * 100.0).round()),
    });

    if free_ratio >= min_free_ratio {
        ProbeOutcome::healthy_with(details)
    } else {
        ProbeOutcome::unhealthy(details)
    }
}

/// Space of the mounted filesystem that holds `path`.
fn filesystem_space(path: &str) -> std::io::Result<FilesystemSpace> {
    let resolved = std::fs::canonicalize(path)?;
    let disks = Disks::new_with_refreshed_list();
    let mounts = disks.list().iter().map(|disk| {
        (
            disk.mount_point(),
            FilesystemSpace {
                total: disk.total_space(),
                available: disk.available_space(),
            },
        )
    });

    containing_mount(&resolved, mounts).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no mounted filesystem holds {}", resolved.display()),
        )
    })
}

/// Nested mounts shadow their parents, so the deepest matching mount point wins.
fn containing_mount<'a>(
    path: &Path,
    mounts: impl IntoIterator<Item = (&'a Path, FilesystemSpace)>,
) -> Option<FilesystemSpace> {
    mounts
        .into_iter()
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, space)| space)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn enough_free_space_is_healthy() {
        let space = FilesystemSpace {
            total: 100 * GIB,
            available: 40 * GIB,
        };
        assert!(classify("/", space, 0.1).is_healthy());
    }

    #[test]
    fn nearly_full_is_unhealthy() {
        let space = FilesystemSpace {
            total: 100 * GIB,
            available: 5 * GIB,
        };
        let outcome = classify("/var", space, 0.1);
        assert!(!outcome.is_healthy());
        assert_eq!(outcome.details().unwrap()["percentage_free"], "5%");
    }

    #[test]
    fn empty_filesystem_is_unhealthy() {
        let space = FilesystemSpace {
            total: 0,
            available: 0,
        };
        assert!(!classify("/", space, 0.1).is_healthy());
    }

    #[test]
    fn deepest_mount_holding_the_path_wins() {
        let root = FilesystemSpace {
            total: 100 * GIB,
            available: 50 * GIB,
        };
        let data = FilesystemSpace {
            total: 10 * GIB,
            available: GIB,
        };
        let mounts = [
            (Path::new("/"), root),
            (Path::new("/var/lib/data"), data),
            (Path::new("/var/lib/database"), root),
        ];

        let space = containing_mount(Path::new("/var/lib/data/pg"), mounts).unwrap();
        assert_eq!(space.total, 10 * GIB);

        let space = containing_mount(Path::new("/home"), mounts).unwrap();
        assert_eq!(space.total, 100 * GIB);
    }

    #[test]
    fn path_outside_every_mount_has_no_space() {
        let mounts = [(
            Path::new("/mnt/usb"),
            FilesystemSpace {
                total: GIB,
                available: GIB,
            },
        )];
        assert!(containing_mount(Path::new("/srv"), mounts).is_none());
    }

    #[tokio::test]
    async fn missing_path_is_unhealthy() {
        let resource = DiskResource::new("/definitely/not/a/real/path", 0.1);
        assert!(!resource.probe().await.is_healthy());
    }
}

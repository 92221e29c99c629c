//! Export operations: directory sync, archive export and git push.

pub mod archive;
pub mod coordinator;
pub mod directory;
pub mod github;
pub mod operation;
pub mod snapshot;
pub mod target;

pub use archive::{archive_file_name, ArchiveCompression, ZipArchiveBuilder};
pub use coordinator::{
    ArchiveExport, DirectorySyncReport, LinkedRemote, PushRequest, SyncCoordinator, SyncSettings,
};
pub use directory::FsDirectoryTarget;
pub use github::GitHubTransport;
pub use operation::{InFlight, OperationGuard, OperationSlot, SyncKind, SyncOperation};
pub use snapshot::{ArchiveEntry, BufferPolicy, Snapshot, SnapshotSource};
pub use target::{ArchiveBuilder, DirectoryTarget, GitCredentials, GitTransport, RepoHandle, Visibility};

//! Data models for the dataset checker

pub mod collection;
pub mod discrepancy;
pub mod inventory;
pub mod video_id;

pub use collection::{Collection, Layout};
pub use discrepancy::{
    DiscrepancyRecord, FlagReason, FlaggedFile, FrameAlignment, FrameMismatch, MetadataIssue,
    Orphan,
};
pub use inventory::{FrameIndexSet, Holdings, Inventory, ScanWarning, ScannedFile, UnparsedFile};
pub use video_id::VideoId;

//! Blob storage client for uploaded ad videos.
//!
//! Videos are stored in Supabase Storage and read through its
//! S3-compatible endpoint with the AWS SDK.

pub mod client;
pub mod error;
pub mod location;

pub use client::{BlobStore, StorageConfig, SupabaseStorage};
pub use error::{StorageError, StorageResult};
pub use location::BlobLocation;

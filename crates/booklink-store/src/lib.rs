//! # BookLink Store
//!
//! In-memory file storage for BookLink channels.
//!
//! Uploads are kept per channel, oldest first, under two limits: a maximum
//! number of files per channel and a byte cap across all channels. Files
//! expire a fixed time after upload and are swept lazily.
//!
//! ```
//! use booklink_core::{ChannelId, SystemClock};
//! use booklink_store::{FileRegister, FileRegisterConfig, InMemoryEbookFile};
//!
//! let files = FileRegister::new(FileRegisterConfig::default());
//! let channel = ChannelId::new("channel");
//!
//! let book = InMemoryEbookFile::make("book.epub", b"...".to_vec(), &SystemClock);
//! let id = files.add_file(&channel, book).unwrap();
//!
//! assert_eq!(files.get_file_ids_for_channel(&channel), vec![id]);
//! ```

pub mod error;
pub mod file;
pub mod register;

pub use error::{Result, StoreError};
pub use file::{EbookMetadata, InMemoryEbookFile, RegisteredFile};
pub use register::{FileRegister, FileRegisterConfig};

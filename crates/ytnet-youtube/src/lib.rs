pub mod archive;
pub mod client;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod normalize;
pub mod pager;
pub(crate) mod retry;
pub mod types;

pub use archive::{RawArchive, RawPage};
pub use client::{ClientOptions, FetchedPage, YoutubeClient};
pub use credentials::{ApiKey, CredentialPool};
pub use endpoint::{Endpoint, VIDEOS_BATCH_SIZE};
pub use error::{ItemError, YoutubeError};
pub use normalize::{normalize_comment_thread, normalize_video, search_result_video_id};
pub use pager::{Pager, PagerStats, SkippedPage};

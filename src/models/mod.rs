//! Domain records shared by the crawler, the pipeline and the store
//!
//! - `PageMetadata`: what a content fetcher returns for one page
//! - `ContentItem`: a fetched, classified page
//! - `CaptionTrack`: one caption transcript attached to a content item

mod caption;
mod item;

pub use caption::{CaptionKind, CaptionTrack, FetchedCaption};
pub use item::{ContentItem, PageMetadata, RelatedCandidate};

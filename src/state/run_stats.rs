use serde::Serialize;

/// Counters for one crawl/ingest run
///
/// Crawlers and the pipeline each own their counters and hand them back by
/// value; the caller combines them with [`RunStats::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Items accepted by the crawler
    pub found: u64,
    /// Items handled by the pipeline, including existing-item no-ops
    pub processed: u64,
    /// Items whose retrieval task completed
    pub downloaded: u64,
    /// Caption tracks actually persisted
    pub subtitles_extracted: u64,
    /// Fetch, persistence and task failures
    pub errors: u64,
    /// Items skipped because the store already had them
    pub skipped_existing: u64,
    /// Pages fetched by the crawler
    pub steps: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds another set of counters into this one
    pub fn merge(&mut self, other: &RunStats) {
        self.found += other.found;
        self.processed += other.processed;
        self.downloaded += other.downloaded;
        self.subtitles_extracted += other.subtitles_extracted;
        self.errors += other.errors;
        self.skipped_existing += other.skipped_existing;
        self.steps += other.steps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_counters() {
        let mut total = RunStats {
            found: 2,
            errors: 1,
            ..Default::default()
        };
        let other = RunStats {
            found: 3,
            processed: 3,
            subtitles_extracted: 4,
            steps: 7,
            ..Default::default()
        };

        total.merge(&other);

        assert_eq!(total.found, 5);
        assert_eq!(total.processed, 3);
        assert_eq!(total.subtitles_extracted, 4);
        assert_eq!(total.errors, 1);
        assert_eq!(total.steps, 7);
    }
}

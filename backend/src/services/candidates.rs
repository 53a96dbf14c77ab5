use crate::models::{SearchHit, VideoCandidate};
use std::collections::{BTreeSet, HashMap};

/// Videos discovered by search, in discovery order.
///
/// Insert-only: once a video id is present its metadata never changes, so the
/// keyword that surfaced it first keeps the attribution.
#[derive(Debug, Default)]
pub struct CandidateSet {
    candidates: Vec<VideoCandidate>,
    index: HashMap<String, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hit` under `keyword` unless the video is already known.
    /// Returns whether it was added.
    pub fn insert_if_absent(&mut self, keyword: &str, hit: SearchHit) -> bool {
        if hit.video_id.is_empty() || self.index.contains_key(&hit.video_id) {
            return false;
        }

        self.index.insert(hit.video_id.clone(), self.candidates.len());
        self.candidates.push(VideoCandidate {
            video_id: hit.video_id,
            keyword: keyword.to_string(),
            title: hit.title,
            channel: hit.channel_title,
            channel_id: hit.channel_id,
            published_at: hit.published_at,
        });
        true
    }

    pub fn get(&self, video_id: &str) -> Option<&VideoCandidate> {
        self.index.get(video_id).map(|&pos| &self.candidates[pos])
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoCandidate> {
        self.candidates.iter()
    }

    pub fn video_ids(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.video_id.clone()).collect()
    }

    /// Each referenced channel exactly once, blanks left out.
    pub fn channel_ids(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|c| !c.channel_id.is_empty())
            .map(|c| c.channel_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

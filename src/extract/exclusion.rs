//! High-frequency keyword exclusion.
//!
//! Keywords extracted over and over across a batch ("Transformer", "文本生成")
//! stop carrying SEO value. The queue counts every accepted keyword; once one
//! reaches the frequency threshold it enters the exclusion list handed to
//! subsequent prompts. Extractions run concurrently so the state sits behind
//! a mutex.

use std::collections::HashMap;
use std::sync::Mutex;

use super::types::Keyword;

/// Occurrences before a keyword is considered overused.
const EXCLUSION_MIN_FREQUENCY: usize = 10;
/// Cap on the exclusion list, keeping the most frequent entries.
const EXCLUSION_MAX: usize = 50;

#[derive(Default)]
struct ExclusionState {
    frequency: HashMap<String, usize>,
    excluded: Vec<String>,
}

/// Shared keyword frequency ledger and exclusion list.
#[derive(Default)]
pub struct ExclusionQueue {
    state: Mutex<ExclusionState>,
}

impl ExclusionQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one model's accepted keywords and refresh the exclusion list.
    pub fn record(&self, keywords: &[Keyword]) {
        let mut state = self.state.lock().expect("exclusion queue mutex poisoned");

        for kw in keywords {
            *state.frequency.entry(kw.keyword.clone()).or_insert(0) += 1;
        }

        let mut high_freq: Vec<(String, usize)> = state
            .frequency
            .iter()
            .filter(|&(_, &count)| count >= EXCLUSION_MIN_FREQUENCY)
            .map(|(kw, &count)| (kw.clone(), count))
            .collect();

        // Most frequent first; keyword order breaks ties deterministically.
        high_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        high_freq.truncate(EXCLUSION_MAX);

        state.excluded = high_freq.into_iter().map(|(kw, _)| kw).collect();
    }

    /// Current exclusion list, most frequent first.
    pub fn excluded(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("exclusion queue mutex poisoned")
            .excluded
            .clone()
    }

    /// Total distinct keywords seen so far.
    pub fn distinct_keywords(&self) -> usize {
        self.state
            .lock()
            .expect("exclusion queue mutex poisoned")
            .frequency
            .len()
    }
}

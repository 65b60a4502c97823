//! Shared in-memory historian fake for integration tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tagsampler::connection::HistorianConnection;
use tagsampler::error::{ConnectionError, FetchError};
use tagsampler::grid::TimeGrid;
use tagsampler::types::{RawValue, SamplingInterval, TagAttributes, TagHandle, TimeRange};

/// How a mock tag answers an interpolated-values call
pub enum MockBehavior {
    /// Return this exact sequence on every call
    Fixed(Vec<RawValue>),
    /// Return each grid stamp's Unix seconds as the value
    ///
    /// A pure function of the timestamp, so chunked and unchunked retrievals
    /// of the same range must agree.
    UnixSeconds,
}

struct MockTag {
    behavior: MockBehavior,
    attributes: TagAttributes,
    /// Failures consumed one per attempt, before the behavior applies
    failures: Mutex<VecDeque<FetchError>>,
    fail_attributes: bool,
}

/// Scripted in-memory historian
#[derive(Default)]
pub struct MockHistorian {
    tags: HashMap<String, MockTag>,
    attempts: Mutex<HashMap<String, u32>>,
}

impl MockHistorian {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, name: &str, behavior: MockBehavior) -> Self {
        let attributes = TagAttributes::from([
            ("descriptor".to_string(), format!("{} descriptor", name)),
            ("engunits".to_string(), "bar".to_string()),
        ]);
        self.tags.insert(
            name.to_string(),
            MockTag {
                behavior,
                attributes,
                failures: Mutex::new(VecDeque::new()),
                fail_attributes: false,
            },
        );
        self
    }

    /// Queue failures returned ahead of the tag's behavior, one per attempt
    pub fn with_fetch_failures(self, name: &str, failures: Vec<FetchError>) -> Self {
        self.tags
            .get(name)
            .expect("unknown mock tag")
            .failures
            .lock()
            .unwrap()
            .extend(failures);
        self
    }

    pub fn with_failing_attributes(mut self, name: &str) -> Self {
        self.tags
            .get_mut(name)
            .expect("unknown mock tag")
            .fail_attributes = true;
        self
    }

    /// How many interpolated-values attempts were made for `name`
    pub fn attempts(&self, name: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }
}

impl HistorianConnection for MockHistorian {
    fn resolve(&self, tag_name: &str) -> Result<TagHandle, ConnectionError> {
        if self.tags.contains_key(tag_name) {
            Ok(TagHandle {
                name: tag_name.to_string(),
                point_id: 0,
            })
        } else {
            Err(ConnectionError::TagNotFound(tag_name.to_string()))
        }
    }

    fn interpolated_values(
        &self,
        handle: &TagHandle,
        range: &TimeRange,
        interval: &SamplingInterval,
    ) -> Result<Vec<RawValue>, FetchError> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(handle.name.clone())
            .or_insert(0) += 1;

        let tag = self
            .tags
            .get(&handle.name)
            .ok_or_else(|| FetchError::Fatal(format!("no such point: {}", handle.name)))?;

        if let Some(failure) = tag.failures.lock().unwrap().pop_front() {
            return Err(failure);
        }

        match &tag.behavior {
            MockBehavior::Fixed(values) => Ok(values.clone()),
            MockBehavior::UnixSeconds => {
                let grid = TimeGrid::generate(range, interval)
                    .map_err(|e| FetchError::Fatal(e.to_string()))?;
                Ok(grid
                    .timestamps()
                    .iter()
                    .map(|t| RawValue::Float(t.and_utc().timestamp() as f64))
                    .collect())
            }
        }
    }

    fn attributes(&self, handle: &TagHandle) -> Result<TagAttributes, ConnectionError> {
        let tag = self
            .tags
            .get(&handle.name)
            .ok_or_else(|| ConnectionError::TagNotFound(handle.name.clone()))?;
        if tag.fail_attributes {
            return Err(ConnectionError::Attributes(format!(
                "attribute store unavailable for {}",
                handle.name
            )));
        }
        Ok(tag.attributes.clone())
    }

    fn search(&self, mask: &str) -> Result<Vec<String>, ConnectionError> {
        let needle = mask.trim_matches('*');
        let mut names: Vec<String> = self
            .tags
            .keys()
            .filter(|name| name.contains(needle))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Install a test subscriber once; retry diagnostics show up under RUST_LOG
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Convenience: integer sequence as historian floats
pub fn float_values(values: impl IntoIterator<Item = i64>) -> Vec<RawValue> {
    values
        .into_iter()
        .map(|v| RawValue::Float(v as f64))
        .collect()
}

/// A retry policy tuned for tests: no jitter, near-zero delays
pub fn fast_policy() -> tagsampler::fetch::RetryPolicy {
    tagsampler::fetch::RetryPolicy {
        max_attempts: 3,
        initial_delay: std::time::Duration::from_millis(1),
        max_delay: std::time::Duration::from_millis(2),
        multiplier: 2.0,
        jitter: false,
    }
}

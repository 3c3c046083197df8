//! In-process collaborators recording how they were called

use async_trait::async_trait;
use nginx_mesh_registry::{
    ChartResolver, Error, ExtractionRule, RegistrationSink, Release, ReleaseFeed, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Release feed returning canned releases or failing
pub struct FakeFeed {
    releases: Option<Vec<Release>>,
    calls: AtomicUsize,
    limits: Mutex<Vec<usize>>,
}

impl FakeFeed {
    pub fn with_tags(tags: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            releases: Some(tags.iter().map(|t| Release::tagged(*t)).collect()),
            calls: AtomicUsize::new(0),
            limits: Mutex::new(Vec::new()),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::with_tags(&[])
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            releases: None,
            calls: AtomicUsize::new(0),
            limits: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReleaseFeed for FakeFeed {
    async fn latest_releases(&self, limit: usize) -> Result<Vec<Release>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.limits.lock().unwrap().push(limit);
        match &self.releases {
            Some(releases) => Ok(releases.iter().take(limit).cloned().collect()),
            None => Err(Error::Config(nginx_mesh_core::Error::invalid_config(
                "feed offline",
            ))),
        }
    }
}

/// Arguments a chart resolver was called with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLookup {
    pub repository_url: String,
    pub chart_name: String,
    pub app_version: String,
}

/// Chart resolver returning a fixed chart version or failing
pub struct FakeChartResolver {
    chart_version: Option<String>,
    lookups: Mutex<Vec<ChartLookup>>,
}

impl FakeChartResolver {
    pub fn resolving_to(chart_version: &str) -> Arc<Self> {
        Arc::new(Self {
            chart_version: Some(chart_version.to_string()),
            lookups: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            chart_version: None,
            lookups: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }

    pub fn lookups(&self) -> Vec<ChartLookup> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChartResolver for FakeChartResolver {
    async fn resolve_chart_version(
        &self,
        repository_url: &str,
        chart_name: &str,
        app_version: &str,
    ) -> Result<String> {
        self.lookups.lock().unwrap().push(ChartLookup {
            repository_url: repository_url.to_string(),
            chart_name: chart_name.to_string(),
            app_version: app_version.to_string(),
        });
        self.chart_version
            .clone()
            .ok_or_else(|| Error::chart_resolution(chart_name, app_version, "index unavailable"))
    }
}

/// How a [`RecordingSink`] answers submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkBehavior {
    Accept,
    Reject,
    /// Fails with an error other than `RegistrationRejected`
    Break,
}

/// Registration sink recording every submission and its time window
pub struct RecordingSink {
    behavior: SinkBehavior,
    delay: Option<Duration>,
    rules: Mutex<Vec<ExtractionRule>>,
    windows: Mutex<Vec<(Instant, Instant)>>,
    static_calls: Mutex<Vec<&'static str>>,
    fail_workloads: bool,
}

impl RecordingSink {
    pub fn accepting() -> Arc<Self> {
        Self::build(SinkBehavior::Accept, None, false)
    }

    pub fn rejecting() -> Arc<Self> {
        Self::build(SinkBehavior::Reject, None, false)
    }

    pub fn breaking() -> Arc<Self> {
        Self::build(SinkBehavior::Break, None, false)
    }

    /// Accepts each submission after `delay`
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(SinkBehavior::Accept, Some(delay), false)
    }

    /// Fails static workload registration, accepts everything else
    pub fn failing_workloads() -> Arc<Self> {
        Self::build(SinkBehavior::Accept, None, true)
    }

    fn build(behavior: SinkBehavior, delay: Option<Duration>, fail_workloads: bool) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            delay,
            rules: Mutex::new(Vec::new()),
            windows: Mutex::new(Vec::new()),
            static_calls: Mutex::new(Vec::new()),
            fail_workloads,
        })
    }

    pub fn calls(&self) -> usize {
        self.rules.lock().unwrap().len()
    }

    pub fn rules(&self) -> Vec<ExtractionRule> {
        self.rules.lock().unwrap().clone()
    }

    pub fn last_rule(&self) -> Option<ExtractionRule> {
        self.rules.lock().unwrap().last().cloned()
    }

    /// (start, end) of each completed dynamic submission
    pub fn windows(&self) -> Vec<(Instant, Instant)> {
        self.windows.lock().unwrap().clone()
    }

    pub fn static_calls(&self) -> Vec<&'static str> {
        self.static_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistrationSink for RecordingSink {
    async fn register_workloads(&self, server_address: &str, _self_address: &str) -> Result<()> {
        self.static_calls.lock().unwrap().push("workloads");
        if self.fail_workloads {
            return Err(Error::rejected(server_address, "500 Internal Server Error"));
        }
        Ok(())
    }

    async fn register_traits(&self, _server_address: &str, _self_address: &str) -> Result<()> {
        self.static_calls.lock().unwrap().push("traits");
        Ok(())
    }

    async fn register_workloads_dynamically(
        &self,
        server_address: &str,
        _self_address: &str,
        rule: &ExtractionRule,
    ) -> Result<()> {
        let start = Instant::now();
        self.rules.lock().unwrap().push(rule.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.windows.lock().unwrap().push((start, Instant::now()));

        match self.behavior {
            SinkBehavior::Accept => Ok(()),
            SinkBehavior::Reject => Err(Error::rejected(server_address, "422 Unprocessable Entity")),
            SinkBehavior::Break => Err(Error::Config(nginx_mesh_core::Error::invalid_config(
                "sink misconfigured",
            ))),
        }
    }
}

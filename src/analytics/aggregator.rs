//! Concurrent analytics aggregation with per-source failure containment.
//!
//! One topic fans out into four independent backend requests. Each request
//! settles on its own: a success commits its slice of the bundle, a failure
//! logs a diagnostic and leaves the slice absent. No source can abort its
//! siblings, and the bundle fills in monotonically as responses arrive.
//!
//! A generation counter guards the shared session state. Submitting a new
//! topic bumps the generation and resets the bundle; any response still in
//! flight for the old topic carries a stale generation and its commit is
//! dropped. In-flight I/O is not aborted, it just can no longer write.

use crate::analytics::series::{self, ChartSeries, TrlChart};
use crate::client::{ApiClient, ApiError};
use crate::models::{ConvergencePair, DocumentRecord, SCurvePoint, SynthesisResult, TrlSeries};
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Analytics for one topic, each slice independently present or absent.
///
/// Absent means "not yet available or source failed"; rendering treats it
/// as an explicit insufficient-data state, never as a reason to block the
/// other slices.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsBundle {
    pub synthesis: Option<SynthesisResult>,
    pub convergence: Option<Vec<ConvergencePair>>,
    pub scurve: Option<Vec<SCurvePoint>>,
    pub trl: Option<TrlSeries>,
}

impl AnalyticsBundle {
    /// Number of populated slices.
    pub fn sources_succeeded(&self) -> usize {
        [
            self.synthesis.is_some(),
            self.convergence.is_some(),
            self.scurve.is_some(),
            self.trl.is_some(),
        ]
        .iter()
        .filter(|populated| **populated)
        .count()
    }

    /// Number of absent slices.
    pub fn sources_failed(&self) -> usize {
        SOURCE_COUNT - self.sources_succeeded()
    }

    /// True when no source has populated its slice.
    pub fn is_empty(&self) -> bool {
        self.sources_succeeded() == 0
    }

    /// Chart-ready S-curve series, if the source resolved.
    pub fn scurve_chart(&self) -> Option<ChartSeries> {
        self.scurve.as_deref().map(series::to_scurve_series)
    }

    /// Chart-ready TRL history/forecast rows, if the source resolved.
    pub fn trl_chart(&self) -> Option<TrlChart> {
        self.trl.as_ref().map(series::to_trl_chart)
    }
}

/// Number of independent analytics sources.
const SOURCE_COUNT: usize = 4;

/// One resolved slice of the bundle, ready to commit.
#[derive(Debug, Clone)]
pub enum BundleSlice {
    Synthesis(SynthesisResult),
    Convergence(Vec<ConvergencePair>),
    SCurve(Vec<SCurvePoint>),
    Trl(TrlSeries),
}

impl BundleSlice {
    fn source_name(&self) -> &'static str {
        match self {
            BundleSlice::Synthesis(_) => "synthesis",
            BundleSlice::Convergence(_) => "convergence",
            BundleSlice::SCurve(_) => "scurve",
            BundleSlice::Trl(_) => "trl_progression",
        }
    }
}

/// Token tying an in-flight request to the submission that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Shared per-topic state: the active topic, its analytics bundle, and its
/// document list, all replaced atomically when a new topic is submitted.
#[derive(Debug, Default)]
pub struct BriefingSession {
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    topic: String,
    bundle: AnalyticsBundle,
    documents: Vec<DocumentRecord>,
}

impl BriefingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new submission for `topic`.
    ///
    /// Discards the previous bundle and documents immediately and returns
    /// the generation token that commits must carry. An empty topic is a
    /// guarded no-op: state is untouched and `None` is returned.
    pub fn begin(&self, topic: &str) -> Option<Generation> {
        if topic.trim().is_empty() {
            return None;
        }

        let mut state = self.state.lock().expect("session lock poisoned");
        state.generation += 1;
        state.topic = topic.to_string();
        state.bundle = AnalyticsBundle::default();
        state.documents.clear();

        debug!(
            "Session generation {} started for topic '{}'",
            state.generation, topic
        );
        Some(Generation(state.generation))
    }

    /// Commit one analytics slice. Returns false (and drops the value)
    /// when the generation no longer matches the active submission.
    pub fn commit(&self, generation: Generation, slice: BundleSlice) -> bool {
        let mut state = self.state.lock().expect("session lock poisoned");
        if state.generation != generation.0 {
            warn!(
                "Dropping stale {} result (generation {} superseded by {})",
                slice.source_name(),
                generation.0,
                state.generation
            );
            return false;
        }

        match slice {
            BundleSlice::Synthesis(value) => state.bundle.synthesis = Some(value),
            BundleSlice::Convergence(value) => state.bundle.convergence = Some(value),
            BundleSlice::SCurve(value) => state.bundle.scurve = Some(value),
            BundleSlice::Trl(value) => state.bundle.trl = Some(value),
        }
        true
    }

    /// Commit the document list for a submission, same staleness rule.
    pub fn commit_documents(&self, generation: Generation, documents: Vec<DocumentRecord>) -> bool {
        let mut state = self.state.lock().expect("session lock poisoned");
        if state.generation != generation.0 {
            warn!(
                "Dropping stale document list (generation {} superseded by {})",
                generation.0, state.generation
            );
            return false;
        }

        state.documents = documents;
        true
    }

    /// The topic of the active submission.
    #[allow(dead_code)] // Observer accessor
    pub fn topic(&self) -> String {
        self.state.lock().expect("session lock poisoned").topic.clone()
    }

    /// Snapshot of the current bundle (possibly partially filled).
    pub fn bundle(&self) -> AnalyticsBundle {
        self.state.lock().expect("session lock poisoned").bundle.clone()
    }

    /// Snapshot of the current document list.
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.state
            .lock()
            .expect("session lock poisoned")
            .documents
            .clone()
    }
}

/// Settle one source: commit on success, log-and-absorb on failure.
///
/// This is the whole partial-tolerance contract in one place, factored out
/// of the network layer so it can be exercised with synthetic outcomes.
pub fn settle(
    session: &BriefingSession,
    generation: Generation,
    outcome: Result<BundleSlice, ApiError>,
    source: &str,
) {
    match outcome {
        Ok(slice) => {
            session.commit(generation, slice);
        }
        Err(error) => {
            warn!("Analytics source '{}' unavailable: {}", source, error);
        }
    }
}

/// Fetch all four analytics sources for a topic concurrently.
///
/// `generation` must come from `BriefingSession::begin`, which is also the
/// empty-topic guard: no generation, no requests. Each source commits as it
/// resolves, so readers of the session observe intermediate states; the
/// returned bundle is the snapshot after every source has settled.
pub async fn fetch_all(
    client: &ApiClient,
    session: &BriefingSession,
    generation: Generation,
    topic: &str,
) -> AnalyticsBundle {
    let sources: Vec<BoxFuture<'_, ()>> = vec![
        async move {
            let outcome = client
                .fetch_synthesis(topic)
                .await
                .map(BundleSlice::Synthesis);
            settle(session, generation, outcome, "synthesis");
        }
        .boxed(),
        async move {
            let outcome = client
                .fetch_convergence(topic)
                .await
                .map(BundleSlice::Convergence);
            settle(session, generation, outcome, "convergence");
        }
        .boxed(),
        async move {
            let outcome = client.fetch_scurve(topic).await.map(BundleSlice::SCurve);
            settle(session, generation, outcome, "scurve");
        }
        .boxed(),
        async move {
            let outcome = client
                .fetch_trl_progression(topic)
                .await
                .map(BundleSlice::Trl);
            settle(session, generation, outcome, "trl_progression");
        }
        .boxed(),
    ];

    futures::future::join_all(sources).await;

    session.bundle()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TrlPoint, Year};

    fn sample_synthesis() -> SynthesisResult {
        SynthesisResult {
            overall_summary: "Solid progress.".to_string(),
            emerging_signals: vec!["on-chip integration".to_string()],
            key_players: vec!["NIST".to_string()],
            error: None,
        }
    }

    fn sample_trl() -> TrlSeries {
        TrlSeries {
            history: vec![TrlPoint {
                year: Year::from("2023"),
                avg_trl: 4.8,
            }],
            forecast: vec![TrlPoint {
                year: Year::from("2024"),
                avg_trl: 5.3,
            }],
        }
    }

    fn transport_error() -> ApiError {
        ApiError::Transport {
            url: "http://127.0.0.1:5000/api/analytics/synthesis/x".to_string(),
            message: "connection refused".to_string(),
        }
    }

    #[test]
    fn test_empty_topic_is_a_no_op() {
        let session = BriefingSession::new();
        assert!(session.begin("").is_none());
        assert!(session.begin("   ").is_none());
        assert!(session.bundle().is_empty());
    }

    #[test]
    fn test_all_sources_fail_leaves_all_slices_absent() {
        let session = BriefingSession::new();
        let generation = session.begin("quantum radar").unwrap();

        for source in ["synthesis", "convergence", "scurve", "trl_progression"] {
            settle(&session, generation, Err(transport_error()), source);
        }

        let bundle = session.bundle();
        assert!(bundle.is_empty());
        assert_eq!(bundle.sources_failed(), 4);
    }

    #[test]
    fn test_exactly_one_source_succeeds() {
        let session = BriefingSession::new();
        let generation = session.begin("quantum radar").unwrap();

        settle(
            &session,
            generation,
            Ok(BundleSlice::Synthesis(sample_synthesis())),
            "synthesis",
        );
        settle(&session, generation, Err(transport_error()), "convergence");
        settle(&session, generation, Err(transport_error()), "scurve");
        settle(
            &session,
            generation,
            Err(transport_error()),
            "trl_progression",
        );

        let bundle = session.bundle();
        assert_eq!(bundle.sources_succeeded(), 1);
        assert_eq!(bundle.synthesis, Some(sample_synthesis()));
        assert!(bundle.convergence.is_none());
        assert!(bundle.scurve.is_none());
        assert!(bundle.trl.is_none());
    }

    #[test]
    fn test_resubmission_is_idempotent_for_identical_responses() {
        let session = BriefingSession::new();

        let first = session.begin("quantum radar").unwrap();
        session.commit(first, BundleSlice::Synthesis(sample_synthesis()));
        session.commit(first, BundleSlice::Trl(sample_trl()));
        let first_bundle = session.bundle();

        let second = session.begin("quantum radar").unwrap();
        session.commit(second, BundleSlice::Synthesis(sample_synthesis()));
        session.commit(second, BundleSlice::Trl(sample_trl()));
        let second_bundle = session.bundle();

        assert_eq!(first_bundle, second_bundle);
    }

    #[test]
    fn test_stale_generation_commit_is_dropped() {
        let session = BriefingSession::new();

        // Topic A submitted, then superseded by topic B before A resolves.
        let gen_a = session.begin("topic A").unwrap();
        let gen_b = session.begin("topic B").unwrap();

        session.commit(gen_b, BundleSlice::Convergence(vec![ConvergencePair {
            tech_1: "photonics".to_string(),
            tech_2: "lidar".to_string(),
            strength: 3.0,
        }]));

        // A's late responses must not land.
        assert!(!session.commit(gen_a, BundleSlice::Synthesis(sample_synthesis())));
        assert!(!session.commit_documents(gen_a, vec![DocumentRecord::default()]));

        let bundle = session.bundle();
        assert_eq!(session.topic(), "topic B");
        assert!(bundle.synthesis.is_none());
        assert_eq!(bundle.sources_succeeded(), 1);
        assert!(session.documents().is_empty());
    }

    #[test]
    fn test_new_submission_discards_previous_state() {
        let session = BriefingSession::new();

        let first = session.begin("topic A").unwrap();
        session.commit(first, BundleSlice::Synthesis(sample_synthesis()));
        session.commit_documents(first, vec![DocumentRecord::default()]);
        assert_eq!(session.documents().len(), 1);

        session.begin("topic B").unwrap();
        assert!(session.bundle().is_empty());
        assert!(session.documents().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_all_with_unreachable_backend_yields_empty_bundle() {
        // Nothing listens here; every source fails at the transport layer
        // and the fan-out must still settle without propagating an error.
        let client = ApiClient::new("http://127.0.0.1:1", 1, 0).unwrap();
        let session = BriefingSession::new();
        let generation = session.begin("quantum radar").unwrap();

        let bundle = fetch_all(&client, &session, generation, "quantum radar").await;

        assert!(bundle.is_empty());
        assert_eq!(bundle.sources_failed(), 4);
    }

    #[test]
    fn test_bundle_chart_accessors() {
        let session = BriefingSession::new();
        let generation = session.begin("quantum radar").unwrap();

        session.commit(
            generation,
            BundleSlice::SCurve(vec![SCurvePoint {
                year: Year::from("2020"),
                count: Some(5),
                cumulative_count: 5,
            }]),
        );
        session.commit(generation, BundleSlice::Trl(sample_trl()));

        let bundle = session.bundle();
        let scurve = bundle.scurve_chart().unwrap();
        assert_eq!(scurve.labels, vec!["2020"]);
        assert_eq!(scurve.values, vec![5]);

        let trl = bundle.trl_chart().unwrap();
        assert_eq!(trl.labels, vec!["2023", "2024"]);
        assert_eq!(trl.history_values, vec![Some(4.8), None]);

        // Absent slices expose absent charts, not empty ones.
        assert!(AnalyticsBundle::default().scurve_chart().is_none());
        assert!(AnalyticsBundle::default().trl_chart().is_none());
    }
}

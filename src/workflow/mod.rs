//! Topic submission workflow.
//!
//! `TopicWorkflow` is a pure state machine: the transition function knows
//! nothing about HTTP or rendering and is tested in isolation. The async
//! driver below feeds it real backend events (submission ack, document
//! polls), tagging every event with the generation of the submission it
//! belongs to so a superseded topic's late responses are ignored.

use crate::analytics::{BriefingSession, Generation};
use crate::client::ApiClient;
use crate::models::DocumentRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a submission currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    /// No topic submitted yet.
    Idle,
    /// Job submission sent, waiting for the backend ack.
    Submitting,
    /// Job accepted; polling for per-document results.
    FetchingDocuments,
    /// Documents received (possibly zero).
    Ready(Vec<DocumentRecord>),
    /// Submission rejected or network failure.
    Error(String),
}

/// An observed backend event, applied to the state machine by the driver.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// Backend answered the job submission.
    ServerAck { accepted: bool, message: String },
    /// A document poll returned results.
    DocumentsReceived(Vec<DocumentRecord>),
    /// Transport-level failure at any point.
    NetworkFailure(String),
}

/// State machine owning the active topic and its submission lifecycle.
#[derive(Debug)]
pub struct TopicWorkflow {
    state: WorkflowState,
    topic: Option<String>,
    generation: u64,
}

impl Default for TopicWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicWorkflow {
    pub fn new() -> Self {
        Self {
            state: WorkflowState::Idle,
            topic: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    #[allow(dead_code)] // Observer accessor
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Submit a topic. Returns the generation token for this submission.
    ///
    /// Guarded: an empty topic, or a submit while the ack is still pending,
    /// is a no-op returning `None`. From `Ready`, `Error`, or while polling
    /// documents, resubmission is allowed; prior documents are discarded
    /// immediately and the generation bump orphans any in-flight events of
    /// the old topic.
    pub fn submit(&mut self, topic: &str) -> Option<u64> {
        if topic.trim().is_empty() {
            debug!("Ignoring submission of empty topic");
            return None;
        }
        if self.state == WorkflowState::Submitting {
            debug!("Ignoring submission while another is pending");
            return None;
        }

        self.generation += 1;
        self.topic = Some(topic.to_string());
        self.state = WorkflowState::Submitting;
        Some(self.generation)
    }

    /// Apply an event for the given submission generation.
    ///
    /// Returns false when the event was ignored: stale generation, or not
    /// meaningful in the current state.
    pub fn apply(&mut self, generation: u64, event: WorkflowEvent) -> bool {
        if generation != self.generation {
            warn!(
                "Ignoring event from superseded submission (generation {} vs {})",
                generation, self.generation
            );
            return false;
        }

        match (&self.state, event) {
            (WorkflowState::Submitting, WorkflowEvent::ServerAck { accepted: true, .. }) => {
                self.state = WorkflowState::FetchingDocuments;
                true
            }
            (WorkflowState::Submitting, WorkflowEvent::ServerAck { message, .. }) => {
                self.state = WorkflowState::Error(message);
                true
            }
            (WorkflowState::FetchingDocuments, WorkflowEvent::DocumentsReceived(documents)) => {
                self.state = WorkflowState::Ready(documents);
                true
            }
            (
                WorkflowState::Submitting | WorkflowState::FetchingDocuments,
                WorkflowEvent::NetworkFailure(message),
            ) => {
                self.state = WorkflowState::Error(message);
                true
            }
            (state, event) => {
                debug!("Event {:?} not applicable in state {:?}", event, state);
                false
            }
        }
    }

    /// Human-readable projection of the current state and topic.
    ///
    /// Purely derived; transition logic never consults it.
    pub fn status_line(&self) -> String {
        let topic = self.topic.as_deref().unwrap_or("");
        match &self.state {
            WorkflowState::Idle => {
                "Enter a topic to generate an intelligence briefing.".to_string()
            }
            WorkflowState::Submitting => {
                format!("Submitting analysis job for \"{}\"...", topic)
            }
            WorkflowState::FetchingDocuments => {
                format!(
                    "Analysis for \"{}\" accepted. Waiting for document results...",
                    topic
                )
            }
            WorkflowState::Ready(documents) => {
                format!("{} documents analyzed for \"{}\".", documents.len(), topic)
            }
            WorkflowState::Error(message) => format!("Error: {}", message),
        }
    }
}

/// Polling cadence for the document fetch loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between document polls.
    pub interval: Duration,
    /// Maximum number of polls before settling for what arrived.
    pub max_attempts: usize,
    /// Whether to show a progress spinner while polling.
    pub show_progress: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 12,
            show_progress: true,
        }
    }
}

/// Drive a full submit -> ack -> poll cycle against the backend.
///
/// The final state is readable from the workflow: `Ready` with the polled
/// documents (empty when the budget ran out before the backend produced
/// any), or `Error` for a rejected ack or transport failure. Received
/// documents are also committed to the shared session under the session
/// generation of this run, so a superseded run cannot overwrite them.
pub async fn run_submission(
    client: &ApiClient,
    workflow: &mut TopicWorkflow,
    session: &BriefingSession,
    session_generation: Generation,
    topic: &str,
    poll: &PollConfig,
) {
    let Some(generation) = workflow.submit(topic) else {
        return;
    };
    info!("{}", workflow.status_line());

    match client.submit_analysis(topic).await {
        Ok(ack) if ack.accepted() => {
            debug!("Submission accepted with status '{}'", ack.status);
            workflow.apply(
                generation,
                WorkflowEvent::ServerAck {
                    accepted: true,
                    message: ack.status,
                },
            );
        }
        Ok(ack) => {
            let message = ack
                .error
                .unwrap_or_else(|| format!("Backend rejected submission: {}", ack.status));
            workflow.apply(
                generation,
                WorkflowEvent::ServerAck {
                    accepted: false,
                    message,
                },
            );
            return;
        }
        Err(error) => {
            workflow.apply(generation, WorkflowEvent::NetworkFailure(error.to_string()));
            return;
        }
    }

    poll_documents(
        client,
        workflow,
        session,
        session_generation,
        topic,
        generation,
        poll,
    )
    .await;
}

/// Poll the documents endpoint until something arrives or the budget ends.
async fn poll_documents(
    client: &ApiClient,
    workflow: &mut TopicWorkflow,
    session: &BriefingSession,
    session_generation: Generation,
    topic: &str,
    generation: u64,
    poll: &PollConfig,
) {
    let spinner = if poll.show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(workflow.status_line());
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    } else {
        None
    };

    for attempt in 1..=poll.max_attempts {
        tokio::time::sleep(poll.interval).await;
        debug!("Document poll {}/{}", attempt, poll.max_attempts);

        match client.fetch_documents(topic).await {
            Ok(documents) if !documents.is_empty() => {
                session.commit_documents(session_generation, documents.clone());
                workflow.apply(generation, WorkflowEvent::DocumentsReceived(documents));
                break;
            }
            Ok(_) => {
                if let Some(ref bar) = spinner {
                    bar.set_message(format!(
                        "Waiting for document results ({}/{} polls)...",
                        attempt, poll.max_attempts
                    ));
                }
            }
            Err(error) => {
                workflow.apply(generation, WorkflowEvent::NetworkFailure(error.to_string()));
                break;
            }
        }
    }

    // Budget exhausted without results: the backend simply has nothing yet.
    if *workflow.state() == WorkflowState::FetchingDocuments {
        workflow.apply(generation, WorkflowEvent::DocumentsReceived(Vec::new()));
    }

    if let Some(bar) = spinner {
        bar.finish_with_message(workflow.status_line());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(title: &str) -> DocumentRecord {
        DocumentRecord {
            id: format!("arxiv:{}", title),
            title: title.to_string(),
            trl: Some(4),
            ..DocumentRecord::default()
        }
    }

    #[test]
    fn test_empty_topic_submit_is_no_op() {
        let mut workflow = TopicWorkflow::new();
        assert!(workflow.submit("").is_none());
        assert!(workflow.submit("   ").is_none());
        assert_eq!(*workflow.state(), WorkflowState::Idle);
    }

    #[test]
    fn test_submit_while_submitting_is_ignored() {
        let mut workflow = TopicWorkflow::new();
        let first = workflow.submit("quantum").unwrap();
        assert!(workflow.submit("fusion").is_none());
        assert_eq!(workflow.topic(), Some("quantum"));

        // The original submission is still live.
        assert!(workflow.apply(
            first,
            WorkflowEvent::ServerAck {
                accepted: true,
                message: "queued".to_string(),
            }
        ));
    }

    #[test]
    fn test_happy_path_to_ready() {
        let mut workflow = TopicWorkflow::new();
        let generation = workflow.submit("quantum").unwrap();

        workflow.apply(
            generation,
            WorkflowEvent::ServerAck {
                accepted: true,
                message: "queued".to_string(),
            },
        );
        assert_eq!(*workflow.state(), WorkflowState::FetchingDocuments);

        let documents = vec![sample_document("paper-a"), sample_document("paper-b")];
        workflow.apply(
            generation,
            WorkflowEvent::DocumentsReceived(documents.clone()),
        );
        assert_eq!(*workflow.state(), WorkflowState::Ready(documents));
    }

    #[test]
    fn test_failed_ack_goes_to_error_without_fetching() {
        let mut workflow = TopicWorkflow::new();
        let generation = workflow.submit("quantum").unwrap();

        workflow.apply(
            generation,
            WorkflowEvent::ServerAck {
                accepted: false,
                message: "backend unavailable".to_string(),
            },
        );

        assert_eq!(
            *workflow.state(),
            WorkflowState::Error("backend unavailable".to_string())
        );

        // A late document event for the same generation is meaningless now.
        assert!(!workflow.apply(
            generation,
            WorkflowEvent::DocumentsReceived(vec![sample_document("late")])
        ));
    }

    #[test]
    fn test_network_failure_during_poll() {
        let mut workflow = TopicWorkflow::new();
        let generation = workflow.submit("quantum").unwrap();

        workflow.apply(
            generation,
            WorkflowEvent::ServerAck {
                accepted: true,
                message: "queued".to_string(),
            },
        );
        workflow.apply(
            generation,
            WorkflowEvent::NetworkFailure("connection reset".to_string()),
        );

        assert_eq!(
            *workflow.state(),
            WorkflowState::Error("connection reset".to_string())
        );
    }

    #[test]
    fn test_resubmission_orphans_old_generation() {
        let mut workflow = TopicWorkflow::new();

        let gen_a = workflow.submit("topic A").unwrap();
        workflow.apply(
            gen_a,
            WorkflowEvent::ServerAck {
                accepted: true,
                message: "queued".to_string(),
            },
        );

        // New topic submitted while A is still polling.
        let gen_b = workflow.submit("topic B").unwrap();
        assert_eq!(workflow.topic(), Some("topic B"));

        // A's documents arrive late and must be dropped.
        assert!(!workflow.apply(
            gen_a,
            WorkflowEvent::DocumentsReceived(vec![sample_document("stale")])
        ));
        assert_eq!(*workflow.state(), WorkflowState::Submitting);

        // B proceeds normally; final state belongs to B alone.
        workflow.apply(
            gen_b,
            WorkflowEvent::ServerAck {
                accepted: true,
                message: "queued".to_string(),
            },
        );
        let b_docs = vec![sample_document("fresh")];
        workflow.apply(gen_b, WorkflowEvent::DocumentsReceived(b_docs.clone()));
        assert_eq!(*workflow.state(), WorkflowState::Ready(b_docs));
    }

    #[test]
    fn test_resubmission_from_error_recovers() {
        let mut workflow = TopicWorkflow::new();
        let generation = workflow.submit("quantum").unwrap();
        workflow.apply(
            generation,
            WorkflowEvent::NetworkFailure("timeout".to_string()),
        );
        assert!(matches!(workflow.state(), WorkflowState::Error(_)));

        assert!(workflow.submit("fusion").is_some());
        assert_eq!(*workflow.state(), WorkflowState::Submitting);
        assert_eq!(workflow.topic(), Some("fusion"));
    }

    #[tokio::test]
    async fn test_submission_transport_failure_surfaces_as_error() {
        // Nothing listens here; the POST fails and the workflow must end
        // in Error rather than panicking or polling.
        let client = crate::client::ApiClient::new("http://127.0.0.1:1", 1, 0).unwrap();
        let session = BriefingSession::new();
        let generation = session.begin("quantum radar").unwrap();
        let mut workflow = TopicWorkflow::new();
        let poll = PollConfig {
            interval: Duration::from_millis(1),
            max_attempts: 1,
            show_progress: false,
        };

        run_submission(
            &client,
            &mut workflow,
            &session,
            generation,
            "quantum radar",
            &poll,
        )
        .await;

        assert!(matches!(workflow.state(), WorkflowState::Error(_)));
        assert!(session.documents().is_empty());
    }

    #[test]
    fn test_status_line_projection() {
        let mut workflow = TopicWorkflow::new();
        assert!(workflow.status_line().contains("Enter a topic"));

        let generation = workflow.submit("quantum").unwrap();
        assert!(workflow.status_line().contains("quantum"));

        workflow.apply(
            generation,
            WorkflowEvent::ServerAck {
                accepted: true,
                message: "queued".to_string(),
            },
        );
        workflow.apply(generation, WorkflowEvent::DocumentsReceived(Vec::new()));
        assert_eq!(
            workflow.status_line(),
            "0 documents analyzed for \"quantum\"."
        );
    }
}

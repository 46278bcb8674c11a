//! Chat exchange controller: one submit, one request, one rendered outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::artifact::Artifact;
use crate::audio::AudioPlayer;
use crate::error::ChatError;
use crate::exchange::{ChatEndpoint, IncomingResponse, OutgoingRequest};
use crate::identity::IdentityProvider;
use crate::transcript::{ChatMessage, ExchangeId, Sender, Transcript};

/// Outcome of one exchange, delivered back to the UI task
pub type Completion = (ExchangeId, Result<IncomingResponse, ChatError>);

#[derive(Debug)]
struct PendingExchange {
    started: Instant,
}

pub struct ChatController {
    identity: IdentityProvider,
    artifact: Artifact,
    endpoint: Arc<dyn ChatEndpoint>,
    player: Arc<dyn AudioPlayer>,
    transcript: Transcript,
    pending: HashMap<ExchangeId, PendingExchange>,
    next_id: u64,
    completions: mpsc::UnboundedSender<Completion>,
}

impl ChatController {
    pub fn new(
        identity: IdentityProvider,
        artifact: Artifact,
        endpoint: Arc<dyn ChatEndpoint>,
        player: Arc<dyn AudioPlayer>,
        completions: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            identity,
            artifact,
            endpoint,
            player,
            transcript: Transcript::new(),
            pending: HashMap::new(),
            next_id: 1,
            completions,
        }
    }

    /// Take the input text, show it, and fire one request for it.
    ///
    /// The input is cleared and the user's entry appended before any network
    /// activity. Empty input is sent as-is. Must be called inside a Tokio runtime.
    pub fn on_submit(&mut self, input: &mut String) -> ExchangeId {
        let message = std::mem::take(input);
        let id = ExchangeId(self.next_id);
        self.next_id += 1;

        self.transcript.push(Sender::User, message.clone(), id);

        let request = OutgoingRequest::new(self.identity.user_id(), message, self.artifact);
        self.pending.insert(id, PendingExchange { started: Instant::now() });
        info!("Sending exchange {} ({} pending)", id, self.pending.len());

        let endpoint = Arc::clone(&self.endpoint);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = endpoint.send(&request).await;
            // Receiver gone means the UI shut down; nothing left to render into
            let _ = completions.send((id, result));
        });

        id
    }

    /// Render the outcome of an exchange. Returns false if `id` was not pending.
    pub fn on_completion(&mut self, id: ExchangeId, result: Result<IncomingResponse, ChatError>) -> bool {
        let Some(pending) = self.pending.remove(&id) else {
            warn!("Ignoring completion for unknown exchange {}", id);
            return false;
        };
        let elapsed = pending.started.elapsed();

        match result {
            Ok(response) => {
                info!("Exchange {} answered in {:?}", id, elapsed);
                if let Some(err) = &response.error {
                    warn!("Server reported an error for {}: {}", id, err);
                }

                self.transcript
                    .push(Sender::Artifact(self.artifact), response.reply_text(), id);

                if let (Some(url), Some(reply)) = (response.audio_url(), self.transcript.last()) {
                    self.player.play(url, reply);
                }
            }
            Err(e) => {
                error!("Exchange {} failed after {:?}: {}", id, elapsed, e);
                self.transcript.push(Sender::System, e.to_string(), id);
            }
        }

        true
    }

    pub fn is_sending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn artifact(&self) -> Artifact {
        self.artifact
    }
}

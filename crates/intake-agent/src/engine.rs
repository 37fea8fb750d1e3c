// SPDX-FileCopyrightText: 2026 Intake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation engine: applies routed actions against the channel, the
//! ticket gateway, the ticket counter and the session store.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use intake_config::model::ConversationConfig;
use intake_core::{
    ChannelAdapter, ConversationControl, InboundMessage, IntakeError, MediaPayload, NewTicket,
    ResolutionNotice, SessionSnapshot, TicketCounter, TicketGateway, TicketStatus, UserId,
    sheet_timestamp,
};

use crate::intent::classify;
use crate::locks::UserLocks;
use crate::machine::{Action, Origin, route};
use crate::messages::Replies;
use crate::session::{MemorySessionStore, NEW_TICKET_STATUS, Session, SessionStore, Stage};
use crate::shutdown::drain_handlers;

/// Minimum trimmed description length before a ticket is submitted.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Resolution recorded when a user closes a ticket from the menu.
pub const USER_CLOSE_RESOLUTION: &str = "Closed by user via WhatsApp";

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Timing and asset settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Upper bound on each gateway call and media download.
    pub gateway_timeout: Duration,
    /// Idle time after which the reaper drops a session.
    pub session_ttl: Duration,
    /// How often the reaper scans for idle sessions.
    pub reap_interval: Duration,
    /// Image sent with the welcome caption, if one is configured.
    pub intro_image: Option<PathBuf>,
}

impl From<&ConversationConfig> for EngineSettings {
    fn from(config: &ConversationConfig) -> Self {
        Self {
            gateway_timeout: Duration::from_secs(config.gateway_timeout_secs),
            session_ttl: Duration::from_secs(config.session_ttl_secs),
            reap_interval: Duration::from_secs(config.reap_interval_secs),
            intro_image: config.intro_image_path.as_ref().map(PathBuf::from),
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Drives every user's conversation.
///
/// Handlers for one user never overlap: each message and each resolution
/// notice runs under that user's lock.
pub struct ConversationEngine {
    channel: Arc<dyn ChannelAdapter>,
    gateway: Arc<dyn TicketGateway>,
    counter: Arc<dyn TicketCounter>,
    sessions: Arc<dyn SessionStore>,
    locks: UserLocks,
    replies: Replies,
    settings: EngineSettings,
}

impl ConversationEngine {
    /// Creates an engine with an in-memory session store.
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        gateway: Arc<dyn TicketGateway>,
        counter: Arc<dyn TicketCounter>,
        config: &ConversationConfig,
    ) -> Self {
        info!(brand = config.brand_name.as_str(), "conversation engine initialized");
        Self {
            channel,
            gateway,
            counter,
            sessions: Arc::new(MemorySessionStore::new()),
            locks: UserLocks::new(),
            replies: Replies::new(config),
            settings: EngineSettings::from(config),
        }
    }

    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn replies(&self) -> &Replies {
        &self.replies
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Handles one inbound message to completion.
    pub async fn handle_message(&self, msg: InboundMessage) -> Result<(), IntakeError> {
        if msg.is_group_or_broadcast_or_status() {
            debug!(from = %msg.from, "ignoring group, broadcast or status message");
            return Ok(());
        }

        let user = msg.from.clone();
        let _guard = self.locks.acquire(&user).await;

        let session = self.sessions.get(&user).await?;
        let stage = session.as_ref().map(|s| s.stage);
        let intent = classify(stage, &msg.body);
        let listed = session.as_ref().map_or(0, |s| s.existing_tickets.len());
        let action = route(stage, intent, listed);
        debug!(%user, ?stage, ?intent, ?action, "dispatching message");

        self.apply(action, &user, &msg, session).await
    }

    async fn apply(
        &self,
        action: Action,
        user: &UserId,
        msg: &InboundMessage,
        session: Option<Session>,
    ) -> Result<(), IntakeError> {
        match action {
            Action::Greet => self.greet(user).await,
            Action::Instruct => {
                self.say(user, &self.replies.instructions()).await;
                Ok(())
            }
            Action::Stop => self.stop(user, session).await,
            Action::Restart => self.restart(user).await,
            Action::BeginTicket(origin) => self.begin_ticket(user, origin).await,
            Action::DeclineStart => {
                self.sessions.delete(user).await?;
                self.say(user, &self.replies.declined()).await;
                Ok(())
            }
            Action::RecordSchoolCode => {
                let mut session = require(session)?;
                session.details.school_code = msg.body.trim().to_uppercase();
                session.stage = Stage::AwaitStudentPin;
                self.sessions.put(user, session).await?;
                self.say(user, &self.replies.ask_student_pin()).await;
                Ok(())
            }
            Action::RecordStudentPin => {
                let mut session = require(session)?;
                session.details.student_id = msg.body.trim().to_string();
                session.stage = Stage::AwaitDetailsAndMedia;
                self.sessions.put(user, session).await?;
                self.say(user, &self.replies.ask_details()).await;
                Ok(())
            }
            Action::AppendDetails => self.append_details(user, msg, require(session)?).await,
            Action::ShowCloseList => {
                let mut session = require(session)?;
                let text = self.replies.close_list(&session.existing_tickets);
                session.stage = Stage::AwaitCloseSelection;
                self.sessions.put(user, session).await?;
                self.say(user, &text).await;
                Ok(())
            }
            Action::ShowStatusReport => {
                let session = require(session)?;
                self.sessions.delete(user).await?;
                self.say(user, &self.replies.status_report(&session.existing_tickets))
                    .await;
                Ok(())
            }
            Action::CloseSelected(index) => self.close_selected(user, require(session)?, index).await,
            Action::ExitFromStop => {
                self.sessions.delete(user).await?;
                self.say(user, &self.replies.farewell()).await;
                Ok(())
            }
            Action::ConfirmResolved => self.confirm_resolved(user, require(session)?).await,
            Action::ReopenTicket => self.reopen(user, require(session)?).await,
            Action::RecordReopenReason => {
                self.record_reopen_reason(user, msg, require(session)?).await
            }
            reprompt => {
                self.sessions.touch(user).await?;
                let text = match reprompt {
                    Action::RepromptConfirm => self.replies.confirm_reprompt().to_string(),
                    Action::RepromptSchoolCode => self.replies.school_code_empty(),
                    Action::RepromptStudentPin => self.replies.student_pin_empty(),
                    Action::RepromptExistingChoice => {
                        self.replies.existing_choice_reprompt().to_string()
                    }
                    Action::RepromptCloseSelection => {
                        self.replies.close_selection_reprompt().to_string()
                    }
                    Action::RepromptStopChoice => self.replies.stop_choice_reprompt().to_string(),
                    Action::RepromptNumericConfirmation => {
                        self.replies.numeric_confirmation_reprompt().to_string()
                    }
                    Action::RepromptReopenReason => self.replies.reopen_reason_empty().to_string(),
                    other => {
                        return Err(IntakeError::Internal(format!(
                            "unhandled action {other:?}"
                        )));
                    }
                };
                self.say(user, &text).await;
                Ok(())
            }
        }
    }

    async fn greet(&self, user: &UserId) -> Result<(), IntakeError> {
        let tickets = match self.bounded(self.gateway.list_tickets_for_user(user)).await {
            Ok(tickets) => tickets,
            Err(e) => {
                warn!(%user, error = %e, "ticket lookup failed, greeting as a new user");
                Vec::new()
            }
        };
        let active: Vec<_> = tickets.into_iter().filter(|t| t.status.is_active()).collect();

        if active.is_empty() {
            self.sessions.put(user, Session::new(Stage::ConfirmStart)).await?;
            self.send_intro(user).await;
        } else {
            let text = self.replies.active_ticket_menu(&active);
            debug!(%user, active = active.len(), "user has active tickets");
            self.sessions.put(user, Session::choosing(active)).await?;
            self.say(user, &text).await;
        }
        Ok(())
    }

    async fn send_intro(&self, user: &UserId) {
        let caption = self.replies.intro_caption();
        if let Some(path) = &self.settings.intro_image {
            match tokio::fs::read(path).await {
                Ok(bytes) => {
                    let media = MediaPayload {
                        mime_type: mime_for(path).to_string(),
                        data: STANDARD.encode(bytes),
                        filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                    };
                    match self.channel.send_media(user, &media, &caption).await {
                        Ok(_) => return,
                        Err(e) => warn!(%user, error = %e, "intro image delivery failed"),
                    }
                }
                Err(e) => warn!(path = %path.display(), error = %e, "intro image unreadable"),
            }
        }
        self.say(user, &caption).await;
    }

    async fn begin_ticket(&self, user: &UserId, origin: Origin) -> Result<(), IntakeError> {
        let ticket_id = self.counter.reserve_or_issue(user).await?;
        let text = match origin {
            Origin::Welcome => self.replies.ticket_started(&ticket_id),
            Origin::Menu => self.replies.ticket_started_from_menu(&ticket_id),
        };
        info!(%user, %ticket_id, "ticket flow started");
        self.sessions.put(user, Session::drafting(ticket_id)).await?;
        self.say(user, &text).await;
        Ok(())
    }

    /// Release the reservation held by an abandoned intake flow.
    async fn release_held(&self, user: &UserId, session: Option<&Session>) {
        let holds = session.is_some_and(|s| s.stage.holds_reservation() && s.ticket_id.is_some());
        if holds {
            self.release_reservation(user).await;
        }
    }

    /// Drop whatever id `user` has reserved, including one kept after a failed create.
    async fn release_reservation(&self, user: &UserId) {
        match self.counter.release(user).await {
            Ok(outcome) => debug!(%user, ?outcome, "reservation released"),
            Err(e) => warn!(%user, error = %e, "failed to release reserved ticket id"),
        }
    }

    async fn stop(&self, user: &UserId, session: Option<Session>) -> Result<(), IntakeError> {
        self.release_reservation(user).await;
        self.sessions
            .put(user, Session::stopped(session.as_ref()))
            .await?;
        info!(%user, "conversation stopped");
        self.say(user, self.replies.stop_menu()).await;
        Ok(())
    }

    async fn restart(&self, user: &UserId) -> Result<(), IntakeError> {
        self.release_reservation(user).await;
        let ticket_id = self.counter.reserve_or_issue(user).await?;
        info!(%user, %ticket_id, "conversation restarted");
        let text = self.replies.restarted(&ticket_id);
        self.sessions.put(user, Session::drafting(ticket_id)).await?;
        self.say(user, &text).await;
        Ok(())
    }

    async fn append_details(
        &self,
        user: &UserId,
        msg: &InboundMessage,
        mut session: Session,
    ) -> Result<(), IntakeError> {
        let text = msg.body.trim();
        if !text.is_empty() {
            let description = &mut session.details.issue_description;
            if !description.is_empty() {
                description.push('\n');
            }
            description.push_str(text);
        }

        if msg.has_media {
            match self.bounded(self.channel.download_media(msg)).await {
                Ok(media) => {
                    session.details.screenshot_url = media.to_data_url();
                    self.say(user, self.replies.media_received()).await;
                }
                Err(e) => {
                    warn!(%user, error = %e, "media download failed");
                    self.say(user, self.replies.media_failed()).await;
                }
            }
        }

        if session.details.issue_description.trim().chars().count() < MIN_DESCRIPTION_CHARS {
            self.sessions.put(user, session).await?;
            self.say(user, &self.replies.description_too_short()).await;
            return Ok(());
        }

        self.submit(user, session).await
    }

    async fn submit(&self, user: &UserId, session: Session) -> Result<(), IntakeError> {
        let ticket_id = session
            .ticket_id
            .clone()
            .ok_or_else(|| IntakeError::Internal("intake session without a ticket id".into()))?;
        let ticket = NewTicket {
            ticket_id: ticket_id.clone(),
            raised_by: user.clone(),
            reporting_date: sheet_timestamp(),
            school_code: session.details.school_code.clone(),
            student_pin: session.details.student_id.clone(),
            issue_description: session.details.issue_description.clone(),
            screenshot_url: session.details.screenshot_url.clone(),
            status: session
                .status
                .clone()
                .unwrap_or_else(|| NEW_TICKET_STATUS.to_string()),
        };

        match self.bounded(self.gateway.create(&ticket)).await {
            Ok(()) => {
                if let Err(e) = self.counter.finalize(user).await {
                    warn!(%user, %ticket_id, error = %e, "failed to finalize reservation");
                }
                info!(%user, %ticket_id, "ticket created");
                self.say(user, &self.replies.ticket_created(&ticket_id, &session.details))
                    .await;
            }
            Err(e) => {
                error!(%user, %ticket_id, error = %e, "ticket creation failed");
                self.say(user, &self.replies.ticket_create_failed(&ticket_id))
                    .await;
            }
        }
        self.sessions.delete(user).await?;
        Ok(())
    }

    async fn close_selected(
        &self,
        user: &UserId,
        session: Session,
        index: usize,
    ) -> Result<(), IntakeError> {
        let ticket = session
            .existing_tickets
            .get(index)
            .ok_or_else(|| IntakeError::Internal(format!("close selection {index} out of range")))?;
        let ticket_id = ticket.ticket_id.clone();

        let update = self.gateway.update_status(&ticket_id, &TicketStatus::Closed, USER_CLOSE_RESOLUTION);
        if let Err(e) = self.bounded(update).await {
            return self.update_failed(user, &ticket_id, e).await;
        }
        info!(%user, %ticket_id, "ticket closed by user");
        self.sessions.delete(user).await?;
        self.say(user, &self.replies.ticket_closed(&ticket_id)).await;
        Ok(())
    }

    async fn confirm_resolved(&self, user: &UserId, session: Session) -> Result<(), IntakeError> {
        let ticket_id = resolved_ticket(&session)?;
        let resolution = session.resolution.clone().unwrap_or_default();

        let update = self.gateway.update_status(&ticket_id, &TicketStatus::Closed, &resolution);
        if let Err(e) = self.bounded(update).await {
            return self.update_failed(user, &ticket_id, e).await;
        }
        info!(%user, %ticket_id, "resolution confirmed, ticket closed");
        self.sessions.delete(user).await?;
        self.say(user, self.replies.resolution_confirmed()).await;
        Ok(())
    }

    async fn reopen(&self, user: &UserId, mut session: Session) -> Result<(), IntakeError> {
        let ticket_id = resolved_ticket(&session)?;

        let update = self.gateway.update_status(&ticket_id, &TicketStatus::Reopened, "");
        if let Err(e) = self.bounded(update).await {
            return self.update_failed(user, &ticket_id, e).await;
        }
        info!(%user, %ticket_id, "ticket reopened");
        session.stage = Stage::AwaitReopenReason;
        self.sessions.put(user, session).await?;
        self.say(user, self.replies.ask_reopen_reason()).await;
        Ok(())
    }

    async fn record_reopen_reason(
        &self,
        user: &UserId,
        msg: &InboundMessage,
        session: Session,
    ) -> Result<(), IntakeError> {
        let ticket_id = resolved_ticket(&session)?;
        let reason = msg.body.trim();
        let timestamp = sheet_timestamp();

        let append = self.gateway.append_reopen_reason(&ticket_id, reason, &timestamp);
        if let Err(e) = self.bounded(append).await {
            return self.update_failed(user, &ticket_id, e).await;
        }
        info!(%user, %ticket_id, "reopen reason recorded");
        self.sessions.delete(user).await?;
        self.say(user, &self.replies.reopen_recorded()).await;
        Ok(())
    }

    /// Tell the user an update did not go through. The session is kept at its
    /// current stage so the same answer can be sent again.
    async fn update_failed(
        &self,
        user: &UserId,
        ticket_id: &str,
        err: IntakeError,
    ) -> Result<(), IntakeError> {
        error!(%user, %ticket_id, error = %err, "ticket update failed");
        self.sessions.touch(user).await?;
        self.say(user, &self.replies.update_failed(ticket_id)).await;
        Ok(())
    }

    /// Delivery failures are logged, never propagated: the state change they
    /// follow has already happened.
    async fn say(&self, user: &UserId, text: &str) {
        if let Err(e) = self.channel.send_text(user, text).await {
            error!(%user, error = %e, "failed to deliver reply");
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, IntakeError>>,
    ) -> Result<T, IntakeError> {
        let duration = self.settings.gateway_timeout;
        match tokio::time::timeout(duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(IntakeError::Timeout { duration }),
        }
    }

    /// Removes sessions idle past the TTL and releases any ids they held.
    ///
    /// Returns how many sessions were reaped.
    pub async fn reap_idle(&self) -> Result<usize, IntakeError> {
        let ttl = self.settings.session_ttl;
        let mut reaped = 0;
        for user in self.sessions.idle_users(ttl).await? {
            let _guard = self.locks.acquire(&user).await;
            // Re-checked under the lock: a message may have arrived meanwhile.
            let Some(session) = self.sessions.remove_if_idle(&user, ttl).await? else {
                continue;
            };
            reaped += 1;
            self.release_held(&user, Some(&session)).await;
            debug!(%user, stage = %session.stage, "reaped idle session");
        }
        let pruned = self.locks.prune();
        if reaped > 0 || pruned > 0 {
            info!(reaped, pruned_locks = pruned, "session reaper pass complete");
        }
        Ok(reaped)
    }

    /// Runs [`reap_idle`](Self::reap_idle) every `reap_interval` until cancelled.
    pub fn spawn_reaper(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(engine.settings.reap_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = engine.reap_idle().await {
                            warn!(error = %e, "session reaper pass failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        debug!("session reaper stopped");
                        break;
                    }
                }
            }
        })
    }

    /// Receives messages until `cancel` fires or the channel closes.
    ///
    /// Each message is handled on its own task; per-user locks keep one
    /// user's messages in order. In-flight handlers are drained on exit.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), IntakeError> {
        info!("conversation loop running");
        let tracker = TaskTracker::new();
        let reaper_cancel = cancel.child_token();
        let reaper = self.spawn_reaper(reaper_cancel.clone());

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            let engine = Arc::clone(&self);
                            tracker.spawn(async move {
                                let from = inbound.from.clone();
                                if let Err(e) = engine.handle_message(inbound).await {
                                    error!(user = %from, error = %e, "failed to handle inbound message");
                                }
                            });
                        }
                        Err(e) => {
                            if e.to_string().contains("closed") {
                                info!("channel closed, stopping conversation loop");
                                break;
                            }
                            error!(error = %e, "channel receive error");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping conversation loop");
                    break;
                }
            }
        }

        drain_handlers(&tracker, DRAIN_TIMEOUT).await;
        reaper_cancel.cancel();
        if let Err(e) = reaper.await {
            warn!(error = %e, "session reaper task failed");
        }
        info!("conversation loop stopped");
        Ok(())
    }
}

fn require(session: Option<Session>) -> Result<Session, IntakeError> {
    session.ok_or_else(|| IntakeError::Internal("action routed without a session".into()))
}

fn resolved_ticket(session: &Session) -> Result<String, IntakeError> {
    session
        .ticket_id
        .clone()
        .ok_or_else(|| IntakeError::Internal("resolution session without a ticket id".into()))
}

#[async_trait]
impl ConversationControl for ConversationEngine {
    async fn ingest_resolution(&self, notice: ResolutionNotice) -> Result<(), IntakeError> {
        let user = notice.user_phone.clone();
        let _guard = self.locks.acquire(&user).await;

        let details = match self.bounded(self.gateway.get_details(&notice.ticket_id)).await {
            Ok(details) => details,
            Err(e) => {
                warn!(ticket_id = %notice.ticket_id, error = %e, "ticket details lookup failed");
                None
            }
        };
        let text =
            self.replies
                .resolution_notice(&notice.ticket_id, details.as_ref(), &notice.resolution);
        self.channel.send_text(&user, &text).await?;

        // Any in-flight conversation is replaced.
        let previous = self.sessions.get(&user).await?;
        self.release_held(&user, previous.as_ref()).await;
        self.sessions
            .put(
                &user,
                Session::awaiting_confirmation(notice.ticket_id.clone(), notice.resolution),
            )
            .await?;
        info!(%user, ticket_id = %notice.ticket_id, "resolution delivered, awaiting confirmation");
        Ok(())
    }

    async fn active_sessions(&self) -> Result<Vec<SessionSnapshot>, IntakeError> {
        self.sessions.snapshot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let config = ConversationConfig {
            gateway_timeout_secs: 7,
            intro_image_path: Some("logo.png".into()),
            ..ConversationConfig::default()
        };
        let settings = EngineSettings::from(&config);
        assert_eq!(settings.gateway_timeout, Duration::from_secs(7));
        assert_eq!(settings.session_ttl, Duration::from_secs(1800));
        assert_eq!(settings.intro_image, Some(PathBuf::from("logo.png")));
    }

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(mime_for(Path::new("a/logo.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("logo.jpeg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("logo")), "application/octet-stream");
    }

    #[test]
    fn timestamp_has_sheet_shape() {
        let ts = sheet_timestamp();
        let (date, time) = ts.split_once(", ").unwrap();
        assert_eq!(date.split('/').count(), 3);
        assert_eq!(time.len(), 8);
    }
}

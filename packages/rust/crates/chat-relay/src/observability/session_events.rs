#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum SessionEvent {
    SessionBackendEnabled,
    SessionValkeyConnected,
    SessionValkeyCommandFailed,
    SessionMessagesAppended,
    SessionMessagesLoaded,
    SessionMessagesCleared,
    SessionPayloadInvalid,
    SessionSystemPromptSeeded,
    RelayTurnStarted,
    RelayTurnCompleted,
    RelayTurnFailed,
    RelayCompletionRequested,
    RelayCompletionFailed,
}

impl SessionEvent {
    #[allow(dead_code)]
    pub(crate) const ALL: [Self; 13] = [
        Self::SessionBackendEnabled,
        Self::SessionValkeyConnected,
        Self::SessionValkeyCommandFailed,
        Self::SessionMessagesAppended,
        Self::SessionMessagesLoaded,
        Self::SessionMessagesCleared,
        Self::SessionPayloadInvalid,
        Self::SessionSystemPromptSeeded,
        Self::RelayTurnStarted,
        Self::RelayTurnCompleted,
        Self::RelayTurnFailed,
        Self::RelayCompletionRequested,
        Self::RelayCompletionFailed,
    ];

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::SessionBackendEnabled => "session.backend.enabled",
            Self::SessionValkeyConnected => "session.valkey.connected",
            Self::SessionValkeyCommandFailed => "session.valkey.command_failed",
            Self::SessionMessagesAppended => "session.messages.appended",
            Self::SessionMessagesLoaded => "session.messages.loaded",
            Self::SessionMessagesCleared => "session.messages.cleared",
            Self::SessionPayloadInvalid => "session.payload.invalid",
            Self::SessionSystemPromptSeeded => "session.system_prompt.seeded",
            Self::RelayTurnStarted => "relay.turn.started",
            Self::RelayTurnCompleted => "relay.turn.completed",
            Self::RelayTurnFailed => "relay.turn.failed",
            Self::RelayCompletionRequested => "relay.completion.requested",
            Self::RelayCompletionFailed => "relay.completion.failed",
        }
    }
}

//! Startup orchestration.
//!
//! # Responsibilities
//! - Bundle the collaborators the classifiers depend on
//! - Register every enabled classifier with its configured priority
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A classifier whose optional collaborator is missing is still registered;
//!   it reports `Unclaimable` for traffic it recognises

use std::sync::Arc;
use std::time::Duration;

use crate::classify::{
    BasicAuthClassifier, BearerClassifier, CallbackRoute, ClassifierId, ClassifierRegistry,
    ShareLinkClassifier, SsoCallbackClassifier, TenantResolver,
};
use crate::config::{ClassifiersConfig, RemoteConfig};
use crate::services::{
    CredentialVerifier, HexShareTokenCodec, InMemoryReservationStore, InMemorySessionStore,
    RemoteCollaborators, ReservationLookup, SchemaDirectory, SessionLookup, ShareTokenCodec,
    TokenValidator,
};

/// Everything the built-in classifiers call out to.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn SchemaDirectory>,
    pub sessions: Arc<dyn SessionLookup>,
    pub verifier: Option<Arc<dyn CredentialVerifier>>,
    pub tokens: Option<Arc<dyn TokenValidator>>,
    pub reservations: Arc<dyn ReservationLookup>,
    pub share_codec: Arc<dyn ShareTokenCodec>,
}

impl Collaborators {
    /// Single-node wiring: in-memory stores, hex share tokens, no credential
    /// verifier and no token validator.
    pub fn local(directory: Arc<dyn SchemaDirectory>) -> Self {
        Self {
            directory,
            sessions: Arc::new(InMemorySessionStore::new()),
            verifier: None,
            tokens: None,
            reservations: Arc::new(InMemoryReservationStore::new()),
            share_codec: Arc::new(HexShareTokenCodec),
        }
    }

    /// Local wiring with every collaborator named in `remote` replaced by its
    /// HTTP implementation.
    pub fn from_config(
        directory: Arc<dyn SchemaDirectory>,
        remote: &RemoteConfig,
    ) -> Result<Self, url::ParseError> {
        let remote = RemoteCollaborators::from_config(remote)?;
        tracing::info!(
            sessions = remote.sessions.is_some(),
            verifier = remote.verifier.is_some(),
            tokens = remote.tokens.is_some(),
            reservations = remote.reservations.is_some(),
            "Remote collaborators configured"
        );

        let mut collaborators = Self::local(directory);
        if let Some(sessions) = remote.sessions {
            collaborators.sessions = Arc::new(sessions);
        }
        if let Some(verifier) = remote.verifier {
            collaborators.verifier = Some(Arc::new(verifier));
        }
        if let Some(tokens) = remote.tokens {
            collaborators.tokens = Some(Arc::new(tokens));
        }
        if let Some(reservations) = remote.reservations {
            collaborators.reservations = Arc::new(reservations);
        }
        Ok(collaborators)
    }
}

/// What `register_classifiers` installed.
#[derive(Default)]
pub struct InstalledClassifiers {
    pub ids: Vec<ClassifierId>,
    /// Handed to the admin API, which adds and removes protocol paths at runtime.
    pub basic_auth: Option<Arc<BasicAuthClassifier>>,
}

/// Register the classifiers enabled in `config`.
pub fn register_classifiers(
    registry: &ClassifierRegistry,
    config: &ClassifiersConfig,
    collaborators: &Collaborators,
) -> InstalledClassifiers {
    let timeout = Duration::from_millis(config.collaborator_timeout_ms);
    let tenants = TenantResolver::new(collaborators.directory.clone(), timeout);
    let mut installed = InstalledClassifiers::default();

    if config.sso.enabled {
        let route = CallbackRoute {
            login_path: config.sso.login_path.clone(),
            action_param: config.sso.action_param.clone(),
            action: config.sso.action.clone(),
            token_param: config.sso.token_param.clone(),
        };
        let classifier = SsoCallbackClassifier::new(
            route,
            collaborators.reservations.clone(),
            tenants.clone(),
            timeout,
        );
        installed
            .ids
            .push(registry.register(Arc::new(classifier), config.sso.priority));
    }

    if config.share.enabled {
        let classifier = ShareLinkClassifier::new(
            config.share.prefix.clone(),
            collaborators.share_codec.clone(),
            tenants.clone(),
        );
        installed
            .ids
            .push(registry.register(Arc::new(classifier), config.share.priority));
    }

    if config.bearer.enabled {
        if collaborators.tokens.is_none() {
            tracing::warn!("No token validator configured, bearer requests will be unclaimable");
        }
        let classifier = BearerClassifier::new(collaborators.tokens.clone(), tenants.clone(), timeout);
        installed
            .ids
            .push(registry.register(Arc::new(classifier), config.bearer.priority));
    }

    if config.basic_auth.enabled {
        let classifier = Arc::new(
            BasicAuthClassifier::new(
                collaborators.sessions.clone(),
                collaborators.verifier.clone(),
                tenants,
                timeout,
            )
            .with_paths(config.basic_auth.paths.iter().cloned()),
        );
        installed
            .ids
            .push(registry.register(classifier.clone(), config.basic_auth.priority));
        installed.basic_auth = Some(classifier);
    }

    tracing::info!(count = installed.ids.len(), "Classifiers registered");
    installed
}

use crate::{
    error::SyncError,
    remote::{client::CollectorClient, delivery::Forwarder, period::PeriodResolver},
    server::{self, ServerState},
    sync::{cycle::PushCycle, scheduler::SyncLoop},
};
use axum::Router;
use connectors::{
    adapter::Adapter, extract::Extractor, sql::base::query::template::FileTemplateProvider,
};
use engine_config::{
    error::SettingsError,
    settings::{PullSettings, PushSettings, Settings, SourceSettings},
};
use std::sync::Arc;

/// The extractor for the configured source. No connection is opened yet.
pub fn create_extractor(source: &SourceSettings) -> Arc<Extractor> {
    Arc::new(Extractor::new(
        Adapter::sql(source.kind, &source.connection),
        Arc::new(FileTemplateProvider::new(&source.query_file)),
        source.filter.clone(),
        source.strategy.clone(),
    ))
}

pub fn create_sync_loop(settings: &Settings) -> Result<SyncLoop, SyncError> {
    let push = push_settings(settings)?;
    let client = Arc::new(CollectorClient::from_settings(push).map_err(SyncError::Client)?);

    let cycle = PushCycle::new(
        PeriodResolver::new(client.clone(), &push.period_url, settings.retry.clone()),
        create_extractor(&settings.source),
        Forwarder::new(client, &push.delivery_url, settings.retry.clone()),
        settings.retry.clone(),
        push.page_size,
    );

    Ok(SyncLoop::new(cycle, push.activation_time))
}

pub fn create_router(settings: &Settings) -> Result<Router, SyncError> {
    let pull = pull_settings(settings)?;
    let state = ServerState::new(create_extractor(&settings.source), &pull.credential_token);
    Ok(server::router(state, pull.handler_timeout))
}

pub(crate) fn push_settings(settings: &Settings) -> Result<&PushSettings, SyncError> {
    settings
        .push
        .as_ref()
        .ok_or_else(|| missing_section("push"))
}

pub(crate) fn pull_settings(settings: &Settings) -> Result<&PullSettings, SyncError> {
    settings
        .pull
        .as_ref()
        .ok_or_else(|| missing_section("pull"))
}

fn missing_section(mode: &str) -> SyncError {
    SyncError::Settings(SettingsError::Configuration(format!(
        "{mode} settings are not configured"
    )))
}

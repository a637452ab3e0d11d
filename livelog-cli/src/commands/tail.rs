//! Follow an instance console.

use anyhow::{Context, Result};
use livelog_client::{
    ConnectionStatus, ConsoleSubscriber, HttpBufferFetcher, HttpPrincipalSource, LogRecord,
    LogSequence, PrincipalSource, WebSocketConnector,
};
use livelog_types::IdempotencyKey;
use std::collections::HashSet;
use std::process::ExitCode;
use tokio::sync::watch;

use crate::config::Config;

/// Run the tail command.
pub async fn run(config: &Config, instance: &str) -> Result<ExitCode> {
    let mut context = config.context();
    context.principal = HttpPrincipalSource::new()
        .principal(&context)
        .await
        .context("Failed to fetch user info")?;
    if context.principal.is_none() {
        tracing::warn!("no authenticated user; check the token");
    }
    let context = context.ready();

    let (_context_tx, context_rx) = watch::channel(context);
    let subscriber = ConsoleSubscriber::new(
        WebSocketConnector::new(),
        HttpBufferFetcher::new(config.buffer.format),
        context_rx,
    );
    let mut subscription = subscriber.subscribe(instance);

    let mut printed = Printed::default();
    let mut last_status = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let code = loop {
        let view = subscription.view();
        for record in printed.fresh(&view.log) {
            println!("{}", record);
        }
        if last_status != Some(view.status) {
            eprintln!("-- {} --", view.status);
            last_status = Some(view.status);
        }
        if let Some(code) = exit_status(view.status) {
            break code;
        }

        tokio::select! {
            changed = subscription.changed() => {
                if !changed {
                    break 1;
                }
            }
            _ = &mut ctrl_c => break 0,
        }
    };

    subscription.unsubscribe().await;
    Ok(ExitCode::from(code))
}

/// Exit status for a status the command stops at.
fn exit_status(status: ConnectionStatus) -> Option<u8> {
    if !status.is_terminal() {
        return None;
    }
    Some(match status {
        ConnectionStatus::Closed => 0,
        ConnectionStatus::NoPermission => 2,
        _ => 1,
    })
}

/// Keys already written to the terminal.
///
/// History can land in front of lines already printed; those records are
/// printed when they arrive rather than reordering the terminal.
#[derive(Debug, Default)]
struct Printed {
    keys: HashSet<IdempotencyKey>,
}

impl Printed {
    fn fresh<'a>(&mut self, log: &'a LogSequence) -> Vec<&'a LogRecord> {
        log.iter()
            .filter(|record| self.keys.insert(record.idempotency_key.clone()))
            .collect()
    }
}

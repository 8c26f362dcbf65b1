use std::fs;
use std::path::Path;

use anyhow::Context;
use lightquote_core::config::{AppConfig, LoadOptions};
use lightquote_core::{Notification, WizardAction, WizardContext};
use lightquote_webhooks::{
    CallReport, ExtractionClient, ExtractionService, IntakeRuntime, RecordingSink,
    SubmissionClient, SubmissionSink,
};
use serde::Serialize;
use serde_json::json;

use crate::commands::{current_thread_runtime, CommandResult};

/// What happened to one scripted action.
#[derive(Debug, Serialize)]
struct ReplayStep {
    action: &'static str,
    applied: bool,
    step: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    notifications: Vec<Notification>,
    calls: Vec<CallReport>,
}

pub fn run(script_path: &Path, offline: bool) -> CommandResult {
    let actions = match read_script(script_path) {
        Ok(actions) => actions,
        Err(error) => {
            return CommandResult::failure("replay", "invalid_script", format!("{error:#}"), 2)
        }
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "replay",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match current_thread_runtime("replay") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let http = reqwest::Client::new();
    let extraction = ExtractionClient::from_config(http.clone(), &config);
    let payload = runtime.block_on(async {
        if offline {
            let mut intake = IntakeRuntime::new(extraction, RecordingSink::default());
            let steps = replay(&mut intake, actions).await;
            let recorded = intake.submission_sink().recorded().await;
            let session = intake.into_session();
            json!({ "steps": steps, "session": session, "recorded_submissions": recorded })
        } else {
            let submission = SubmissionClient::from_config(http, &config);
            let mut intake = IntakeRuntime::new(extraction, submission);
            let steps = replay(&mut intake, actions).await;
            json!({ "steps": steps, "session": intake.into_session() })
        }
    });

    let final_step = payload["session"]["state"]["step"].as_u64().unwrap_or_default();
    CommandResult::success_with_data(
        "replay",
        format!("replayed script; wizard is at step {final_step}"),
        Some(payload),
    )
}

async fn replay<E, S>(intake: &mut IntakeRuntime<E, S>, actions: Vec<WizardAction>) -> Vec<ReplayStep>
where
    E: ExtractionService,
    S: SubmissionSink,
{
    let mut steps = Vec::with_capacity(actions.len());
    for action in actions {
        let context = WizardContext::current();
        let name = action.name();
        let step = match intake.dispatch(action, &context).await {
            Ok(outcome) => ReplayStep {
                action: name,
                applied: true,
                step: intake.step().number(),
                error: None,
                notifications: outcome.notifications,
                calls: outcome.calls,
            },
            Err(error) => ReplayStep {
                action: name,
                applied: false,
                step: intake.step().number(),
                notifications: vec![error.notification()],
                error: Some(error.to_string()),
                calls: Vec::new(),
            },
        };
        steps.push(step);
    }
    steps
}

fn read_script(path: &Path) -> anyhow::Result<Vec<WizardAction>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read script `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("script `{}` is not a list of wizard actions", path.display()))
}

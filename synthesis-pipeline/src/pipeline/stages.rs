use common::error::AppError;
use state_machines::core::GuardError;
use tracing::{debug, instrument};

use super::{
    context::SynthesisContext,
    state::{Critiqued, Drafted, Ready, Revised, SynthesisMachine},
};
use crate::prompts;

#[instrument(level = "trace", skip_all, fields(stage = "draft"))]
pub async fn draft(
    machine: SynthesisMachine<(), Ready>,
    ctx: &mut SynthesisContext<'_>,
) -> Result<SynthesisMachine<(), Drafted>, AppError> {
    let system = prompts::draft_system(&ctx.config.persona_name);
    let user = prompts::draft_user(&ctx.context_text, ctx.query.as_str());
    let draft = call_oracle(ctx, "draft", &system, user, ctx.config.draft_temperature).await?;

    debug!(draft_chars = draft.chars().count(), "synthesis draft ready");
    ctx.draft = Some(draft);

    machine
        .draft()
        .map_err(|(_, guard)| map_guard_error("draft", &guard))
}

#[instrument(level = "trace", skip_all, fields(stage = "critique"))]
pub async fn critique(
    machine: SynthesisMachine<(), Drafted>,
    ctx: &mut SynthesisContext<'_>,
) -> Result<SynthesisMachine<(), Critiqued>, AppError> {
    let system = prompts::critique_system(&ctx.config.persona_name);
    let user = prompts::critique_user(ctx.query.as_str(), &ctx.context_text, ctx.draft()?);
    let critique = call_oracle(
        ctx,
        "critique",
        &system,
        user,
        ctx.config.critique_temperature,
    )
    .await?;

    debug!(critique_chars = critique.chars().count(), "synthesis critique ready");
    ctx.critique = Some(critique);

    machine
        .critique()
        .map_err(|(_, guard)| map_guard_error("critique", &guard))
}

/// Final stage; the returned text is the answer.
#[instrument(level = "trace", skip_all, fields(stage = "revise"))]
pub async fn revise(
    machine: SynthesisMachine<(), Critiqued>,
    ctx: &mut SynthesisContext<'_>,
) -> Result<(SynthesisMachine<(), Revised>, String), AppError> {
    let system = prompts::revise_system(&ctx.config.persona_name);
    let user = prompts::revise_user(
        ctx.query.as_str(),
        &ctx.context_text,
        ctx.draft()?,
        ctx.critique()?,
    );
    let revised = call_oracle(ctx, "revise", &system, user, ctx.config.draft_temperature).await?;

    let machine = machine
        .revise()
        .map_err(|(_, guard)| map_guard_error("revise", &guard))?;
    Ok((machine, revised))
}

async fn call_oracle(
    ctx: &SynthesisContext<'_>,
    stage: &str,
    system: &str,
    user: String,
    temperature: f32,
) -> Result<String, AppError> {
    let limit = ctx.config.oracle_timeout();
    let messages = [user];
    let text = tokio::time::timeout(limit, ctx.oracle.generate(system, &messages, temperature))
        .await
        .map_err(|_| AppError::Oracle(format!("{stage} stage timed out after {limit:?}")))??;

    if text.trim().is_empty() {
        return Err(AppError::Oracle(format!("{stage} stage returned no text")));
    }
    Ok(text)
}

fn map_guard_error(event: &str, guard: &GuardError) -> AppError {
    AppError::InternalError(format!(
        "invalid synthesis pipeline transition during {event}: {guard:?}"
    ))
}

//! Indentation pass: runs the reconciler over every line.

use super::PassOutput;
use crate::bridge::EmbeddedFormatter;
use crate::cancel::CancellationToken;
use crate::context::FormattingContext;
use crate::error::Interrupt;
use crate::reconciler::reconcile;
use crate::workspace::WorkspacePool;

pub(crate) async fn run<E: EmbeddedFormatter>(
    context: &FormattingContext,
    formatter: &E,
    pool: &WorkspacePool,
    cancel: &CancellationToken,
) -> Result<PassOutput, Interrupt> {
    let changes = reconcile(context, formatter, pool, cancel).await?;
    Ok(PassOutput::host(changes))
}

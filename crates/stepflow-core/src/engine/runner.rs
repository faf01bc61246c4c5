//! Llamador de referencia: vuelca la secuencia de un step a un `EventStore`
//! y registra el evento terminal de fallo.
use log::warn;

use crate::errors::StepError;
use crate::event::{EventStore, StepEvent};

use super::{execute_step, StepExecutionContext};

/// Ejecuta el step hasta el final. En caso de error agrega `StepUpForRetry`
/// (si el step pidió reintento y quedan intentos) o `StepFailure`, y devuelve
/// el error.
pub fn run_step<S>(ctx: &StepExecutionContext, prior_attempt_count: u32, store: &mut S) -> Result<(), StepError>
    where S: EventStore
{
    for item in execute_step(ctx, prior_attempt_count) {
        let err = match item {
            Ok(event) => {
                store.append(event);
                continue;
            }
            Err(err) => err,
        };
        let terminal = match &err {
            StepError::RetryRequested(retry) if prior_attempt_count < retry.max_retries => {
                warn!("step {} requested a retry (attempt {} of {})",
                      ctx.step().key,
                      prior_attempt_count + 1,
                      retry.max_retries);
                StepEvent::step_up_for_retry(ctx, &err, retry.seconds_to_wait)
            }
            _ => {
                warn!("step {} failed: {err}", ctx.step().key);
                StepEvent::step_failure(ctx, &err)
            }
        };
        store.append(terminal);
        return Err(err);
    }
    Ok(())
}

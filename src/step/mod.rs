// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod context;
mod descriptor;

pub use context::StepContext;
pub use descriptor::{Consume, StepDescriptor};

use std::sync::Arc;

use async_trait::async_trait;

/// A unit of build work.
///
/// The action reads its consumed items from the context and produces its
/// declared outputs into it. Outputs become visible to other steps only once
/// the action returns `Ok`.
#[async_trait]
pub trait BuildStep: Send + Sync {
    async fn execute(&self, ctx: &mut StepContext) -> anyhow::Result<()>;
}

/// Adapter running a synchronous closure as a step.
///
/// The closure runs on tokio's blocking pool, so it never stalls a runtime
/// worker and the scheduler's step timeout can expire while it runs. A timed
/// out closure keeps its blocking thread until it returns; its output is
/// discarded.
pub struct FnStep<F>(Arc<F>);

impl<F> FnStep<F>
where
    F: Fn(&mut StepContext) -> anyhow::Result<()> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[async_trait]
impl<F> BuildStep for FnStep<F>
where
    F: Fn(&mut StepContext) -> anyhow::Result<()> + Send + Sync + 'static,
{
    async fn execute(&self, ctx: &mut StepContext) -> anyhow::Result<()> {
        let f = Arc::clone(&self.0);
        let mut owned = ctx.take();
        let joined = tokio::task::spawn_blocking(move || {
            let result = f(&mut owned);
            (owned, result)
        })
        .await;

        match joined {
            Ok((owned, result)) => {
                *ctx = owned;
                result
            }
            // Re-raise so the scheduler reports it like any other panicking step
            Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
            Err(error) => Err(anyhow::anyhow!("blocking step task did not finish: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    use tokio_util::sync::CancellationToken;

    use crate::item::ItemId;

    struct Greeting(String);

    fn context() -> StepContext {
        let mut descriptor = StepDescriptor::new("greet");
        descriptor.add_produce(ItemId::of::<Greeting>());
        StepContext::new(Arc::new(descriptor), HashMap::new(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_fn_step_output_returns_to_context() {
        let step = FnStep::new(|ctx: &mut StepContext| {
            let greeting = format!("hello from {}", ctx.name());
            ctx.produce(Greeting(greeting))?;
            Ok(())
        });
        let mut ctx = context();

        step.execute(&mut ctx).await.unwrap();

        assert_eq!(ctx.name(), "greet");
        assert!(ctx.missing_output().is_none());
        assert_eq!(ctx.into_produced().len(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_fn_step_does_not_block_the_runtime() {
        let step = FnStep::new(|_ctx: &mut StepContext| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        });
        let mut ctx = context();

        let started = Instant::now();
        let ticker = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            started.elapsed()
        });
        step.execute(&mut ctx).await.unwrap();

        // The ticker ran while the closure was still sleeping
        assert!(ticker.await.unwrap() < Duration::from_millis(250));
    }
}

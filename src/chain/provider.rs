// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::chain::BuildChainBuilder;

/// A bundle of related steps that installs itself into a builder.
///
/// Lets a subsystem own the declaration of its steps instead of the host
/// application listing each one.
pub trait BuildProvider {
    fn install_into(&self, builder: &mut BuildChainBuilder);
}

impl<F> BuildProvider for F
where
    F: Fn(&mut BuildChainBuilder),
{
    fn install_into(&self, builder: &mut BuildChainBuilder) {
        self(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Config;
    struct Report;

    struct ReportingProvider;

    impl BuildProvider for ReportingProvider {
        fn install_into(&self, builder: &mut BuildChainBuilder) {
            builder
                .add_step_fn("report", |_ctx| Ok(()))
                .consumes::<Config>()
                .produces::<Report>()
                .register();
        }
    }

    #[test]
    fn test_providers_install_steps() {
        let config_provider = |builder: &mut BuildChainBuilder| {
            builder
                .add_step_fn("config", |_ctx| Ok(()))
                .produces::<Config>()
                .register();
        };

        let mut builder = BuildChainBuilder::new();
        builder
            .add_provider(&ReportingProvider)
            .add_provider(&config_provider);

        let graph = builder.build_graph().unwrap();
        assert_eq!(graph.topological_order(), vec!["config", "report"]);
    }
}

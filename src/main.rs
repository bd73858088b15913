// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::Path;
use std::time::Instant;

use buildchain::config::{load_config, SchedulerConfig};
use buildchain::engine::StepState;
use buildchain::observability::init_tracing;
use buildchain::{BuildChain, BuildChainBuilder, RootInputs};

/// Text handed to the build as its root input
struct InputText(String);
struct Words(Vec<String>);
struct WordCount(usize);
struct Shouted(String);
struct Report(String);

/// Small text pipeline showing a fan-out and a join:
///
/// ```text
/// InputText -> split -> Words -> count -> WordCount -+
///          \-> shout -> Shouted ---------------------+-> report -> Report
/// ```
fn text_pipeline(config: SchedulerConfig) -> Result<BuildChain, Box<dyn std::error::Error>> {
    let mut builder = BuildChainBuilder::with_config(config);
    builder.add_initial::<InputText>().add_final::<Report>();

    builder
        .add_step_fn("split", |ctx| {
            let text = ctx.consume::<InputText>()?;
            ctx.produce(Words(text.0.split_whitespace().map(String::from).collect()))?;
            Ok(())
        })
        .consumes::<InputText>()
        .produces::<Words>()
        .register();
    builder
        .add_step_fn("count", |ctx| {
            let words = ctx.consume::<Words>()?;
            ctx.produce(WordCount(words.0.len()))?;
            Ok(())
        })
        .consumes::<Words>()
        .produces::<WordCount>()
        .register();
    builder
        .add_step_fn("shout", |ctx| {
            let text = ctx.consume::<InputText>()?;
            ctx.produce(Shouted(text.0.to_uppercase()))?;
            Ok(())
        })
        .consumes::<InputText>()
        .produces::<Shouted>()
        .register();
    builder
        .add_step_fn("report", |ctx| {
            let count = ctx.consume::<WordCount>()?;
            let shouted = ctx.consume_optional::<Shouted>()?;
            let line = match shouted {
                Some(shouted) => format!("{} words: {}", count.0, shouted.0),
                None => format!("{} words", count.0),
            };
            ctx.produce(Report(line))?;
            Ok(())
        })
        .consumes::<WordCount>()
        .consumes_optional::<Shouted>()
        .produces::<Report>()
        .register();

    Ok(builder.build()?)
}

#[tokio::main]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let (config_file, input_text) = match args.as_slice() {
        [_, text] => (None, text.clone()),
        [_, config, text] => (Some(config.clone()), text.clone()),
        _ => {
            eprintln!("Usage: {} [config.yaml|config.toml] <input_text>", args[0]);
            eprintln!("Example: {} \"hello build chain\"", args[0]);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(config_file.as_deref(), input_text).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(config_file: Option<&str>, input_text: String) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();

    let config = match config_file {
        Some(path) => load_config(Path::new(path))?,
        None => SchedulerConfig::default(),
    };

    println!("🔧 Max Concurrency: {}", config.effective_concurrency());
    println!("🛡️  Failure Policy: {:?}", config.failure_policy);

    let chain = text_pipeline(config)?;
    println!("🔄 Step order: {}", chain.graph().topological_order().join(" -> "));

    let execution_start = Instant::now();
    let result = chain.run(RootInputs::new().with(InputText(input_text))).await?;
    let execution_time = execution_start.elapsed();

    println!("\n📊 Execution Results:");
    println!("⏱️  Execution Time: {:?}", execution_time);
    println!(
        "🔢 Steps Completed: {}",
        result.steps_in_state(StepState::Completed).len()
    );
    println!("🎯 Report: {}", result.get::<Report>()?.0);

    println!("\n⏱️  Total Time (including config load): {:?}", start_time.elapsed());
    Ok(())
}

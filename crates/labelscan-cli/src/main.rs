// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use labelscan_app::AppState;
use labelscan_client::Client;
use labelscan_tui::TuiOptions;
use runtime::HttpRuntime;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `labelscan --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    if options.print_endpoint {
        println!("{}", config.endpoint());
        return Ok(());
    }

    let client = Client::new(config.endpoint()).with_context(|| {
        format!(
            "invalid [backend] config in {}; fix the endpoint value",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    let log_path = logging::default_log_path()?;
    logging::initialize(&log_path, config.log_level())?;
    tracing::info!(
        config = %options.config_path.display(),
        endpoint = client.endpoint(),
        "config loaded"
    );

    let mut runtime = HttpRuntime::new(client);
    if let Some(image) = &options.analyze_path {
        let summary = runtime::analyze_once(&mut runtime, image)?;
        println!("{summary}");
        return Ok(());
    }

    let cwd = env::current_dir().context("resolve current directory")?;
    let home = dirs::home_dir();
    let tui_options = TuiOptions {
        start_dir: config.start_dir(home.as_deref(), &cwd),
        home_dir: home,
        endpoint: config.endpoint().to_owned(),
    };

    let mut state = AppState::default();
    labelscan_tui::run_app(&mut state, &mut runtime, tui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    print_endpoint: bool,
    check_only: bool,
    analyze_path: Option<PathBuf>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        print_endpoint: false,
        check_only: false,
        analyze_path: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--analyze" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--analyze requires an image path"))?;
                options.analyze_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--print-endpoint" => {
                options.print_endpoint = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("labelscan: nutrition label analyzer");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --print-endpoint         Print the analysis endpoint in use");
    println!("  --check                  Validate config and endpoint, then exit");
    println!("  --analyze <image>        Analyze one image and print the summary");
    println!("  --help                   Show this help");
}

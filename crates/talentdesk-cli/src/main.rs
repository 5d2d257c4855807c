// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use log::info;
use runtime::{ApiRuntime, DemoRuntime};
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use talentdesk_app::AppState;
use talentdesk_client::Client;
use talentdesk_tui::UiOptions;

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
            "load config {}; run `talentdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(&config)?;

    let ui_options = UiOptions {
        long_text_width: config.long_text_width(),
    };
    let mut state = AppState::default();
    state.active_view = config.start_view();

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        let mut runtime = DemoRuntime::new();
        return talentdesk_tui::run_app(&mut state, &mut runtime, ui_options);
    }

    let base_url = config.api_base_url();
    let client = Client::new(&base_url, config.api_timeout()?, config.session_cookie())
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout/session_cookie values",
                options.config_path.display()
            )
        })?;

    if options.check_only {
        let summary = runtime::check_backend(&client)?;
        println!(
            "{} ok: {} candidates as {}, {} dropdown fields",
            client.base_url(),
            summary.candidates,
            summary.role.label(),
            summary.dropdown_fields
        );
        return Ok(());
    }

    info!("connecting to {base_url}");
    let mut runtime = ApiRuntime::new(client);
    talentdesk_tui::run_app(&mut state, &mut runtime, ui_options)
}

/// `RUST_LOG` filters apply on top of the configured level.
fn init_logging(config: &Config) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(config.log_level()?);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if let Some(path) = config.log_file() {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| {
                format!(
                    "open log file {} -- fix [logging].file or remove it to log to stderr",
                    path.display()
                )
            })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("initialize logger")?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
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
        demo: false,
        print_example: false,
        check_only: false,
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
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
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
    println!("talentdesk - candidate tracking in the terminal");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch against generated in-memory candidates");
    println!("  --check                  Validate config and fetch options + data once");
    println!("  --help                   Show this help");
}

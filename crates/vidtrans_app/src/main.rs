mod cli;
mod config;
mod effects;
mod logging;
mod persistence;
mod render;
mod session;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use vidtrans_core::{AppState, LanguageCode, Msg, SUPPORTED_LANGUAGES};
use vidtrans_engine::EngineHandle;
use vidtrans_logging::{short_id, vt_error, vt_info};

use crate::cli::{Cli, Command, TranslateArgs};
use crate::config::AppConfig;
use crate::effects::{file_handle, EffectRunner};
use crate::session::{download_artifact, Session};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            vt_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    logging::initialize(config.log, cli.verbose);
    vt_info!(
        "vidtrans {} against {} ({:?} api)",
        env!("CARGO_PKG_VERSION"),
        config.base_url,
        config.api
    );

    match cli.command {
        Command::Languages => {
            for (code, name) in SUPPORTED_LANGUAGES {
                println!("{code}  {name}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Translate(args) => translate(&config, args),
        Command::Watch { task_id } => watch(&config, task_id),
        Command::Download {
            artifact_id,
            output_dir,
        } => {
            let runner = runner(&config, output_dir)?;
            let saved = download_artifact(&runner, &artifact_id)?;
            println!("Saved {}", saved.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn runner(config: &AppConfig, output_dir: Option<PathBuf>) -> Result<EffectRunner> {
    let engine = EngineHandle::new(config.client_settings()).context("starting engine")?;
    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    Ok(EffectRunner::new(engine, output_dir))
}

fn translate(config: &AppConfig, args: TranslateArgs) -> Result<ExitCode> {
    let language = match &args.lang {
        Some(raw) => LanguageCode::parse(raw).with_context(|| format!("--lang {raw:?}"))?,
        None => config.language()?,
    };
    let runner = runner(config, args.output_dir)?;

    let source = match (args.file, args.url) {
        (Some(path), _) => Msg::FileSelected(file_handle(&path)),
        (None, Some(url)) => Msg::UrlEdited(url),
        (None, None) => Msg::UrlEdited(String::new()),
    };

    let report = Session::new(AppState::with_language(language), runner, io::stdout(), config.api)
        .auto_download(args.download)
        .run(vec![source, Msg::SubmitClicked])?;
    Ok(exit_code(report.is_success()))
}

/// The task `watch` follows and the settings to poll it with.
#[derive(Debug)]
struct WatchTarget {
    task_id: String,
    language: LanguageCode,
    config: AppConfig,
}

/// A task recorded by an earlier `translate` is polled with the API family it
/// was submitted to, whatever the current config says.
fn watch_target(config: &AppConfig, task_id: Option<String>) -> Result<WatchTarget> {
    match task_id {
        Some(task_id) => Ok(WatchTarget {
            task_id,
            language: config.language()?,
            config: config.clone(),
        }),
        None => {
            let last = persistence::load_last_task(&config.output_dir).context(
                "no task id given and no previous task recorded; pass one explicitly",
            )?;
            vt_info!(
                "Resuming task {} submitted at {} ({:?} api)",
                short_id(&last.task_id),
                last.submitted_at,
                last.api
            );
            let mut config = config.clone();
            config.api = last.api;
            Ok(WatchTarget {
                task_id: last.task_id,
                language: LanguageCode::parse(&last.target_language).unwrap_or_default(),
                config,
            })
        }
    }
}

fn watch(config: &AppConfig, task_id: Option<String>) -> Result<ExitCode> {
    let target = watch_target(config, task_id)?;
    let runner = runner(&target.config, None)?;

    let report = Session::new(
        AppState::with_language(target.language),
        runner,
        io::stdout(),
        target.config.api,
    )
    .run(vec![Msg::ResumeTask {
        task_id: target.task_id,
    }])?;
    Ok(exit_code(report.is_success()))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

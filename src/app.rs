//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads settings from the environment
//! - builds the public or user view
//! - prints the report
//! - writes optional exports

use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{debug, info, warn};

use crate::cli::{Command, PublicArgs, UserArgs};
use crate::config::Settings;
use crate::data::{Cutoff, DatasetLoader, HttpTransport, OfflineTransport, PublicCaches, Transport};
use crate::error::AppError;
use crate::io::ExportOptions;

pub mod pipeline;

use pipeline::{PublicViewOptions, UserViewOptions};

/// Entry point for the `sdb` binary.
pub fn run() -> Result<(), AppError> {
    // `sdb` and `sdb --period year` behave like `sdb public ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    crate::logging::init(cli.verbose);

    let mut settings = Settings::from_env()?;
    if let Some(secs) = cli.timeout_secs {
        if secs == 0 {
            return Err(AppError::config("--timeout-secs must be positive"));
        }
        settings.loader.timeout = Duration::from_secs(secs);
    }
    debug!(?settings, "settings resolved");

    match cli.command {
        Command::Public(args) if cli.offline => handle_public(OfflineTransport, &settings, args),
        Command::Public(args) => handle_public(HttpTransport::new()?, &settings, args),
        Command::User(args) => handle_user(&settings, args),
    }
}

fn handle_public<T: Transport>(transport: T, settings: &Settings, args: PublicArgs) -> Result<(), AppError> {
    let loader = DatasetLoader::new(transport, settings.loader.clone());
    let mut caches = PublicCaches::new(settings.loader.cache_ttl);
    let options = PublicViewOptions {
        period: args.period,
        window: usize::from(args.window),
        from: args.from,
        to: args.to,
    };

    let view = pipeline::build_public_view(&loader, &settings.endpoints, &mut caches, &options, Utc::now());
    println!("{}", crate::report::format_public_view(&view, args.preview));

    let export = ExportOptions { bom: !args.no_bom };
    if let Some(path) = &args.export {
        crate::io::write_series_csv(path, &view.school_totals, export)?;
        info!(path = %path.display(), rows = view.school_totals.len(), "exported school actions");
    }
    if let Some(path) = &args.export_sites {
        crate::io::write_sites_csv(path, &view.bundle.sites.data, export)?;
        info!(path = %path.display(), rows = view.bundle.sites.data.len(), "exported damage sites");
    }

    Ok(())
}

fn handle_user(settings: &Settings, args: UserArgs) -> Result<(), AppError> {
    let cutoff = Cutoff::at(Utc::now(), settings.loader.reference_offset);
    let options = UserViewOptions {
        groups: args.groups.clone(),
        from: args.from,
        to: args.to,
    };

    let view = pipeline::build_user_view(&cutoff, &options);
    if !view.unknown_groups.is_empty() {
        warn!(unknown = ?view.unknown_groups, available = ?view.groups, "requested groups match no rows");
    }
    println!("{}", crate::report::format_user_view(&view, args.preview));

    let export = ExportOptions { bom: !args.no_bom };
    if let Some(path) = &args.export {
        crate::io::write_series_csv(path, &view.filtered, export)?;
        info!(path = %path.display(), rows = view.filtered.len(), "exported user rows");
    }
    if let Some(path) = &args.export_regions {
        crate::io::write_sites_csv(path, &view.regions, export)?;
        info!(path = %path.display(), rows = view.regions.len(), "exported region points");
    }

    Ok(())
}

/// Rewrite argv so `sdb` defaults to `sdb public`.
///
/// Rules:
/// - `sdb`                       -> `sdb public`
/// - `sdb --period year ...`     -> `sdb public --period year ...`
/// - `sdb --offline user ...`    -> unchanged (a subcommand is present)
/// - `sdb --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("public".to_string());
        return argv;
    };

    let has_help_or_version = argv[1..]
        .iter()
        .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version" | "help"));
    if has_help_or_version {
        return argv;
    }

    let has_subcommand = argv[1..].iter().any(|a| matches!(a.as_str(), "public" | "user"));
    if has_subcommand {
        return argv;
    }

    // Leading flags with no subcommand are public-view flags.
    if arg1.starts_with('-') {
        argv.insert(1, "public".to_string());
    }
    argv
}

use super::super::args::*;
use tracing::debug;
use wpdash_enroll::{EnrollConfig, EnrollResult, Enrollment};

use crate::exit_codes::{self, SUCCESS};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let enrollment = match open_enrollment(&cli.global) {
        Ok(enrollment) => enrollment,
        Err(e) => return Ok(exit_codes::report(&e)),
    };

    match cli.cmd {
        Command::Register(args) => super::register::run(args, &enrollment).await,
        Command::Regenerate(args) => super::register::run_regenerate(args, &enrollment).await,
        Command::Show(args) => super::show::run(args, &enrollment).await,
        Command::SecurityId => super::show::run_security_id(&enrollment).await,
        Command::Handle(args) => super::handle::run(args, &enrollment).await,
    }
}

/// Resolve configuration: defaults, then `--config`, then `WPDASH_*`, then flags.
pub(crate) fn load_config(global: &GlobalArgs) -> EnrollResult<EnrollConfig> {
    let mut config = match &global.config {
        Some(path) => EnrollConfig::from_yaml_file(path)?,
        None => EnrollConfig::default(),
    }
    .merge_env()?;

    if let Some(url) = &global.site_url {
        config = config.with_site_url(url.clone());
    }
    if let Some(path) = &global.store {
        config = config.with_store_path(path.clone());
    }

    debug!(site_url = %config.site_url, auth = %config.auth, "resolved configuration");
    Ok(config)
}

fn open_enrollment(global: &GlobalArgs) -> EnrollResult<Enrollment> {
    Enrollment::from_config(&load_config(global)?)
}

/// Map an enrollment result onto an exit code, reporting failures.
pub(crate) fn finish<T>(result: EnrollResult<T>, on_success: impl FnOnce(T)) -> i32 {
    match result {
        Ok(value) => {
            on_success(value);
            SUCCESS
        }
        Err(e) => exit_codes::report(&e),
    }
}

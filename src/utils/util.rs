use faccess::PathExt;
use std::{env, path::PathBuf};

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Resolves `name` against `PATH`, returning the first executable match.
pub fn require_executable(name: &str) -> Result<PathBuf> {
    let path_var = env::var_os("PATH").ok_or_else(|| "PATH is not set".to_string())?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file() && candidate.executable())
        .ok_or_else(|| format!("{} executable not found.", name))
}

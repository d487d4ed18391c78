use crate::cli::SubmitArgs;
use crate::execution::plan_dispatch;
use crate::utils::{require_executable, Gene, GeneConfig, Result, Workspace, SLURM_DEFAULTS};
use itertools::Itertools;
use std::{env, fs, path::Path, process::Command};

pub fn submit(args: SubmitArgs) -> Result<()> {
    require_executable("pbaa")?;
    let sbatch = if args.dry_run {
        Path::new("sbatch").to_path_buf()
    } else {
        require_executable("sbatch")?
    };

    let workdir = fs::canonicalize(&args.workdir)
        .map_err(|e| format!("Failed to resolve {}: {}", args.workdir.display(), e))?;
    let workspace = Workspace::new(&workdir);
    GeneConfig::load(args.gene, &workspace)?;
    let plan = plan_dispatch(&workspace)?;

    let exe = env::current_exe().map_err(|e| format!("Failed to locate executable: {}", e))?;
    let wrap = wrap_command(&exe, args.gene, &workdir, &plan.samples, &args.pbaa_options);
    let slurm_options = if args.slurm_options.is_empty() {
        SLURM_DEFAULTS.iter().map(|s| s.to_string()).collect()
    } else {
        args.slurm_options.clone()
    };
    let sbatch_args = sbatch_args(&slurm_options, &wrap, plan.samples.len());

    log::info!(
        "Submitting {} samples: {} {}",
        plan.samples.len(),
        sbatch.display(),
        sbatch_args.iter().join(" ")
    );
    if args.dry_run {
        return Ok(());
    }

    let output = Command::new(&sbatch)
        .args(&sbatch_args)
        .output()
        .map_err(|e| format!("Failed to execute {}: {}", sbatch.display(), e))?;
    if !output.status.success() {
        return Err(format!(
            "sbatch failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    log::info!("{}", String::from_utf8_lossy(&output.stdout).trim());
    Ok(())
}

/// Shell command run by the batch job: this binary's `cluster` stage over
/// exactly the planned samples.
pub fn wrap_command(
    exe: &Path,
    gene: Gene,
    workdir: &Path,
    samples: &[String],
    pbaa_options: &[String],
) -> String {
    let mut words = vec![
        exe.to_string_lossy().to_string(),
        "cluster".to_string(),
        "--gene".to_string(),
        gene.name().to_string(),
        "--workdir".to_string(),
        workdir.to_string_lossy().to_string(),
        "--samples".to_string(),
        samples.join(","),
    ];
    words.extend(pbaa_options.iter().map(|o| format!("--pbaa-option={}", o)));
    words.iter().map(|w| shell_quote(w)).join(" ")
}

pub fn sbatch_args(slurm_options: &[String], wrap: &str, num_samples: usize) -> Vec<String> {
    slurm_options
        .iter()
        .cloned()
        .chain([
            format!("--ntasks={}", num_samples),
            format!("--wrap={}", wrap),
        ])
        .collect()
}

fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_./,=:".contains(&b))
    {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

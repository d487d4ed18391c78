use clap::Parser;
use dihybrid::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{cluster, haplotype, prepare, submit},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Cluster(_) => "cluster",
        Command::Submit(_) => "submit",
        Command::Haplotype(_) => "haplotype",
        Command::Prepare(_) => "prepare",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Cluster(args) => cluster::cluster(args)?,
        Command::Submit(args) => submit::submit(args)?,
        Command::Haplotype(args) => haplotype::haplotype(args)?,
        Command::Prepare(args) => prepare::prepare(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}

use anyhow::Result;
use clap::Parser;

mod add_cmd;
mod cli;
mod list_cmd;
mod run_cmd;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let work_dir = std::env::current_dir()?;
    let config_root = ar_config::paths::user_config_dir()
        .unwrap_or_else(|| work_dir.join(".config").join("go-agent-skills"));

    let exit_code = match cli.command {
        Commands::Add => {
            add_cmd::handle_add(&config_root)?;
            0
        }
        Commands::List => {
            let home = directories::UserDirs::new()
                .map(|d| d.home_dir().to_path_buf())
                .unwrap_or_else(|| work_dir.clone());
            let roots = ar_skills::default_roots(&work_dir, &home);
            let skills = ar_skills::scan(&roots);
            list_cmd::handle_list(&skills);
            0
        }
        Commands::Run { first, second, allow } => {
            let (skill_name, input) = Commands::run_args(first, second);
            run_cmd::handle_run(skill_name, input, allow, config_root, work_dir).await?
        }
    };

    std::process::exit(exit_code);
}

use std::process::exit;

use clap::{Args, Command, FromArgMatches};

use font_embed_cli::{
    utils::{async_continue, logical_exit},
    CompletionArgs, EmbedArgs, Opts, Shell, Subcommands, WaitArgs,
};

fn get_cli(sub_command_required: bool) -> Command {
    let cli = Command::new("font-embed");
    Opts::augment_args(cli).subcommand_required(sub_command_required)
}

fn help_sub_command() {
    Opts::from_arg_matches(&get_cli(true).get_matches()).unwrap();
}

fn main() {
    human_panic::setup_panic!();

    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();

    let opts = Opts::from_arg_matches(&get_cli(false).get_matches())
        .map_err(|err| err.exit())
        .unwrap();

    match opts.sub {
        Some(Subcommands::Embed(args)) => embed(args),
        Some(Subcommands::Wait(args)) => wait(args),
        Some(Subcommands::Completion(args)) => generate_completion(args),
        None => help_sub_command(),
    };

    #[allow(unreachable_code)]
    {
        unreachable!("The subcommand must exit the process.");
    }
}

fn embed(args: EmbedArgs) -> ! {
    async_continue(async {
        let result = font_embed_cli::embed::embed(args).await;
        if let Err(err) = &result {
            log::error!("embed failed: {err}");
        }
        logical_exit(result.is_ok());
    })
}

fn wait(args: WaitArgs) -> ! {
    async_continue(async {
        let result = font_embed_cli::wait::wait(args).await;
        if let Err(err) = &result {
            log::error!("wait failed: {err}");
        }
        logical_exit(result.is_ok());
    })
}

fn generate_completion(CompletionArgs { shell }: CompletionArgs) -> ! {
    let cli = &mut get_cli(true);
    let out = &mut std::io::stdout();
    match shell {
        Shell::Bash => clap_complete::generate(clap_complete::Shell::Bash, cli, "font-embed", out),
        Shell::Elvish => {
            clap_complete::generate(clap_complete::Shell::Elvish, cli, "font-embed", out)
        }
        Shell::Fig => clap_complete::generate(clap_complete_fig::Fig, cli, "font-embed", out),
        Shell::Fish => clap_complete::generate(clap_complete::Shell::Fish, cli, "font-embed", out),
        Shell::PowerShell => {
            clap_complete::generate(clap_complete::Shell::PowerShell, cli, "font-embed", out)
        }
        Shell::Zsh => clap_complete::generate(clap_complete::Shell::Zsh, cli, "font-embed", out),
    }
    exit(0);
}

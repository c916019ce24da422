use std::path::PathBuf;
use std::str::FromStr;

pub mod embed;
pub mod utils;
pub mod wait;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[clap(name = "font-embed", version)]
pub struct Opts {
    #[clap(subcommand)]
    pub sub: Option<Subcommands>,
}

#[derive(Debug, Subcommand)]
#[clap(
    about = "Embed fonts into SVG documents.",
    after_help = "",
    next_display_order = None
)]
pub enum Subcommands {
    #[clap(visible_alias = "e", about = "Inject fonts into an SVG document.")]
    Embed(EmbedArgs),

    #[clap(about = "Wait until a system font family can render.")]
    Wait(WaitArgs),

    #[clap(about = "Generate shell completion script.")]
    Completion(CompletionArgs),
}

/// A `FAMILY=SRC` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontArg {
    pub family: String,
    pub src: String,
}

impl FromStr for FontArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // family names may contain `=`; sources rarely do
        let Some((family, src)) = s.rsplit_once('=') else {
            return Err(format!("expected FAMILY=SRC, got {s:?}"));
        };
        if family.is_empty() || src.is_empty() {
            return Err(format!("expected FAMILY=SRC, got {s:?}"));
        }
        Ok(Self {
            family: family.to_owned(),
            src: src.to_owned(),
        })
    }
}

#[derive(Debug, Clone, Default, Parser)]
#[clap(next_help_heading = "Embed options")]
pub struct EmbedArgs {
    /// Directory font sources are resolved against. Defaults to the
    /// `rootDir` of the config file, or the current directory.
    #[clap(long, short, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file, in TOML or JSON.
    #[clap(long, short, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bundled font set to load, e.g. `scratch3`.
    #[clap(long)]
    pub preset: Option<String>,

    /// Add a font to load
    #[clap(long = "font", value_name = "FAMILY=SRC", action = ArgAction::Append)]
    pub fonts: Vec<FontArg>,

    /// Families to inject. All loaded families when omitted.
    #[clap(long = "family", value_name = "FAMILY", action = ArgAction::Append)]
    pub families: Vec<String>,

    /// Reject font files without a known signature.
    #[clap(long)]
    pub strict: bool,

    /// Input SVG file. Reads stdin when omitted.
    #[clap(long, short, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output SVG file. Writes stdout when omitted.
    #[clap(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
#[clap(next_help_heading = "Wait options")]
pub struct WaitArgs {
    /// Add additional directories to search for fonts
    #[clap(long = "font-path", value_name = "DIR", action = ArgAction::Append)]
    pub font_paths: Vec<PathBuf>,

    /// Also search system fonts
    #[clap(long)]
    pub system_fonts: bool,

    /// The family to wait for.
    #[clap(long)]
    pub family: String,

    /// Sample text the family must cover.
    #[clap(long)]
    pub text: Option<String>,

    /// Give up after this many milliseconds.
    #[clap(long, default_value_t = 3000)]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Elvish,
    Fig,
    Fish,
    PowerShell,
    Zsh,
}

#[derive(Debug, Clone, Parser)]
pub struct CompletionArgs {
    /// The shell to generate the completion script for.
    #[clap(value_enum)]
    pub shell: Shell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_arg() {
        let arg: FontArg = "Sans Serif=/fonts/NotoSans-Regular.woff".parse().unwrap();
        assert_eq!(arg.family, "Sans Serif");
        assert_eq!(arg.src, "/fonts/NotoSans-Regular.woff");

        assert!("Serif".parse::<FontArg>().is_err());
        assert!("=/a.woff".parse::<FontArg>().is_err());
        assert!("Serif=".parse::<FontArg>().is_err());
    }

    #[test]
    fn test_parse_embed() {
        let opts = Opts::try_parse_from([
            "font-embed",
            "embed",
            "--preset",
            "scratch3",
            "--font",
            "Extra=/extra.woff",
            "--family",
            "Serif",
            "--family",
            "Extra",
            "-i",
            "in.svg",
        ])
        .unwrap();

        let Some(Subcommands::Embed(args)) = opts.sub else {
            panic!("expected embed");
        };
        assert_eq!(args.preset.as_deref(), Some("scratch3"));
        assert_eq!(args.fonts.len(), 1);
        assert_eq!(args.families, vec!["Serif", "Extra"]);
        assert_eq!(args.input, Some(PathBuf::from("in.svg")));
        assert!(args.output.is_none());
    }

    #[test]
    fn test_parse_wait() {
        let opts =
            Opts::try_parse_from(["font-embed", "wait", "--family", "Scratch", "--timeout-ms", "10"])
                .unwrap();
        let Some(Subcommands::Wait(args)) = opts.sub else {
            panic!("expected wait");
        };
        assert_eq!(args.family, "Scratch");
        assert_eq!(args.timeout_ms, 10);
        assert!(args.font_paths.is_empty());
    }
}

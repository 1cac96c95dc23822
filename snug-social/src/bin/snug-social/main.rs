mod commands;
mod context;
mod examples;
mod output;
mod render;
mod theme;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
};
use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};
use std::fmt::Write;
use std::path::PathBuf;

use commands::{
    graph::{self, GraphCommands},
    post::{self, PostCommands},
    run::{self, RunArgs},
};
use context::CliContext;
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use snug_social::{ErrorKind, PersistenceGateway, SocialAction, SocialClient, SocialError};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis connection URL used when the config keeps the ${REDIS_URL} default"),
    ("SNUG_SOCIAL_CONFIG", "Path to a snug-social.toml file"),
    ("RUST_LOG", "Log filter, e.g. snug_social=debug"),
];

#[derive(Parser)]
#[command(name = "snug-social")]
#[command(version)]
#[command(
    about = "Follow graph, post engagement and moderation over Redis",
    long_about = r#"Command line front end for the snug-social core:

• Follow, friend and unfriend users; inspect relationships and counts
• Create posts and apply likes, dislikes, comments, replies and hearts
• Delete comments and replies with their hearts, as their author
• Replay JSON-lines action scripts against Redis or an in-memory store

Commands:
  graph   Relationship edges and derived counts
  post    Posts, engagement and deletion
  run     Execute a batch of JSON actions
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Config file (defaults to the nearest snug-social.toml)
    #[arg(long, env = "SNUG_SOCIAL_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Use a throwaway in-memory store instead of Redis
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_with_styles() -> Self {
        let matches = build_cli_command()
            .styles(help_styles())
            .get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn build_cli_command() -> Command {
    let use_color = detect_color_support();
    let appendix = render_top_level_appendix(use_color);
    let mut command = Cli::command().after_long_help(appendix);
    command = command.color(if use_color {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    });
    attach_command_examples(&mut command, use_color);
    command
}

fn attach_command_examples(command: &mut Command, use_color: bool) {
    for example in command_examples() {
        if let Some(subcommand) = command.find_subcommand_mut(example.name) {
            let help_text = render_examples(example.groups, use_color);
            *subcommand = subcommand.clone().after_long_help(help_text);
        }
    }
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let heading = stylize("Examples:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{heading}");

    for (index, group) in groups.iter().enumerate() {
        let title = stylize(group.title, theme.primary, true, use_color);
        let _ = writeln!(buffer, "  {title}");

        for command in group.commands {
            let arrow = stylize(ICONS.arrow, theme.secondary, false, use_color);
            let command_text = stylize(command, theme.secondary, false, use_color);
            let _ = writeln!(buffer, "    {arrow} {command_text}");
        }

        if index + 1 < groups.len() {
            buffer.push('\n');
        }
    }

    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let env_heading = stylize("Environment Variables:", theme.highlight, true, use_color);
    let _ = writeln!(buffer, "{env_heading}");
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key_text = stylize(key, theme.key, true, use_color);
        let value_text = stylize(description, theme.value, false, use_color);
        let _ = writeln!(buffer, "  {key_text}  {value_text}");
    }

    buffer.push('\n');

    let tip_heading = stylize("Tip:", theme.highlight, true, use_color);
    let tip_text = stylize(
        "Use 'snug-social <command> --help' to view examples for each command.",
        theme.secondary,
        false,
        use_color,
    );
    let _ = writeln!(buffer, "{tip_heading} {tip_text}");

    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    if !use_color {
        return text.to_string();
    }
    let styled = text.color(color);
    if bold { styled.bold().to_string() } else { styled.to_string() }
}

fn detect_color_support() -> bool {
    ShouldColorize::from_env().should_colorize()
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .invalid(style_from_color(theme.warning))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    Style::new().fg_color(Some(color_to_clap_color(color)))
}

fn color_to_clap_color(color: ThemeColor) -> ClapColor {
    match color {
        ThemeColor::Black => ClapColor::Ansi(AnsiColor::Black),
        ThemeColor::Red => ClapColor::Ansi(AnsiColor::Red),
        ThemeColor::Green => ClapColor::Ansi(AnsiColor::Green),
        ThemeColor::Yellow => ClapColor::Ansi(AnsiColor::Yellow),
        ThemeColor::Blue => ClapColor::Ansi(AnsiColor::Blue),
        ThemeColor::Magenta => ClapColor::Ansi(AnsiColor::Magenta),
        ThemeColor::Cyan => ClapColor::Ansi(AnsiColor::Cyan),
        ThemeColor::White => ClapColor::Ansi(AnsiColor::White),
        ThemeColor::BrightBlack => ClapColor::Ansi(AnsiColor::BrightBlack),
        ThemeColor::BrightRed => ClapColor::Ansi(AnsiColor::BrightRed),
        ThemeColor::BrightGreen => ClapColor::Ansi(AnsiColor::BrightGreen),
        ThemeColor::BrightYellow => ClapColor::Ansi(AnsiColor::BrightYellow),
        ThemeColor::BrightBlue => ClapColor::Ansi(AnsiColor::BrightBlue),
        ThemeColor::BrightMagenta => ClapColor::Ansi(AnsiColor::BrightMagenta),
        ThemeColor::BrightCyan => ClapColor::Ansi(AnsiColor::BrightCyan),
        ThemeColor::BrightWhite => ClapColor::Ansi(AnsiColor::BrightWhite),
        ThemeColor::TrueColor { r, g, b } => ClapColor::Rgb(RgbColor(r, g, b)),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Follow and friend edges, relationship status and counts
    #[command(subcommand)]
    Graph(GraphCommands),

    /// Posts, engagement actions and comment deletion
    #[command(subcommand)]
    Post(PostCommands),

    /// Execute a JSON-lines batch of actions in order
    Run(RunArgs),
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        no_color: cli.no_color,
    });

    if let Err(err) = execute(cli, &output).await {
        output.error(&format!("{err:#}"));
        std::process::exit(exit_code(&err));
    }
}

/// Business failures get distinct codes; anything else is 1
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SocialError>().map(SocialError::kind) {
        Some(ErrorKind::InvalidInput) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::Forbidden) => 4,
        Some(ErrorKind::Conflict) => 5,
        Some(ErrorKind::StorageFailure) => 6,
        None => 1,
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let context = CliContext::load(cli.config.as_deref())?;
    match &context.config_path {
        Some(path) => log::info!("using configuration {}", path.display()),
        None => log::info!("no configuration file found, using defaults"),
    }
    let (actions, keep_going) = match cli.command {
        Commands::Graph(command) => (vec![graph::to_action(command)], false),
        Commands::Post(command) => (vec![post::to_action(command)?], false),
        Commands::Run(args) => (run::load_actions(&args)?, args.keep_going),
    };

    if cli.memory {
        if actions.len() == 1 {
            output.warning("in-memory store: this change is discarded on exit");
        }
        let mut client = SocialClient::in_memory(context.config);
        run_actions(&mut client, actions, keep_going, output).await
    } else {
        let mut client = SocialClient::connect(context.config).await?;
        run_actions(&mut client, actions, keep_going, output).await
    }
}

async fn run_actions<G>(
    client: &mut SocialClient<G>,
    actions: Vec<SocialAction>,
    keep_going: bool,
    output: &OutputManager,
) -> Result<()>
where
    G: PersistenceGateway,
{
    let total = actions.len();
    let mut first_failure: Option<SocialError> = None;
    for (index, action) in actions.into_iter().enumerate() {
        match client.dispatch(action).await {
            Ok(response) => output.display(&response)?,
            Err(err) if keep_going => {
                output.error(&format!("action {} failed: {err}", index + 1));
                first_failure.get_or_insert(err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if total > 1 && output.options.output_format != OutputFormat::Json {
        let failed = if first_failure.is_some() { " (with failures)" } else { "" };
        output.success(&format!("{total} actions processed{failed}"));
    }
    match first_failure {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

use clap::Parser;
use miette::Result;
use qcd::cli::commands;
use qcd::cli::{Cli, Commands, Reported};

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` or `grep -q` terminates quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    qcd::core::logging::init(global.verbose);

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Dashboard(args) => commands::dashboard::run(args, &global),
        Commands::Client(cmd) => commands::client::run(cmd, &global),
        Commands::Project(cmd) => commands::project::run(cmd, &global),
        Commands::Material(cmd) => commands::material::run(cmd, &global),
        Commands::Welder(cmd) => commands::welder::run(cmd, &global),
        Commands::Inspector(cmd) => commands::inspector::run(cmd, &global),
        Commands::Wps(cmd) => commands::wps::run(cmd, &global),
        Commands::Drawing(cmd) => commands::drawing::run(cmd, &global),
        Commands::Itp(cmd) => commands::itp::run(cmd, &global),
        Commands::Ncr(cmd) => commands::ncr::run(cmd, &global),
        Commands::Inspection(cmd) => commands::inspection::run(cmd, &global),
        Commands::Mdr(args) => commands::mdr::run(args, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
        Commands::Completions(args) => commands::completions::run(args),
    };

    match result {
        // Already shown through the notifier
        Err(e) if e.downcast_ref::<Reported>().is_some() => std::process::exit(1),
        other => other,
    }
}

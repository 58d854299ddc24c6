use clap::Parser;
use miette::Result;
use qf::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
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
    qf::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => qf::cli::commands::init::run(args),
        Commands::Catalog(cmd) => qf::cli::commands::catalog::run(cmd, &global),
        Commands::Quote(args) => qf::cli::commands::quote::run(args, &global),
        Commands::Export(args) => qf::cli::commands::export::run(args, &global),
        Commands::Config(cmd) => qf::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => qf::cli::commands::completions::run(args),
    }
}

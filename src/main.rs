use clap::Parser;
use rumake::parser;
use rumake::runner::{self, ShellRunner};
use rumake::utils::log::{log, LogLevel};
use rumake::utils::report;

#[derive(Parser)]
#[command(name = "rumake", version, about = "Runs a section of a makefile")]
struct Args {
    /// The makefile to execute
    #[arg(short = 'f', long = "file", default_value = "makefile")]
    file: String,
    /// Section of the makefile to run
    #[arg(short = 's', long = "section", default_value = "ALL")]
    section: String,
}

fn main() {
    let args = Args::parse();

    let wd = std::env::current_dir().unwrap_or_else(|why| {
        log(
            LogLevel::Error,
            &format!("Could not read working directory: {}", why),
        );
        std::process::exit(1);
    });
    let wd = wd.to_string_lossy().to_string();
    let makefile = std::path::Path::new(&wd)
        .join(&args.file)
        .to_string_lossy()
        .to_string();
    let section = args.section.to_uppercase();

    let (_globals, sections) = parser::parse_makefile(&makefile, &wd).unwrap_or_else(|why| {
        log(LogLevel::Error, &format!("Error: {}", why));
        std::process::exit(1);
    });

    // The requested section must exist and hold at least one command
    if !sections.is_runnable(&section) {
        log(
            LogLevel::Error,
            "Invalid section name or no commands in the section",
        );
        std::process::exit(1);
    }

    if let Err(why) = runner::run_section(&section, &sections, &ShellRunner) {
        log(LogLevel::Error, &format!("Error: {}", why));
        std::process::exit(1);
    }

    report::finished("Make finished");
}

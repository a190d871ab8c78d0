//TODO: update clap to remove the need for this
#![allow(dangerous_implicit_autorefs)]

use std::io;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, App, AppSettings, Arg,
    ArgMatches, SubCommand,
};
use dirpack::{
    create, extract, list, verify, CollisionPolicy, PackOptions, UnpackOptions, UnsupportedPolicy,
};
use tracing::Level;

fn collision_policy(matches: &ArgMatches, name: &str) -> CollisionPolicy {
    match matches.value_of(name) {
        Some("overwrite") => CollisionPolicy::Overwrite,
        Some("skip") => CollisionPolicy::Skip,
        _ => CollisionPolicy::Error,
    }
}

fn init_logging(matches: &ArgMatches) {
    let level = if matches.is_present("quiet") {
        Level::ERROR
    } else {
        match matches.occurrences_of("verbose") {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let arg_archive = Arg::with_name("archive")
        .help("Archive file, '-' for stdin or stdout")
        .short("a")
        .long("archive")
        .required(true)
        .takes_value(true)
        .value_name("FILE");

    let arg_basedir = Arg::with_name("basedir")
        .help("Directory to pack or unpack to (defaults to '.')")
        .required(true)
        .value_name("DIR")
        .default_value(".");

    let policies = ["overwrite", "error", "skip"];

    let matches = App::new(crate_name!())
        .author(crate_authors!(", "))
        .about(crate_description!())
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .help("Log more, repeat for debug output")
                .short("v")
                .long("verbose")
                .multiple(true),
        )
        .arg(
            Arg::with_name("quiet")
                .help("Only log errors")
                .short("q")
                .long("quiet")
                .conflicts_with("verbose"),
        )
        .subcommand(
            SubCommand::with_name("create")
                .about("Create archive")
                .arg(&arg_archive)
                .arg(&arg_basedir)
                .arg(
                    Arg::with_name("fail-unsupported")
                        .help("Fail on symlinks and special files instead of skipping them")
                        .long("fail-unsupported"),
                ),
        )
        .subcommand(
            SubCommand::with_name("extract")
                .about("Extract archive")
                .arg(&arg_archive)
                .arg(&arg_basedir)
                .arg(
                    Arg::with_name("on-duplicate")
                        .help("What to do when a file appears twice in the archive")
                        .long("on-duplicate")
                        .takes_value(true)
                        .value_name("POLICY")
                        .possible_values(&policies)
                        .default_value("error"),
                )
                .arg(
                    Arg::with_name("on-conflict")
                        .help("What to do when the destination holds another file type")
                        .long("on-conflict")
                        .takes_value(true)
                        .value_name("POLICY")
                        .possible_values(&policies)
                        .default_value("error"),
                )
                .arg(
                    Arg::with_name("dir-mode")
                        .help("Mode for created directories, in octal (defaults to 775)")
                        .long("dir-mode")
                        .takes_value(true)
                        .value_name("MODE"),
                ),
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List archive")
                .arg(&arg_archive),
        )
        .subcommand(
            SubCommand::with_name("verify")
                .about("Verify extracted files against archive")
                .arg(&arg_archive)
                .arg(&arg_basedir),
        )
        .get_matches();

    init_logging(&matches);

    if let Some(matches) = matches.subcommand_matches("create") {
        let options = PackOptions {
            unsupported: if matches.is_present("fail-unsupported") {
                UnsupportedPolicy::Error
            } else {
                UnsupportedPolicy::Skip
            },
        };
        create(
            matches.value_of("archive").unwrap(),
            matches.value_of("basedir").unwrap(),
            options,
        )?;
    } else if let Some(matches) = matches.subcommand_matches("extract") {
        let mut options = UnpackOptions {
            duplicates: collision_policy(matches, "on-duplicate"),
            conflicts: collision_policy(matches, "on-conflict"),
            ..UnpackOptions::default()
        };
        if let Some(mode) = matches.value_of("dir-mode") {
            options.dir_mode = u32::from_str_radix(mode, 8)
                .map_err(|err| anyhow::anyhow!("invalid directory mode '{}': {}", mode, err))?;
        }
        extract(
            matches.value_of("archive").unwrap(),
            matches.value_of("basedir").unwrap(),
            options,
        )?;
    } else if let Some(matches) = matches.subcommand_matches("list") {
        for entry in list(matches.value_of("archive").unwrap())? {
            println!("{}", entry);
        }
    } else if let Some(matches) = matches.subcommand_matches("verify") {
        verify(
            matches.value_of("archive").unwrap(),
            matches.value_of("basedir").unwrap(),
        )?;
    }
    Ok(())
}

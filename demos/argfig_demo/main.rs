//! # argfig demo application
//!
//! A sample CLI tool that shows how to wire argfig into a real application.
//! It exists purely to demonstrate and manually verify argfig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example argfig_demo -- /name World
//! cargo run --example argfig_demo -- /?
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                              |
//! |-------------------------|-----------------------------------------------------------------|
//! | Flags and short names   | `-- -n World /v /color green`                                   |
//! | Default argument        | `-- -n World Howdy`                                             |
//! | Boolean negation        | `-- -n World /v-`                                               |
//! | Repeatable field        | `-- -n World /tag a /tag b`                                     |
//! | Struct field            | `-- -n World /listen localhost 8080`                            |
//! | Usage text              | `-- /?`                                                         |
//! | Response file           | `-- /n World /dry-run > args.rsp`, then `-- @args.rsp`          |
//! | Document include        | `-- config gen demo.toml`, then `-- @demo.toml`                 |
//! | Default document        | Create `argfig-demo.toml` in cwd, then run without arguments    |
//! | `config list`           | `-- config list`                                                |
//! | `config get`            | `-- config get color`                                           |
//! | `config schema`         | `-- config schema`                                              |
//! | `config set` / `unset`  | `-- config set argfig-demo.toml name World`                     |

mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use argfig::{Argfig, ArgfigError, ConfigAction, ConfigParser};

use config::DemoConfig;

const DEFAULT_DOCUMENT: &str = "argfig-demo.toml";
const RESET: &str = "\x1b[0m";

fn make_parser() -> Result<ConfigParser<DemoConfig>, ArgfigError> {
    let width = std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse().ok())
        .unwrap_or(argfig::DEFAULT_WIDTH);

    Ok(Argfig::builder::<DemoConfig>()
        .program_name("argfig-demo")
        .usage_width(width)
        .default_config(DEFAULT_DOCUMENT)
        .build()?)
}

/// Map `config <subcommand> ...` onto a [`ConfigAction`].
fn config_action(args: &[String]) -> Option<ConfigAction> {
    let arg = |i: usize| args.get(i).cloned();
    let action = match args.first()?.as_str() {
        "list" => ConfigAction::List,
        "get" => ConfigAction::Get { key: arg(1)? },
        "gen" => ConfigAction::Gen {
            output: arg(1).map(PathBuf::from),
        },
        "schema" => ConfigAction::Schema {
            output: arg(1).map(PathBuf::from),
        },
        "set" => ConfigAction::Set {
            path: arg(1)?.into(),
            key: arg(2)?,
            value: arg(3)?,
        },
        "unset" => ConfigAction::Unset {
            path: arg(1)?.into(),
            key: arg(2)?,
        },
        _ => return None,
    };
    Some(action)
}

fn greet(settings: &DemoConfig) {
    let color = settings.color.ansi();
    let greeting = if settings.greeting.is_empty() {
        "Hello"
    } else {
        settings.greeting.as_str()
    };
    let mut line = format!("{greeting}, {}!", settings.name);
    if let Some(listen) = &settings.listen {
        line.push_str(&format!(" (listening on {}:{})", listen.host, listen.port));
    }
    for tag in &settings.tags {
        line.push_str(&format!(" #{tag}"));
    }
    for _ in 0..settings.repeat.max(1) {
        println!("{color}{line}{RESET}");
    }
}

fn run(args: Vec<String>) -> Result<(), ArgfigError> {
    let parser = make_parser()?;

    if args.first().map(String::as_str) == Some("config") {
        let Some(action) = config_action(&args[1..]) else {
            eprintln!("usage: argfig-demo config list|get KEY|gen [PATH]|schema [PATH]|set PATH KEY VALUE|unset PATH KEY");
            return Ok(());
        };
        // Show what the default document resolves to; a missing required field is fine here.
        let mut settings = DemoConfig::default();
        let outcome = parser.parse(&mut settings, &[]);
        for (key, message) in outcome.errors.iter() {
            if message == "missing required argument" {
                continue;
            }
            if key.is_empty() {
                eprintln!("warning: {message}");
            } else {
                eprintln!("warning: {key}: {message}");
            }
        }
        return parser.handle_and_print(&action, &settings);
    }

    let settings = parser.load(args)?;
    if settings.dry_run {
        let mut replay = settings.clone();
        replay.dry_run = false;
        println!("{}", parser.render_command_line(&replay));
        return Ok(());
    }
    if settings.verbose {
        println!("{}", parser.write_document(&settings));
    }
    greet(&settings);
    Ok(())
}

fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ArgfigError::UsageRequested(usage)) => {
            print!("{usage}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

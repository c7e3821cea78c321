//! Settings for the argfig demo application.
//!
//! [`DemoConfig`] exercises each field shape the engine supports: scalars, a
//! required field, a default (bare-token) field, a repeatable field, an enum,
//! a flat struct and a command-line-only field.
//!
//! | Flag                  | Document key | Shape                   |
//! |-----------------------|--------------|-------------------------|
//! | `/name`, `/n`         | `name`       | required string         |
//! | `[/greeting]`         | `greeting`   | default argument        |
//! | `/verbose`, `/v`      | `verbose`    | boolean switch          |
//! | `/color`              | `color`      | enum                    |
//! | `/repeat`             | `repeat`     | unsigned integer        |
//! | `/listen`             | `listen`     | struct `<host> <port>`  |
//! | `/tag`                | `tag`        | repeatable string       |
//! | `/dry-run`            | (none)       | command line only       |

use argfig::{ErrorTable, Field, FieldValue, Settings, TypeTag, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Yellow,
    Red,
    Green,
    Blue,
}

impl Color {
    const NAMES: [&'static str; 4] = ["Yellow", "Red", "Green", "Blue"];

    pub fn ansi(self) -> &'static str {
        match self {
            Color::Yellow => "\x1b[33m",
            Color::Red => "\x1b[31m",
            Color::Green => "\x1b[32m",
            Color::Blue => "\x1b[34m",
        }
    }
}

impl FieldValue for Color {
    fn type_tag() -> TypeTag {
        TypeTag::enumeration("Color", &Color::NAMES)
    }

    fn into_value(self) -> Value {
        Value::Enum(Color::NAMES[self as usize].to_string())
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::Enum(name) = value else {
            return None;
        };
        match name.as_str() {
            "Yellow" => Some(Color::Yellow),
            "Red" => Some(Color::Red),
            "Green" => Some(Color::Green),
            "Blue" => Some(Color::Blue),
            _ => None,
        }
    }
}

/// Address to listen on, given as `/listen <host> <port>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listen {
    pub host: String,
    pub port: u32,
}

impl FieldValue for Listen {
    fn type_tag() -> TypeTag {
        TypeTag::structure("Listen", vec![("host", TypeTag::String), ("port", TypeTag::UInt)])
    }

    fn into_value(self) -> Value {
        Value::Struct(vec![Value::String(self.host), Value::UInt(self.port)])
    }

    fn from_value(value: Value) -> Option<Self> {
        let Value::Struct(members) = value else {
            return None;
        };
        match <[Value; 2]>::try_from(members).ok()? {
            [Value::String(host), Value::UInt(port)] => Some(Listen { host, port }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemoConfig {
    pub name: String,
    pub greeting: String,
    pub verbose: bool,
    pub color: Color,
    pub repeat: u32,
    pub listen: Option<Listen>,
    pub tags: Vec<String>,
    pub dry_run: bool,
}

impl Settings for DemoConfig {
    const TYPE_NAME: &'static str = "DemoConfig";
    const VERSION: &'static str = "1.0";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::<Self>::new("name", |c| &c.name, |c| &mut c.name)
                .short("n")
                .required()
                .help("Who to greet."),
            Field::<Self>::new("greeting", |c| &c.greeting, |c| &mut c.greeting)
                .default_argument()
                .help("Greeting text. Defaults to \"Hello\"."),
            Field::<Self>::new("verbose", |c| &c.verbose, |c| &mut c.verbose)
                .short("v")
                .help("Print the resolved settings before greeting."),
            Field::<Self>::new("color", |c| &c.color, |c| &mut c.color)
                .help("Terminal color for the greeting."),
            Field::<Self>::new("repeat", |c| &c.repeat, |c| &mut c.repeat)
                .help("How many times to greet. Between 1 and 10."),
            Field::<Self>::new("listen", |c| &c.listen, |c| &mut c.listen)
                .help("Address to announce in the greeting."),
            Field::<Self>::new("tag", |c| &c.tags, |c| &mut c.tags)
                .help("Labels appended to the greeting."),
            Field::<Self>::new("dry-run", |c| &c.dry_run, |c| &mut c.dry_run)
                .cli_only()
                .help("Print the command line that reproduces these settings and exit."),
        ]
    }

    fn validate(&self, errors: &mut ErrorTable) {
        if self.repeat > 10 {
            errors.add("repeat", "must be between 1 and 10");
        }
    }
}

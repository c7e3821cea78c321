#[cfg(test)]
pub mod test {
    use crate::context::ErrorTable;
    use crate::schema::{Field, FieldValue, Settings};
    use crate::types::{TypeTag, Value, Version};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum Mode {
        #[default]
        Fast,
        Slow,
    }

    impl FieldValue for Mode {
        fn type_tag() -> TypeTag {
            TypeTag::enumeration("Mode", &["Fast", "Slow"])
        }

        fn into_value(self) -> Value {
            let name = match self {
                Mode::Fast => "Fast",
                Mode::Slow => "Slow",
            };
            Value::Enum(name.into())
        }

        fn from_value(value: Value) -> Option<Self> {
            match value {
                Value::Enum(name) if name == "Fast" => Some(Mode::Fast),
                Value::Enum(name) if name == "Slow" => Some(Mode::Slow),
                _ => None,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Point {
        pub x: i32,
        pub y: i32,
    }

    impl FieldValue for Point {
        fn type_tag() -> TypeTag {
            TypeTag::structure("Point", vec![("x", TypeTag::Int), ("y", TypeTag::Int)])
        }

        fn into_value(self) -> Value {
            Value::Struct(vec![Value::Int(self.x), Value::Int(self.y)])
        }

        fn from_value(value: Value) -> Option<Self> {
            match value {
                Value::Struct(members) => match members.as_slice() {
                    [Value::Int(x), Value::Int(y)] => Some(Point { x: *x, y: *y }),
                    _ => None,
                },
                _ => None,
            }
        }
    }

    /// Exercises every shape the engine supports.
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Build {
        pub name: String,
        pub count: Vec<i32>,
        pub target: String,
        pub verbose: bool,
        pub strict: bool,
        pub mode: Mode,
        pub origin: Option<Point>,
        pub waypoints: Vec<Point>,
        pub min_version: Option<Version>,
        pub ratio: f64,
        pub limit: Option<u64>,
        pub tags: Vec<String>,
        pub log: String,
        pub secret: String,
    }

    impl Settings for Build {
        const TYPE_NAME: &'static str = "Build";
        const VERSION: &'static str = "2.1";

        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::<Self>::new("name", |s| &s.name, |s| &mut s.name)
                    .short("n")
                    .required()
                    .help("Name of the build."),
                Field::<Self>::new("count", |s| &s.count, |s| &mut s.count)
                    .help("Counts to add up."),
                Field::<Self>::new("target", |s| &s.target, |s| &mut s.target)
                    .default_argument()
                    .help("File to build."),
                Field::<Self>::new("verbose", |s| &s.verbose, |s| &mut s.verbose)
                    .short("v")
                    .help("Print more output."),
                Field::<Self>::new("strict", |s| &s.strict, |s| &mut s.strict)
                    .no_negation()
                    .help("Treat warnings as errors."),
                Field::<Self>::new("mode", |s| &s.mode, |s| &mut s.mode).help("Build mode."),
                Field::<Self>::new("origin", |s| &s.origin, |s| &mut s.origin)
                    .help("Starting point."),
                Field::<Self>::new("waypoints", |s| &s.waypoints, |s| &mut s.waypoints)
                    .short("w")
                    .help("Points to visit."),
                Field::<Self>::new("min-version", |s| &s.min_version, |s| &mut s.min_version)
                    .help("Oldest accepted version."),
                Field::<Self>::new("ratio", |s| &s.ratio, |s| &mut s.ratio)
                    .help("A ratio between 0 and 1."),
                Field::<Self>::new("limit", |s| &s.limit, |s| &mut s.limit)
                    .help("Upper bound."),
                Field::<Self>::new("tags", |s| &s.tags, |s| &mut s.tags).help("Free-form tags."),
                Field::<Self>::new("log", |s| &s.log, |s| &mut s.log)
                    .cli_only()
                    .help("Log file for this run."),
                Field::<Self>::new("secret", |s| &s.secret, |s| &mut s.secret).hidden(),
            ]
        }

        fn validate(&self, errors: &mut ErrorTable) {
            if !(0.0..=1.0).contains(&self.ratio) {
                errors.add("ratio", "must be between 0 and 1");
            }
        }
    }

    /// A schema without a default field.
    #[derive(Debug, Clone, PartialEq, Default)]
    pub struct Switches {
        pub fast: bool,
        pub level: i32,
    }

    impl Settings for Switches {
        const TYPE_NAME: &'static str = "Switches";

        fn fields() -> Vec<Field<Self>> {
            vec![
                Field::<Self>::new("fast", |s| &s.fast, |s| &mut s.fast).short("f"),
                Field::<Self>::new("level", |s| &s.level, |s| &mut s.level).short("l"),
            ]
        }
    }

    pub fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }
}

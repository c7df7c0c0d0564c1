use fieldmap::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Server {
    host: String,
    port: u16,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Credentials {
    client_secret: Option<String>,
    storage: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Settings {
    name: String,
    verbose: bool,
    retries: Option<u32>,
    server: Server,
    credentials: Credentials,
}

fn server_schema() -> ConfigSchema<Server> {
    ConfigSchema::builder()
        .field(
            "host",
            SerOption::new(|s: &Server| Some(s.host.clone())),
            DeserOption::new(|s: &mut Server, v: String| s.host = v),
        )
        .unwrap()
        .field(
            "port",
            SerOption::new(|s: &Server| Some(s.port)),
            DeserOption::new(|s: &mut Server, v: u16| s.port = v).kind(Coercion::integer()),
        )
        .unwrap()
        .build()
}

fn credentials_schema() -> ConfigSchema<Credentials> {
    ConfigSchema::builder()
        .field(
            "client_secret",
            SerOption::new(|c: &Credentials| c.client_secret.clone()).optional(),
            DeserOption::new(|c: &mut Credentials, v: String| c.client_secret = Some(v)).optional(),
        )
        .unwrap()
        .field(
            "storage",
            SerOption::new(|c: &Credentials| c.storage.clone()).optional(),
            DeserOption::new(|c: &mut Credentials, v: String| c.storage = Some(v)).optional(),
        )
        .unwrap()
        .build()
}

fn settings_schema() -> ConfigSchema<Settings> {
    ConfigSchema::builder()
        .field(
            "name",
            SerOption::new(|s: &Settings| Some(s.name.clone())).section("app"),
            DeserOption::new(|s: &mut Settings, v: String| s.name = v).section("app"),
        )
        .unwrap()
        .field(
            "verbose",
            SerOption::new(|s: &Settings| Some(s.verbose)).section("app"),
            DeserOption::new(|s: &mut Settings, v: bool| s.verbose = v)
                .section("app")
                .kind(Coercion::boolean()),
        )
        .unwrap()
        .field(
            "retries",
            SerOption::new(|s: &Settings| s.retries)
                .section("app")
                .optional()
                .default(3),
            DeserOption::new(|s: &mut Settings, v: u32| s.retries = Some(v))
                .section("app")
                .optional()
                .kind(Coercion::integer()),
        )
        .unwrap()
        .field(
            "server",
            SerSection::new(server_schema(), |s: &Settings| &s.server),
            DeserSection::new(server_schema(), |s: &mut Settings| &mut s.server),
        )
        .unwrap()
        .field(
            "credentials",
            SerSection::new(credentials_schema(), |s: &Settings| &s.credentials).name("auth"),
            DeserSection::new(credentials_schema(), |s: &mut Settings| &mut s.credentials)
                .name("auth")
                .optional(),
        )
        .unwrap()
        .build()
}

fn sample_settings() -> Settings {
    Settings {
        name: "uploader".to_string(),
        verbose: true,
        retries: Some(5),
        server: Server {
            host: "localhost".to_string(),
            port: 8080,
        },
        credentials: Credentials {
            client_secret: Some("client_secret.json".to_string()),
            storage: Some("credentials.storage".to_string()),
        },
    }
}

#[test]
fn test_to_config_layout() {
    let document = settings_schema()
        .to_config(&sample_settings(), None)
        .unwrap()
        .unwrap();
    let expected = "\
[app]
name = uploader
verbose = true
retries = 5

[server]
host = localhost
port = 8080

[auth]
client_secret = client_secret.json
storage = credentials.storage

";
    assert_eq!(document.to_string(), expected);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.ini");
    let schema = settings_schema();
    let settings = sample_settings();

    assert!(schema.to_config(&settings, Some(&path)).unwrap().is_none());
    let loaded = schema.load_config(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_optional_values_skipped_and_defaulted() {
    let settings = Settings {
        retries: None,
        credentials: Credentials {
            client_secret: None,
            storage: Some("store".to_string()),
        },
        ..sample_settings()
    };
    let document = settings_schema().to_ini(&settings).unwrap();
    assert_eq!(document.get("app", "retries"), Some("3"));
    assert_eq!(document.get("auth", "client_secret"), None);
    assert_eq!(document.get("auth", "storage"), Some("store"));
}

#[test]
fn test_missing_section() {
    let raw = "[app]\nname = x\nverbose = no\n";
    let mut settings = Settings::default();
    match settings_schema().from_config_str(&mut settings, raw) {
        Err(Error::MissingSection { section, attribute }) => {
            assert_eq!(section, "server");
            assert_eq!(attribute, "host");
        }
        other => panic!("expected MissingSection, got {other:?}"),
    }
}

#[test]
fn test_missing_option() {
    let raw = "[app]\nverbose = no\n\n[server]\nhost = h\nport = 1\n";
    let mut settings = Settings::default();
    match settings_schema().from_config_str(&mut settings, raw) {
        Err(Error::MissingOption {
            section, option, ..
        }) => {
            assert_eq!(section, "app");
            assert_eq!(option, "name");
        }
        other => panic!("expected MissingOption, got {other:?}"),
    }
}

#[test]
fn test_optional_section_may_be_absent() {
    let raw = "[app]\nname = x\nverbose = off\n\n[server]\nhost = h\nport = 1\n";
    let mut settings = Settings {
        credentials: Credentials {
            client_secret: Some("kept".to_string()),
            storage: None,
        },
        ..Settings::default()
    };
    settings_schema()
        .from_config_str(&mut settings, raw)
        .unwrap();
    assert_eq!(settings.name, "x");
    assert!(!settings.verbose);
    assert_eq!(settings.retries, None);
    assert_eq!(settings.server.port, 1);
    assert_eq!(settings.credentials.client_secret.as_deref(), Some("kept"));
}

#[test]
fn test_default_section_supplies_fallbacks() {
    let raw = "[DEFAULT]\nretries = 7\n\n[app]\nname = x\nverbose = yes\n\n[server]\nhost = h\nport = 2\n";
    let mut settings = Settings::default();
    settings_schema()
        .from_config_str(&mut settings, raw)
        .unwrap();
    assert_eq!(settings.retries, Some(7));
    assert!(settings.verbose);
}

#[test]
fn test_bad_integer_is_a_coercion_error() {
    let raw = "[app]\nname = x\nverbose = yes\n\n[server]\nhost = h\nport = eighty\n";
    let mut settings = Settings::default();
    let err = settings_schema()
        .from_config_str(&mut settings, raw)
        .unwrap_err();
    assert!(matches!(err, Error::Coercion { ref attribute, .. } if attribute == "port"));
}

#[test]
fn test_failed_to_config_writes_nothing() {
    #[derive(Default)]
    struct Token {
        value: Option<String>,
    }

    let schema = ConfigSchema::builder()
        .serialize(
            "value",
            SerOption::new(|t: &Token| t.value.clone()).section("auth"),
        )
        .unwrap()
        .build();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.ini");
    let result = schema.to_config(&Token::default(), Some(&path));
    assert!(matches!(result, Err(Error::MissingValue { .. })));
    assert!(!path.exists());
}

#[test]
fn test_doubly_nested_sections_share_the_outer_name() {
    #[derive(Default)]
    struct Leaf {
        depth: u8,
    }
    #[derive(Default)]
    struct Middle {
        leaf: Leaf,
    }
    #[derive(Default)]
    struct Root {
        middle: Middle,
    }

    let leaf = ConfigSchema::builder()
        .field(
            "depth",
            SerOption::new(|l: &Leaf| Some(l.depth)),
            DeserOption::new(|l: &mut Leaf, d: u8| l.depth = d).kind(Coercion::integer()),
        )
        .unwrap()
        .build();
    let middle = ConfigSchema::builder()
        .field(
            "leaf",
            SerSection::new(leaf.clone(), |m: &Middle| &m.leaf),
            DeserSection::new(leaf, |m: &mut Middle| &mut m.leaf),
        )
        .unwrap()
        .build();
    let root = ConfigSchema::builder()
        .field(
            "middle",
            SerSection::new(middle.clone(), |r: &Root| &r.middle).name("outer"),
            DeserSection::new(middle, |r: &mut Root| &mut r.middle).name("outer"),
        )
        .unwrap()
        .build();

    let value = Root {
        middle: Middle {
            leaf: Leaf { depth: 3 },
        },
    };
    let document = root.to_ini(&value).unwrap();
    assert_eq!(document.get("outer", "depth"), Some("3"));
    assert!(!document.has_section("leaf"));

    let mut fresh = Root::default();
    root.from_ini(&mut fresh, &document).unwrap();
    assert_eq!(fresh.middle.leaf.depth, 3);
}

#[test]
fn test_multiline_values_survive_a_file_round_trip() {
    #[derive(Debug, Default, PartialEq)]
    struct Notes {
        description: String,
        footer: String,
    }

    let schema = ConfigSchema::builder()
        .field(
            "description",
            SerOption::new(|n: &Notes| Some(n.description.clone())).section("video"),
            DeserOption::new(|n: &mut Notes, v: String| n.description = v).section("video"),
        )
        .unwrap()
        .field(
            "footer",
            SerOption::new(|n: &Notes| Some(n.footer.clone())).section("video"),
            DeserOption::new(|n: &mut Notes, v: String| n.footer = v).section("video"),
        )
        .unwrap()
        .build();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.ini");
    for description in [
        "para one\n\npara two",
        "para one\n\n\n\npara two",
        "Watch this\n#travel #lake",
        "Credits\n; music by someone",
        "Steps:\n  1. pack\n  2. hike",
        "Tabbed\n\ttwice",
    ] {
        let notes = Notes {
            description: description.to_string(),
            footer: "end".to_string(),
        };
        schema.to_config(&notes, Some(&path)).unwrap();
        let loaded = schema.load_config(&path).unwrap();
        assert_eq!(loaded, notes, "written as {:?}", std::fs::read_to_string(&path));
    }
}

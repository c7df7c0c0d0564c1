// Integration tests for fieldmap using test fixtures
use fieldmap::prelude::*;
use fieldmap::IniError;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn get_test_file_path(subdir: &str, filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join(subdir)
        .join(filename)
}

fn read_test_file(subdir: &str, filename: &str) -> String {
    let path = get_test_file_path(subdir, filename);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read test file: {:?}", path))
}

#[derive(Debug, Default, Clone, PartialEq)]
struct OAuth {
    client_secrets: String,
    credentials_storage: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Upload {
    oauth: OAuth,
    title: String,
    description: Option<String>,
    category_id: u32,
    keywords: Vec<String>,
    privacy: String,
}

fn comma_list() -> Coercion {
    Coercion::new(|value| match value {
        Value::String(text) => Ok(Value::Array(
            text.split(',')
                .map(|part| Value::String(part.trim().to_owned()))
                .collect(),
        )),
        other => Ok(other),
    })
}

fn oauth_schema() -> ConfigSchema<OAuth> {
    ConfigSchema::builder()
        .field(
            "client_secrets",
            SerOption::new(|o: &OAuth| Some(o.client_secrets.clone())),
            DeserOption::new(|o: &mut OAuth, v: String| o.client_secrets = v),
        )
        .unwrap()
        .field(
            "credentials_storage",
            SerOption::new(|o: &OAuth| Some(o.credentials_storage.clone())),
            DeserOption::new(|o: &mut OAuth, v: String| o.credentials_storage = v),
        )
        .unwrap()
        .build()
}

fn upload_schema() -> ConfigSchema<Upload> {
    ConfigSchema::builder()
        .field(
            "oauth",
            SerSection::new(oauth_schema(), |u: &Upload| &u.oauth),
            DeserSection::new(oauth_schema(), |u: &mut Upload| &mut u.oauth),
        )
        .unwrap()
        .field(
            "title",
            SerOption::new(|u: &Upload| Some(u.title.clone())).section("video"),
            DeserOption::new(|u: &mut Upload, v: String| u.title = v).section("video"),
        )
        .unwrap()
        .field(
            "description",
            SerOption::new(|u: &Upload| u.description.clone())
                .section("video")
                .optional(),
            DeserOption::new(|u: &mut Upload, v: String| u.description = Some(v))
                .section("video")
                .optional(),
        )
        .unwrap()
        .field(
            "category_id",
            SerOption::new(|u: &Upload| Some(u.category_id)).section("video"),
            DeserOption::new(|u: &mut Upload, v: u32| u.category_id = v)
                .section("video")
                .kind(Coercion::integer()),
        )
        .unwrap()
        .field(
            "keywords",
            SerOption::new(|u: &Upload| Some(u.keywords.join(", "))).section("video"),
            DeserOption::new(|u: &mut Upload, v: Vec<String>| u.keywords = v)
                .section("video")
                .kind(comma_list()),
        )
        .unwrap()
        .field(
            "privacy",
            SerOption::new(|u: &Upload| Some(u.privacy.clone())).section("video"),
            DeserOption::new(|u: &mut Upload, v: String| u.privacy = v).section("video"),
        )
        .unwrap()
        .build()
}

#[derive(Debug, Default, PartialEq)]
struct Thumbnail {
    url: String,
    width: Option<u32>,
}

#[derive(Debug, Default, PartialEq)]
struct Video {
    title: String,
    tags: Vec<String>,
    category_id: u32,
    thumbnails: Vec<Thumbnail>,
    privacy_status: Option<String>,
    embeddable: Option<bool>,
}

fn thumbnail_schema() -> JsonSchema<Thumbnail> {
    JsonSchema::builder()
        .field(
            "url",
            SerField::new(|t: &Thumbnail| Some(t.url.clone())),
            DeserField::new(|t: &mut Thumbnail, v: String| t.url = v),
        )
        .unwrap()
        .field(
            "width",
            SerField::new(|t: &Thumbnail| t.width).optional(),
            DeserField::new(|t: &mut Thumbnail, v: u32| t.width = Some(v)).optional(),
        )
        .unwrap()
        .build()
}

fn video_schema() -> JsonSchema<Video> {
    JsonSchema::builder()
        .deserialize(
            "title",
            DeserField::new(|v: &mut Video, t: String| v.title = t).parent_keys(["snippet"]),
        )
        .unwrap()
        .deserialize(
            "tags",
            DeserField::new(|v: &mut Video, t: Vec<String>| v.tags = t)
                .parent_keys(["snippet"])
                .repeated(),
        )
        .unwrap()
        .deserialize(
            "category_id",
            DeserField::new(|v: &mut Video, c: u32| v.category_id = c)
                .parent_keys(["snippet"])
                .name_conv(NameConv::camel_case())
                .kind(Coercion::integer()),
        )
        .unwrap()
        .deserialize(
            "thumbnails",
            DeserObjectField::new_repeated(thumbnail_schema(), |v: &mut Video, t| {
                v.thumbnails = t
            })
            .parent_keys(["snippet"]),
        )
        .unwrap()
        .deserialize(
            "privacy_status",
            DeserField::new(|v: &mut Video, p: String| v.privacy_status = Some(p))
                .parent_keys(["status"])
                .name_conv(NameConv::camel_case()),
        )
        .unwrap()
        .deserialize(
            "embeddable",
            DeserField::new(|v: &mut Video, e: bool| v.embeddable = Some(e))
                .parent_keys(["status"])
                .optional(),
        )
        .unwrap()
        .build()
}

// Fixtures that should load successfully
mod ok_tests {
    use super::*;

    #[test]
    fn test_upload_config() {
        let path = get_test_file_path("ok", "upload.ini");
        let upload = upload_schema().load_config(&path).unwrap();

        assert_eq!(upload.oauth.client_secrets, "client_secrets.json");
        assert_eq!(upload.oauth.credentials_storage, "credentials.storage");
        assert_eq!(upload.title, "Summer trip");
        assert_eq!(
            upload.description.as_deref(),
            Some("Day one at the lake.\nDay two on the trail.")
        );
        assert_eq!(upload.category_id, 22);
        assert_eq!(upload.keywords, vec!["travel", "lake"]);
        // Comes from the DEFAULT section.
        assert_eq!(upload.privacy, "private");
    }

    #[test]
    fn test_upload_config_round_trip() {
        let schema = upload_schema();
        let upload = schema
            .load_config(&get_test_file_path("ok", "upload.ini"))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let copy_path = dir.path().join("upload.ini");
        schema.to_config(&upload, Some(&copy_path)).unwrap();

        let written = fs::read_to_string(&copy_path).unwrap();
        assert!(written.starts_with("[oauth]\n"));
        assert!(written.contains("description = Day one at the lake.\n\tDay two on the trail.\n"));

        let reloaded = schema.load_config(&copy_path).unwrap();
        assert_eq!(reloaded, upload);
    }

    #[test]
    fn test_video_json() {
        let path = get_test_file_path("ok", "video.json");
        let mut video = Video::default();
        video_schema()
            .from_json(&mut video, Some(&path), None)
            .unwrap();

        assert_eq!(video.title, "Summer trip");
        assert_eq!(video.tags, vec!["travel", "lake"]);
        assert_eq!(video.category_id, 22);
        assert_eq!(
            video.thumbnails,
            vec![
                Thumbnail {
                    url: "https://img.example/a.jpg".to_string(),
                    width: Some(120),
                },
                Thumbnail {
                    url: "https://img.example/b.jpg".to_string(),
                    width: None,
                },
            ]
        );
        assert_eq!(video.privacy_status.as_deref(), Some("unlisted"));
        assert_eq!(video.embeddable, Some(false));
    }

    #[test]
    fn test_video_json_from_text() {
        let raw = read_test_file("ok", "video.json");
        let mut video = Video::default();
        video_schema().from_json_str(&mut video, &raw).unwrap();
        assert_eq!(video.thumbnails.len(), 2);
    }

    #[test]
    fn test_video_yaml() {
        let raw = read_test_file("ok", "video.yaml");
        let mut video = Video::default();
        video_schema()
            .from_yaml(&mut video, None, Some(&raw))
            .unwrap();
        assert_eq!(video.tags, vec!["travel"]);
        assert_eq!(video.category_id, 22);
        assert!(video.thumbnails.is_empty());
        assert_eq!(video.embeddable, None);
    }
}

// Fixtures that should be rejected
mod bad_tests {
    use super::*;

    #[test]
    fn test_orphan_option() {
        let path = get_test_file_path("bad", "orphan_option.ini");
        let result = upload_schema().load_config(&path);
        assert!(
            matches!(result, Err(Error::Ini(IniError::MissingSectionHeader { .. }))),
            "Should fail on an option before any header: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_duplicate_option() {
        let path = get_test_file_path("bad", "duplicate_option.ini");
        let result = IniDocument::load(&path);
        match result {
            Err(Error::Ini(IniError::DuplicateOption {
                section, option, ..
            })) => {
                assert_eq!(section, "video");
                assert_eq!(option, "title");
            }
            other => panic!("Expected duplicate option, got {other:?}"),
        }
    }

    #[test]
    fn test_no_delimiter() {
        let path = get_test_file_path("bad", "no_delimiter.ini");
        let result = IniDocument::load(&path);
        assert!(matches!(
            result,
            Err(Error::Ini(IniError::MissingDelimiter { .. }))
        ));
    }

    #[test]
    fn test_array_root() {
        let path = get_test_file_path("bad", "array_root.json");
        let mut video = Video::default();
        let result = video_schema().from_json(&mut video, Some(&path), None);
        assert!(matches!(result, Err(Error::RootNotMapping)));
    }

    #[test]
    fn test_incomplete_video_reports_first_missing_field() {
        let raw = r#"{"snippet": {"title": "x", "tags": []}, "status": {}}"#;
        let mut video = Video::default();
        let result = video_schema().from_json_str(&mut video, raw);
        match result {
            Err(Error::MissingField { attribute, name }) => {
                assert_eq!(attribute, "category_id");
                assert_eq!(name, "categoryId");
            }
            other => panic!("Expected missing field, got {other:?}"),
        }
        // Fields before the failure were already applied.
        assert_eq!(video.title, "x");
    }
}

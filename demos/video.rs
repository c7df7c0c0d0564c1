//! Builds the JSON body of a video upload request from an INI settings file.
//!
//! ```text
//! cargo run --example video -- path/to/upload.ini
//! ```
//!
//! Without an argument a sample settings file is written to a temporary directory first.

use fieldmap::prelude::*;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

#[derive(Debug, Default)]
struct OAuth {
    client_secrets: String,
    credentials_storage: String,
}

#[derive(Debug, Default)]
struct Upload {
    oauth: OAuth,
    title: Option<String>,
    description: Option<String>,
    category_id: u32,
    keywords: Vec<String>,
    privacy_status: String,
}

const SAMPLE: &str = "[DEFAULT]
privacy_status = private

[oauth]
client_secrets = client_secrets.json
credentials_storage = upload-oauth2.json

[video]
title = Summer trip
description = Day one at the lake.
    Day two on the trail.
category_id = 22
keywords = travel, lake
";

fn settings_schema() -> std::result::Result<ConfigSchema<Upload>, ConstructionError> {
    let oauth = ConfigSchema::builder()
        .field(
            "client_secrets",
            SerOption::new(|o: &OAuth| Some(o.client_secrets.clone())),
            DeserOption::new(|o: &mut OAuth, v: String| o.client_secrets = v),
        )?
        .field(
            "credentials_storage",
            SerOption::new(|o: &OAuth| Some(o.credentials_storage.clone())),
            DeserOption::new(|o: &mut OAuth, v: String| o.credentials_storage = v),
        )?
        .build();

    let keywords = Coercion::new(|value| match value {
        serde_json::Value::String(text) => Ok(serde_json::Value::Array(
            text.split(',')
                .map(|word| serde_json::Value::String(word.trim().to_owned()))
                .collect(),
        )),
        other => Ok(other),
    });

    Ok(ConfigSchema::builder()
        .field(
            "oauth",
            SerSection::new(oauth.clone(), |u: &Upload| &u.oauth),
            DeserSection::new(oauth, |u: &mut Upload| &mut u.oauth),
        )?
        .deserialize(
            "title",
            DeserOption::new(|u: &mut Upload, v: String| u.title = Some(v)).section("video"),
        )?
        .deserialize(
            "description",
            DeserOption::new(|u: &mut Upload, v: String| u.description = Some(v))
                .section("video")
                .optional(),
        )?
        .deserialize(
            "category_id",
            DeserOption::new(|u: &mut Upload, v: u32| u.category_id = v)
                .section("video")
                .kind(Coercion::integer()),
        )?
        .deserialize(
            "keywords",
            DeserOption::new(|u: &mut Upload, v: Vec<String>| u.keywords = v)
                .section("video")
                .optional()
                .kind(keywords),
        )?
        .deserialize(
            "privacy_status",
            DeserOption::new(|u: &mut Upload, v: String| u.privacy_status = v).section("video"),
        )?
        .build())
}

fn request_schema() -> std::result::Result<JsonSchema<Upload>, ConstructionError> {
    let camel = NameConv::camel_case();
    Ok(JsonSchema::builder()
        .serialize(
            "title",
            SerField::new(|u: &Upload| u.title.clone()).parent_keys(["snippet"]),
        )?
        .serialize(
            "description",
            SerField::new(|u: &Upload| u.description.clone())
                .parent_keys(["snippet"])
                .optional(),
        )?
        .serialize(
            "keywords",
            SerField::new(|u: &Upload| Some(u.keywords.clone()))
                .parent_keys(["snippet"])
                .name("tags")
                .repeated(),
        )?
        .serialize(
            "category_id",
            SerField::new(|u: &Upload| Some(u.category_id))
                .parent_keys(["snippet"])
                .name_conv(camel.clone())
                .kind(Coercion::string()),
        )?
        .serialize(
            "privacy_status",
            SerField::new(|u: &Upload| Some(u.privacy_status.clone()))
                .parent_keys(["status"])
                .name_conv(camel),
        )?
        .build())
}

fn main() -> Result<()> {
    let scratch = tempfile::tempdir().into_diagnostic()?;
    let path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            let path = scratch.path().join("upload.ini");
            std::fs::write(&path, SAMPLE).into_diagnostic()?;
            path
        }
    };

    let upload = settings_schema()?.load_config(&path)?;
    println!(
        "authorizing with {} (tokens in {})",
        upload.oauth.client_secrets, upload.oauth.credentials_storage
    );

    let body = request_schema()?.to_json_string(&upload)?;
    println!("{body}");
    Ok(())
}

//! Commented config template written by `a3s-build init`.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::Config;

/// Render a commented `a3s-build.yml` from `config`.
///
/// The output parses back into an equal [`Config`] as long as `config`
/// itself is valid.
pub fn render_template(config: &Config) -> String {
    let image = &config.image;
    let build = &config.build;
    let registry = &config.registry;
    let buildkit = &config.buildkit;

    let name = if image.name.is_empty() {
        "a3s-build-sample"
    } else {
        image.name.as_str()
    };

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str("# file: a3s-build.yml\n");
    out.push_str("# Settings used by `a3s-build` to package the build context and build the image.\n");
    out.push_str("# Values may reference environment variables with dollar-brace syntax and an optional :- default.\n\n");

    out.push_str("# The image section describes the image and where its build context lives.\n");
    out.push_str("image:\n");
    out.push_str("  # name: Image name. Required.\n");
    let _ = writeln!(out, "  name: {}", scalar(name));
    out.push_str("\n  # tag: Image tag.\n");
    let _ = writeln!(out, "  tag: {}", scalar(&image.tag));
    out.push_str("\n  # path: Build context directory, relative to this file.\n");
    let _ = writeln!(out, "  path: {}", scalar(&image.path.to_string_lossy()));
    out.push_str("\n  # dockerfile: Dockerfile name inside the build context.\n");
    let _ = writeln!(out, "  dockerfile: {}", scalar(&image.dockerfile));
    out.push_str("\n  # build_args: Build-time variables as key: value.\n");
    out.push_str("  # Leave the value empty to take it from the builder's environment.\n");
    let build_args: BTreeMap<&str, Option<&str>> = image
        .build_args
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_deref()))
        .collect();
    write_map(&mut out, "build_args", &build_args);
    out.push_str("\n  # label: Image labels as key: value. Quote keys containing dots.\n");
    let labels: BTreeMap<&str, Option<&str>> = image
        .labels
        .iter()
        .map(|(k, v)| (k.as_str(), Some(v.as_str())))
        .collect();
    write_map(&mut out, "label", &labels);
    out.push_str("\n  # docker_host: Docker daemon address, e.g. unix:///var/run/docker.sock\n");
    match &image.docker_host {
        Some(host) => {
            let _ = writeln!(out, "  docker_host: {}", scalar(host));
        }
        None => out.push_str("  # docker_host: unix:///var/run/docker.sock\n"),
    }

    out.push_str("\n# The build section controls the build itself.\n");
    out.push_str("build:\n");
    out.push_str("  # target: Stage to build in a multi-stage Dockerfile. Empty builds the last stage.\n");
    let _ = writeln!(out, "  target: {}", scalar(&build.target));
    out.push_str("\n  # no_cache: Set true to build without the cache.\n");
    let _ = writeln!(out, "  no_cache: {}", build.no_cache);
    out.push_str("\n  # verbose: Set true to show the configuration before building.\n");
    let _ = writeln!(out, "  verbose: {}", build.verbose);

    out.push_str("\n# The registry section describes where the built image is pushed.\n");
    out.push_str("registry:\n");
    out.push_str("  # enabled: Push to the registry after building.\n");
    let _ = writeln!(out, "  enabled: {}", registry.enabled);
    out.push_str("\n  # host: Registry host and port.\n");
    let _ = writeln!(out, "  host: {}", scalar(&registry.host));
    out.push_str("\n  # project: Optional namespace inside the registry.\n");
    let _ = writeln!(out, "  project: {}", scalar(&registry.project));
    out.push_str("\n  # auth: Basic-auth credentials (username, password).\n");
    let auth: BTreeMap<&str, Option<&str>> = registry
        .auth
        .iter()
        .map(|(k, v)| (k.as_str(), Some(v.as_str())))
        .collect();
    write_map(&mut out, "auth", &auth);

    out.push_str("\n# The buildkit section switches the build to BuildKit.\n");
    out.push_str("buildkit:\n");
    out.push_str("  # enabled: Build with BuildKit.\n");
    let _ = writeln!(out, "  enabled: {}", buildkit.enabled);
    out.push_str("\n  # platform: Target platforms, e.g. [linux/amd64, linux/arm64].\n");
    if buildkit.platform.is_empty() {
        out.push_str("  platform: []\n");
    } else {
        out.push_str("  platform:\n");
        for p in &buildkit.platform {
            let _ = writeln!(out, "    - {}", scalar(p));
        }
    }
    out.push_str("\n  # remove: Remove the builder container when done.\n");
    let _ = writeln!(out, "  remove: {}", buildkit.remove);

    out
}

/// Write a two-level mapping, or `{}` when empty.
fn write_map(out: &mut String, key: &str, map: &BTreeMap<&str, Option<&str>>) {
    if map.is_empty() {
        let _ = writeln!(out, "  {key}: {{}}");
        return;
    }
    let _ = writeln!(out, "  {key}:");
    for (k, v) in map {
        match v {
            Some(v) => {
                let _ = writeln!(out, "    {}: {}", scalar(k), scalar(v));
            }
            None => {
                let _ = writeln!(out, "    {}:", scalar(k));
            }
        }
    }
}

/// Render a string as a YAML scalar, quoting when needed.
fn scalar(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("'{}'", value.replace('\'', "''")))
}

use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LOCALE: &str = "pl";

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let locales_dir = manifest_dir.join("locales");
    println!("cargo:rerun-if-changed={}", locales_dir.display());

    let locales = load_locales(&locales_dir);
    let generated = render_catalog(&locales);

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts"));
    fs::write(out_dir.join("mobywatel_i18n_generated.rs"), generated)
        .expect("failed to write generated i18n catalog");
}

fn load_locales(dir: &Path) -> BTreeMap<String, BTreeMap<String, String>> {
    let mut locales = BTreeMap::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return locales;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        println!("cargo:rerun-if-changed={}", path.display());

        let text = fs::read_to_string(&path)
            .unwrap_or_else(|error| panic!("failed to read {}: {error}", path.display()));
        let table = text
            .parse::<toml::Table>()
            .unwrap_or_else(|error| panic!("failed to parse {}: {error}", path.display()));

        let mut entries = BTreeMap::new();
        flatten_table("", &table, &mut entries);
        locales.insert(locale.to_string(), entries);
    }
    locales
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(text) => {
                out.insert(full_key, text.clone());
            }
            toml::Value::Table(nested) => flatten_table(&full_key, nested, out),
            other => panic!("i18n key `{full_key}` must be a string or a table, found {other:?}"),
        }
    }
}

fn render_catalog(locales: &BTreeMap<String, BTreeMap<String, String>>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "pub static DEFAULT_LOCALE: &str = {DEFAULT_LOCALE:?};");
    let _ = writeln!(
        out,
        "pub static LOCALES: &[(&str, &[(&str, &str)])] = &["
    );
    for (locale, entries) in locales {
        let _ = writeln!(out, "    ({locale:?}, &[");
        for (key, value) in entries {
            let _ = writeln!(out, "        ({key:?}, {value:?}),");
        }
        let _ = writeln!(out, "    ]),");
    }
    let _ = writeln!(out, "];");
    out
}

// i18n.rs
//
// Runtime strings for the overlay and the panel contents:
// - assets/i18n/<lang>.json next to the executable or in the working dir
// - English is compiled in and used for any key the selected language lacks
// - tr("key") / tr_with("key", [("name", "...")]) with {name} placeholders
//
// Language selection:
// - CLI: --lang <code> (en, es)
// - Env: GALLERY_LANG
// - Default: en

use once_cell::sync::{Lazy, OnceCell};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

pub const FALLBACK_LANG: &str = "en";

static BUILTIN: Lazy<HashMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../assets/i18n/en.json")).unwrap_or_default()
});

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn load_json_map(path: &Path) -> Option<HashMap<String, String>> {
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(map) => Some(map),
        Err(e) => {
            log::warn!("ignoring malformed strings file {}: {}", path.display(), e);
            None
        }
    }
}

fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let file = format!("{}.json", lang);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("i18n").join(&file);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("i18n").join(&file);
    if p.exists() {
        return Some(p);
    }

    None
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    find_lang_file(lang)
        .and_then(|p| load_json_map(&p))
        .unwrap_or_else(|| {
            if lang != FALLBACK_LANG {
                log::warn!("no strings for language '{}', using {}", lang, FALLBACK_LANG);
            }
            HashMap::new()
        })
}

/// Initialize global strings. Later calls replace the current language.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let map = load_lang(&lang);
    let i = I18n { lang, map };
    log::info!("language {} ({} strings)", i.lang, i.map.len());

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else {
        let _ = I18N.set(RwLock::new(i));
    }
}

/// Localized text for `key`; the key itself if nobody knows it.
pub fn tr(key: &str) -> String {
    if let Some(v) = I18N
        .get()
        .and_then(|l| l.read().ok())
        .and_then(|i| i.map.get(key).cloned())
    {
        return v;
    }
    BUILTIN.get(key).cloned().unwrap_or_else(|| key.to_string())
}

/// Localized text with `{name}` placeholders substituted.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}

pub fn resolve_lang_from_args() -> String {
    let mut it = std::env::args();
    while let Some(a) = it.next() {
        if a == "--lang" {
            if let Some(v) = it.next() {
                return v;
            }
        }
    }

    if let Ok(v) = std::env::var("GALLERY_LANG") {
        if !v.trim().is_empty() {
            return v;
        }
    }

    FALLBACK_LANG.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_strings_cover_every_panel() {
        for topic in ["about", "projects", "education", "skills", "experience", "contact"] {
            assert!(BUILTIN.contains_key(&format!("panel.{topic}.title")), "{topic}");
            assert!(BUILTIN.contains_key(&format!("panel.{topic}.description")), "{topic}");
        }
    }

    #[test]
    fn unknown_keys_come_back_verbatim() {
        assert_eq!(tr("no.such.key"), "no.such.key");
    }

    #[test]
    fn placeholders_are_substituted() {
        let s = tr_with("status.position", &[("x", "1.0".into()), ("z", "-2.0".into())]);
        assert!(s.contains("1.0") && s.contains("-2.0"), "{s}");
    }
}

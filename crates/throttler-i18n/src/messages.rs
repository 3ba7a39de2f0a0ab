//! Localized message lookup backed by Fluent bundles.

use crate::error::{I18nError, I18nResult};
use crate::locale::Locale;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use tracing::{debug, warn};

type Bundle = FluentBundle<FluentResource>;

/// Message accessor holding one bundle per supported locale.
pub struct Messages {
    bundles: HashMap<Locale, Bundle>,
    fallback: Locale,
}

impl std::fmt::Debug for Messages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messages")
            .field("locales", &self.bundles.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback)
            .finish()
    }
}

fn build_bundle(locale: Locale) -> I18nResult<Bundle> {
    let lang_id = locale.to_language_identifier()?;
    let resource = FluentResource::try_new(locale.resource().to_string()).map_err(|(_, errors)| {
        I18nError::FluentParse {
            locale: locale.code().to_string(),
            errors: errors.iter().map(|e| format!("{e:?}")).collect(),
        }
    })?;

    let mut bundle = FluentBundle::new_concurrent(vec![lang_id]);
    // Discord renders the isolation marks literally.
    bundle.set_use_isolating(false);
    bundle
        .add_resource(resource)
        .map_err(|errors| I18nError::FluentParse {
            locale: locale.code().to_string(),
            errors: errors.iter().map(|e| format!("{e:?}")).collect(),
        })?;
    Ok(bundle)
}

impl Messages {
    /// Load the embedded resources for every supported locale.
    pub fn new(fallback: Locale) -> I18nResult<Self> {
        let mut bundles = HashMap::new();
        for locale in Locale::all() {
            bundles.insert(locale, build_bundle(locale)?);
            debug!(%locale, "loaded message bundle");
        }
        Ok(Self { bundles, fallback })
    }

    /// Locale used when none is requested or the requested one is unknown.
    pub const fn fallback(&self) -> Locale {
        self.fallback
    }

    /// Pick the bundle for a Discord locale tag.
    pub fn resolve_locale(&self, tag: Option<&str>) -> Locale {
        tag.and_then(Locale::from_code).unwrap_or(self.fallback)
    }

    /// Gets a localized message.
    pub fn get(&self, locale: Locale, key: &str) -> String {
        self.lookup(locale, key, None)
    }

    /// Gets a localized message with arguments.
    pub fn get_with_args(&self, locale: Locale, key: &str, args: &FluentArgs<'_>) -> String {
        self.lookup(locale, key, Some(args))
    }

    /// Strict formatting; surfaces missing keys and unresolved placeholders.
    pub fn format(&self, locale: Locale, key: &str, args: Option<&FluentArgs<'_>>) -> I18nResult<String> {
        let bundle = self
            .bundles
            .get(&locale)
            .ok_or_else(|| I18nError::InvalidLanguageId(locale.code().to_string()))?;
        let pattern = bundle
            .get_message(key)
            .and_then(|message| message.value())
            .ok_or_else(|| I18nError::MessageNotFound { key: key.to_string() })?;

        let mut errors = Vec::new();
        let formatted = bundle.format_pattern(pattern, args, &mut errors);
        if errors.is_empty() {
            Ok(formatted.into_owned())
        } else {
            Err(I18nError::MessageFormat {
                key: key.to_string(),
                errors: errors.iter().map(|e| format!("{e:?}")).collect(),
            })
        }
    }

    fn lookup(&self, locale: Locale, key: &str, args: Option<&FluentArgs<'_>>) -> String {
        match self.format(locale, key, args) {
            Ok(text) => text,
            Err(err) if locale != self.fallback => {
                warn!(%locale, key, error = %err, "falling back to default locale");
                self.lookup(self.fallback, key, args)
            }
            Err(err) => {
                warn!(%locale, key, error = %err, "message unavailable");
                key.to_string()
            }
        }
    }
}

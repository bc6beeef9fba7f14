//! User-facing error text
//!
//! The engine picks a [`MessageKey`] and positional arguments; a
//! [`Localizer`] owns the wording.

use std::str::FromStr;

/// Supported caller locales
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

impl FromStr for Locale {
    type Err = String;

    /// Accepts bare languages and region tags (`fr`, `fr-CA`, `en_US`).
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let language = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match language.as_str() {
            "en" => Ok(Locale::En),
            "fr" => Ok(Locale::Fr),
            _ => Err(format!("unsupported locale `{tag}`")),
        }
    }
}

impl Locale {
    /// First supported language of an `Accept-Language` header value.
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .filter_map(|entry| entry.split(';').next())
            .find_map(|tag| tag.parse().ok())
            .unwrap_or_default()
    }
}

/// Every user-facing message the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    MissingLimit,
    ConflictingLimit,
    InvalidLimitType,
    NegativeLimit,
    LimitTooLarge,
    InvalidCursor,
    UnknownOrderField,
    LoadFailure,
}

/// Renders a message in a locale.
pub trait Localizer: Send + Sync {
    fn localize(&self, locale: Locale, key: MessageKey, args: &[String]) -> String;
}

/// Built-in English and French messages
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Catalog {
    fn template(locale: Locale, key: MessageKey) -> &'static str {
        match (locale, key) {
            (Locale::En, MessageKey::MissingLimit) => {
                "You must provide a `first` or `last` value to properly paginate the `{0}` connection."
            }
            (Locale::En, MessageKey::ConflictingLimit) => {
                "Passing both `first` and `last` to paginate the `{0}` connection is not supported."
            }
            (Locale::En, MessageKey::InvalidLimitType) => {
                "`{0}` must be of type `number` not `{1}`."
            }
            (Locale::En, MessageKey::NegativeLimit) => {
                "`{0}` on the `{1}` connection cannot be less than zero."
            }
            (Locale::En, MessageKey::LimitTooLarge) => {
                "Requesting `{0}` records on the `{1}` connection exceeds the `{2}` limit of {3} records."
            }
            (Locale::En, MessageKey::InvalidCursor) => {
                "Invalid `{0}` cursor supplied to the `{1}` connection."
            }
            (Locale::En, MessageKey::UnknownOrderField) => {
                "Unable to order the `{0}` connection by unknown field `{1}`."
            }
            (Locale::En, MessageKey::LoadFailure) => {
                "Unable to load `{0}` records. Please try again."
            }

            (Locale::Fr, MessageKey::MissingLimit) => {
                "Vous devez fournir une valeur `first` ou `last` pour paginer correctement la connexion `{0}`."
            }
            (Locale::Fr, MessageKey::ConflictingLimit) => {
                "L'utilisation simultanée de `first` et `last` pour paginer la connexion `{0}` n'est pas prise en charge."
            }
            (Locale::Fr, MessageKey::InvalidLimitType) => {
                "`{0}` doit être de type `number` et non `{1}`."
            }
            (Locale::Fr, MessageKey::NegativeLimit) => {
                "`{0}` sur la connexion `{1}` ne peut être inférieur à zéro."
            }
            (Locale::Fr, MessageKey::LimitTooLarge) => {
                "La demande de `{0}` enregistrements sur la connexion `{1}` dépasse la limite `{2}` de {3} enregistrements."
            }
            (Locale::Fr, MessageKey::InvalidCursor) => {
                "Curseur `{0}` invalide fourni à la connexion `{1}`."
            }
            (Locale::Fr, MessageKey::UnknownOrderField) => {
                "Impossible de trier la connexion `{0}` selon le champ inconnu `{1}`."
            }
            (Locale::Fr, MessageKey::LoadFailure) => {
                "Impossible de charger les enregistrements `{0}`. Veuillez réessayer."
            }
        }
    }
}

impl Localizer for Catalog {
    fn localize(&self, locale: Locale, key: MessageKey, args: &[String]) -> String {
        interpolate(Self::template(locale, key), args)
    }
}

/// Replace `{0}`, `{1}`, ... with positional arguments.
///
/// Placeholders without a matching argument are left as-is.
pub fn interpolate(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let replaced = tail.find('}').and_then(|close| {
            let index: usize = tail[1..close].parse().ok()?;
            let arg = args.get(index)?;
            Some((arg, close))
        });
        match replaced {
            Some((arg, close)) => {
                out.push_str(arg);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

//! Shop settings: price tier colors and the receipt template.
//!
//! Settings are plain structs with defaults. Updates arrive as a
//! [`SettingsOverride`] whose fields are all optional and are merged with
//! [`AppSettings::apply`], so a client only sends what it changes.

mod router;

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::info;

pub use router::settings_router;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierColors {
    pub luxus: String,
    pub teuer: String,
    pub mittel: String,
    pub guenstig: String,
}

impl Default for TierColors {
    fn default() -> Self {
        Self {
            luxus: "#FEF3C7".to_string(),
            teuer: "#DBEAFE".to_string(),
            mittel: "#D1FAE5".to_string(),
            guenstig: "#F1F5F9".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptTemplate {
    pub store_name: String,
    pub store_address: String,
    pub store_city: String,
    pub store_phone: String,
    pub footer_text: String,
    pub sub_footer_text: String,
    pub show_store_name: bool,
    pub show_address: bool,
    pub show_phone: bool,
    pub show_date: bool,
    pub show_receipt_id: bool,
    pub show_item_details: bool,
    pub show_relevance: bool,
    pub show_item_count: bool,
    pub show_footer: bool,
}

impl Default for ReceiptTemplate {
    fn default() -> Self {
        Self {
            store_name: "Smillå-Store GmbH".to_string(),
            store_address: "Musterstrasse 123".to_string(),
            store_city: "8000 Zürich".to_string(),
            store_phone: "+41 44 123 45 67".to_string(),
            footer_text: "Vielen Dank für Ihren Verkauf!".to_string(),
            sub_footer_text: "Diese Quittung dient als Nachweis.".to_string(),
            show_store_name: true,
            show_address: true,
            show_phone: true,
            show_date: true,
            show_receipt_id: true,
            show_item_details: true,
            show_relevance: true,
            show_item_count: true,
            show_footer: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub colors: TierColors,
    pub receipt: ReceiptTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierColorsOverride {
    pub luxus: Option<String>,
    pub teuer: Option<String>,
    pub mittel: Option<String>,
    pub guenstig: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptOverride {
    pub store_name: Option<String>,
    pub store_address: Option<String>,
    pub store_city: Option<String>,
    pub store_phone: Option<String>,
    pub footer_text: Option<String>,
    pub sub_footer_text: Option<String>,
    pub show_store_name: Option<bool>,
    pub show_address: Option<bool>,
    pub show_phone: Option<bool>,
    pub show_date: Option<bool>,
    pub show_receipt_id: Option<bool>,
    pub show_item_details: Option<bool>,
    pub show_relevance: Option<bool>,
    pub show_item_count: Option<bool>,
    pub show_footer: Option<bool>,
}

/// Partial settings update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsOverride {
    pub colors: Option<TierColorsOverride>,
    pub receipt: Option<ReceiptOverride>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

impl AppSettings {
    /// Replaces exactly the fields present in `changes`.
    pub fn apply(&mut self, changes: SettingsOverride) {
        if let Some(colors) = changes.colors {
            set(&mut self.colors.luxus, colors.luxus);
            set(&mut self.colors.teuer, colors.teuer);
            set(&mut self.colors.mittel, colors.mittel);
            set(&mut self.colors.guenstig, colors.guenstig);
        }
        if let Some(receipt) = changes.receipt {
            let target = &mut self.receipt;
            set(&mut target.store_name, receipt.store_name);
            set(&mut target.store_address, receipt.store_address);
            set(&mut target.store_city, receipt.store_city);
            set(&mut target.store_phone, receipt.store_phone);
            set(&mut target.footer_text, receipt.footer_text);
            set(&mut target.sub_footer_text, receipt.sub_footer_text);
            set(&mut target.show_store_name, receipt.show_store_name);
            set(&mut target.show_address, receipt.show_address);
            set(&mut target.show_phone, receipt.show_phone);
            set(&mut target.show_date, receipt.show_date);
            set(&mut target.show_receipt_id, receipt.show_receipt_id);
            set(&mut target.show_item_details, receipt.show_item_details);
            set(&mut target.show_relevance, receipt.show_relevance);
            set(&mut target.show_item_count, receipt.show_item_count);
            set(&mut target.show_footer, receipt.show_footer);
        }
    }
}

impl SettingsOverride {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let Some(colors) = &self.colors else {
            return Ok(());
        };
        [&colors.luxus, &colors.teuer, &colors.mittel, &colors.guenstig]
            .into_iter()
            .flatten()
            .find(|value| !is_hex_color(value))
            .map_or(Ok(()), |value| {
                Err(SettingsError::Validation(format!(
                    "color '{value}' must look like #RRGGBB"
                )))
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{0}")]
    Validation(String),
    #[error("settings unavailable")]
    Unavailable,
}

/// Holds the live settings for the running shop.
#[derive(Debug, Default)]
pub struct SettingsService {
    current: Mutex<AppSettings>,
}

impl SettingsService {
    pub fn new(initial: AppSettings) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, AppSettings>, SettingsError> {
        self.current.lock().map_err(|_| SettingsError::Unavailable)
    }

    pub fn get(&self) -> Result<AppSettings, SettingsError> {
        Ok(self.guard()?.clone())
    }

    pub fn update(&self, changes: SettingsOverride) -> Result<AppSettings, SettingsError> {
        changes.validate()?;
        let mut current = self.guard()?;
        current.apply(changes);
        info!("settings updated");
        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_replaces_only_present_fields() {
        let mut settings = AppSettings::default();
        settings.apply(SettingsOverride {
            colors: Some(TierColorsOverride {
                teuer: Some("#000000".to_string()),
                ..TierColorsOverride::default()
            }),
            receipt: Some(ReceiptOverride {
                show_footer: Some(false),
                ..ReceiptOverride::default()
            }),
        });

        let defaults = AppSettings::default();
        assert_eq!(settings.colors.teuer, "#000000");
        assert_eq!(settings.colors.luxus, defaults.colors.luxus);
        assert!(!settings.receipt.show_footer);
        assert_eq!(settings.receipt.store_name, defaults.receipt.store_name);
        assert!(settings.receipt.show_item_details);
    }

    #[test]
    fn empty_override_is_identity() {
        let mut settings = AppSettings::default();
        settings.apply(SettingsOverride::default());
        assert_eq!(settings, AppSettings::default());
    }

    #[test]
    fn override_parses_from_partial_json() {
        let changes: SettingsOverride =
            serde_json::from_str(r#"{"receipt":{"store_name":"ReWear Bern"}}"#).expect("json");
        assert!(changes.colors.is_none());
        assert_eq!(
            changes.receipt.and_then(|receipt| receipt.store_name).as_deref(),
            Some("ReWear Bern")
        );
    }

    #[test]
    fn update_rejects_malformed_colors() {
        let service = SettingsService::default();
        let err = service
            .update(SettingsOverride {
                colors: Some(TierColorsOverride {
                    mittel: Some("green".to_string()),
                    ..TierColorsOverride::default()
                }),
                receipt: None,
            })
            .expect_err("invalid color");
        assert!(matches!(err, SettingsError::Validation(_)));
        assert_eq!(service.get().expect("settings"), AppSettings::default());
    }
}

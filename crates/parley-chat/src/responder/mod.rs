//! Responders: one per intent.
//!
//! [`ResponderSet`] owns one responder of each kind and [`Responder`] is the
//! closed variant selected for a request. Adding an intent means adding a
//! variant here and a handler module.

pub mod general;
mod lexicon;
pub mod translation;
pub mod weather;

use serde_json::{Map, Value};

use crate::error::ChatError;
use crate::types::{Intent, RequestOptions, Turn};

pub use general::GeneralResponder;
pub use translation::{Language, TranslationResponder};
pub use weather::WeatherResponder;

/// What a responder produced for one message.
#[derive(Debug, Clone, Default)]
pub struct ResponderOutput {
    pub answer: String,
    /// Model that produced the answer, when one was called.
    pub model_used: Option<String>,
    /// Responder-specific details merged into the response metadata.
    pub metadata: Map<String, Value>,
}

/// One responder of each kind.
pub struct ResponderSet {
    pub weather: WeatherResponder,
    pub translation: TranslationResponder,
    pub general: GeneralResponder,
}

impl ResponderSet {
    pub fn new(
        weather: WeatherResponder,
        translation: TranslationResponder,
        general: GeneralResponder,
    ) -> Self {
        Self {
            weather,
            translation,
            general,
        }
    }

    /// Select the responder for `intent`.
    pub fn select(&self, intent: Intent) -> Responder<'_> {
        match intent {
            Intent::Weather => Responder::Weather(&self.weather),
            Intent::Translation => Responder::Translation(&self.translation),
            Intent::General => Responder::General(&self.general),
        }
    }
}

/// The responder chosen for a single request.
#[derive(Clone, Copy)]
pub enum Responder<'a> {
    Weather(&'a WeatherResponder),
    Translation(&'a TranslationResponder),
    General(&'a GeneralResponder),
}

impl Responder<'_> {
    pub fn intent(&self) -> Intent {
        match self {
            Self::Weather(_) => Intent::Weather,
            Self::Translation(_) => Intent::Translation,
            Self::General(_) => Intent::General,
        }
    }

    /// Produce an answer for `message`.
    ///
    /// Only the general responder reads `history` or can fail.
    pub async fn respond(
        &self,
        message: &str,
        history: &[Turn],
        options: &RequestOptions,
    ) -> Result<ResponderOutput, ChatError> {
        match self {
            Self::Weather(r) => Ok(r.respond(message)),
            Self::Translation(r) => Ok(r.respond(message)),
            Self::General(r) => r.respond(message, history, options).await,
        }
    }
}

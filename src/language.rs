//! Statistical language identification.

use serde::Serialize;

/// Detected language and the detector's confidence in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageDetection {
    /// ISO 639-1 code, or `None` when nothing could be identified.
    pub language: Option<String>,
    /// Confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl LanguageDetection {
    /// Result for text that could not be classified.
    pub fn unknown() -> Self {
        Self {
            language: None,
            confidence: 0.0,
        }
    }
}

/// Capability consumed by the pipeline: identify the language of a text.
pub trait LanguageDetector: Send + Sync {
    /// Classify `text`. Blank input yields [`LanguageDetection::unknown`].
    fn detect(&self, text: &str) -> LanguageDetection;
}

/// Trigram-based detector backed by `whatlang`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> LanguageDetection {
        if text.trim().is_empty() {
            return LanguageDetection::unknown();
        }
        let Some(info) = whatlang::detect(text) else {
            tracing::debug!("Language detection produced no result");
            return LanguageDetection::unknown();
        };

        let code = info.lang().code();
        let language = iso639_1(code).unwrap_or(code).to_string();
        tracing::debug!(
            language = %language,
            confidence = info.confidence(),
            reliable = info.is_reliable(),
            "Detected language"
        );
        LanguageDetection {
            language: Some(language),
            confidence: info.confidence(),
        }
    }
}

/// Map a whatlang ISO 639-3 code onto its two-letter form.
fn iso639_1(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(mapped)
}

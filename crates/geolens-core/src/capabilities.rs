//! Optional analysis capabilities
//!
//! A deployment may or may not have an entity recognizer, and may switch off
//! the built-in readability and structured-data passes. Availability is
//! decided once, when [`Capabilities`] is built, and every consumer falls
//! back to a fixed value when a capability is missing.

use std::fmt;
use std::sync::{Arc, OnceLock};

use anyhow::Result;

use crate::config::Settings;

/// Entity span reported by a recognizer backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedEntity {
    pub text: String,
    pub label: String,
}

impl RecognizedEntity {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Named-entity recognition backend.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>>;
}

/// Loads the recognizer for one model name.
pub type RecognizerLoader =
    Arc<dyn Fn(&str) -> Result<Arc<dyn EntityRecognizer>> + Send + Sync>;

/// Lazily loaded, process-wide entity recognizer.
///
/// The first [`NlpModel::get`] tries each configured model name in order.
/// Whatever happens, success or failure, is kept for the life of the value,
/// so a missing model costs one attempt per process rather than one per page.
pub struct NlpModel {
    models: Vec<String>,
    loader: Option<RecognizerLoader>,
    loaded: OnceLock<Option<Arc<dyn EntityRecognizer>>>,
}

impl NlpModel {
    pub fn new(models: Vec<String>) -> Self {
        Self {
            models,
            loader: None,
            loaded: OnceLock::new(),
        }
    }

    /// A model that is already known to be unavailable.
    pub fn unavailable() -> Self {
        let model = Self::new(Vec::new());
        let _ = model.loaded.set(None);
        model
    }

    /// A model backed by an already constructed recognizer.
    pub fn ready(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        let model = Self::new(Vec::new());
        let _ = model.loaded.set(Some(recognizer));
        model
    }

    pub fn with_loader(mut self, loader: RecognizerLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn get(&self) -> Option<Arc<dyn EntityRecognizer>> {
        self.loaded.get_or_init(|| self.load()).clone()
    }

    pub fn is_available(&self) -> bool {
        self.get().is_some()
    }

    fn load(&self) -> Option<Arc<dyn EntityRecognizer>> {
        let Some(loader) = &self.loader else {
            tracing::debug!("no entity recognizer backend installed");
            return None;
        };

        for name in &self.models {
            match loader(name) {
                Ok(recognizer) => {
                    tracing::info!(model = %name, "entity recognizer loaded");
                    return Some(recognizer);
                }
                Err(err) => {
                    tracing::debug!(model = %name, error = %err, "entity model failed to load");
                }
            }
        }

        tracing::warn!(
            models = ?self.models,
            "no entity model could be loaded; falling back to pattern extraction"
        );
        None
    }
}

impl fmt::Debug for NlpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.loaded.get() {
            None => "pending",
            Some(None) => "unavailable",
            Some(Some(_)) => "loaded",
        };
        f.debug_struct("NlpModel")
            .field("models", &self.models)
            .field("has_loader", &self.loader.is_some())
            .field("state", &state)
            .finish()
    }
}

/// Capability context shared by every analysis in the process.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub nlp: Arc<NlpModel>,
    /// Readability-style main content extraction
    pub main_content: bool,
    pub readability: bool,
    pub structured_data: bool,
}

impl Capabilities {
    /// Capabilities enabled by `settings`. No recognizer backend is installed;
    /// add one with [`Capabilities::with_recognizer_loader`].
    pub fn probe(settings: &Settings) -> Self {
        let caps = Self {
            nlp: Arc::new(NlpModel::new(settings.nlp.models.clone())),
            main_content: settings.capabilities.main_content && cfg!(feature = "readability"),
            readability: settings.capabilities.readability,
            structured_data: settings.capabilities.structured_data,
        };
        tracing::debug!(
            readability = caps.readability,
            structured_data = caps.structured_data,
            main_content = caps.main_content,
            "capabilities probed"
        );
        caps
    }

    /// Nothing optional: plain landmark extraction and no recognizer or metrics.
    pub fn none() -> Self {
        Self {
            nlp: Arc::new(NlpModel::unavailable()),
            main_content: false,
            readability: false,
            structured_data: false,
        }
    }

    pub fn with_recognizer_loader(self, loader: RecognizerLoader) -> Self {
        let models = if self.nlp.models.is_empty() {
            crate::config::DEFAULT_NLP_MODELS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.nlp.models.clone()
        };
        Self {
            nlp: Arc::new(NlpModel::new(models).with_loader(loader)),
            ..self
        }
    }

    pub fn with_recognizer(self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self {
            nlp: Arc::new(NlpModel::ready(recognizer)),
            ..self
        }
    }

    pub fn recognizer(&self) -> Option<Arc<dyn EntityRecognizer>> {
        self.nlp.get()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::probe(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed;

    impl EntityRecognizer for Fixed {
        fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>> {
            Ok(vec![RecognizedEntity::new("Paris", "GPE")])
        }
    }

    #[test]
    fn failed_load_is_remembered() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let loader: RecognizerLoader = Arc::new(move |_name: &str| -> Result<Arc<dyn EntityRecognizer>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("model not installed"))
        });

        let model = NlpModel::new(vec!["a".into(), "b".into()]).with_loader(loader);
        assert!(model.get().is_none());
        assert!(model.get().is_none());
        assert!(!model.is_available());
        // one attempt per model name, once
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn first_loadable_model_wins() {
        let tried = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = tried.clone();
        let loader: RecognizerLoader = Arc::new(move |name: &str| -> Result<Arc<dyn EntityRecognizer>> {
            log.lock().unwrap().push(name.to_string());
            if name == "second" {
                Ok(Arc::new(Fixed) as Arc<dyn EntityRecognizer>)
            } else {
                Err(anyhow::anyhow!("missing"))
            }
        });

        let model =
            NlpModel::new(vec!["first".into(), "second".into(), "third".into()]).with_loader(loader);
        let recognizer = model.get().unwrap();
        assert_eq!(recognizer.recognize("x").unwrap()[0].label, "GPE");
        model.get();
        assert_eq!(*tried.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn none_disables_everything() {
        let caps = Capabilities::none();
        assert!(!caps.main_content);
        assert!(!caps.readability);
        assert!(!caps.structured_data);
        assert!(caps.recognizer().is_none());
    }

    #[test]
    fn probe_follows_settings_without_backend() {
        let mut settings = Settings::default();
        settings.capabilities.structured_data = false;
        let caps = Capabilities::probe(&settings);
        assert!(caps.readability);
        assert!(!caps.structured_data);
        assert_eq!(caps.main_content, cfg!(feature = "readability"));
        assert!(caps.recognizer().is_none());

        let caps = caps.with_recognizer(Arc::new(Fixed));
        assert!(caps.recognizer().is_some());
    }
}

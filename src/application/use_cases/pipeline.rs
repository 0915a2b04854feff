use crate::application::use_cases::translate::TranslateUseCase;
use crate::application::use_cases::vocabulary::VocabularyUseCase;
use crate::domain::events::PopupEvent;
use crate::infrastructure::clipboard::ClipboardBridge;
use crate::infrastructure::config::SettingsStore;
use crate::interfaces::windows::{WindowKind, WindowLifecycleManager};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A freshly constructed popup needs one content load before it can receive
/// events; pushing earlier would drop them on the floor.
const FIRST_LOAD_SETTLE: Duration = Duration::from_millis(500);

/// Drives capture → request → render. Fully asynchronous; hotkey handlers
/// fire and forget. Every run takes a request id from an atomic counter and
/// re-checks it before touching the popup, so when triggers overlap the
/// latest one wins and stale results discard themselves. Repeated captures
/// of identical text are translated again on purpose: suppressing them
/// would make a deliberate re-trigger look like breakage.
pub struct TranslationOrchestrator {
    bridge: Arc<dyn ClipboardBridge>,
    windows: Arc<WindowLifecycleManager>,
    translate: TranslateUseCase,
    vocabulary: VocabularyUseCase,
    settings: Arc<SettingsStore>,
    current_run: AtomicU64,
}

impl TranslationOrchestrator {
    pub fn new(
        bridge: Arc<dyn ClipboardBridge>,
        windows: Arc<WindowLifecycleManager>,
        translate: TranslateUseCase,
        vocabulary: VocabularyUseCase,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            bridge,
            windows,
            translate,
            vocabulary,
            settings,
            current_run: AtomicU64::new(0),
        }
    }

    fn begin_run(&self) -> u64 {
        self.current_run.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, run_id: u64) -> bool {
        self.current_run.load(Ordering::SeqCst) == run_id
    }

    pub async fn run_capture_pipeline(&self) {
        let run_id = self.begin_run();

        let capture = match self.bridge.capture().await {
            Ok(capture) => capture,
            Err(err) => {
                warn!(error = %err, "selection capture failed");
                return;
            }
        };

        let text = capture.text.trim().to_string();
        if text.is_empty() {
            debug!("nothing captured, aborting silently");
            return;
        }

        let created = match self.windows.open_or_reveal(WindowKind::Translation) {
            Ok(created) => created,
            Err(err) => {
                warn!(error = %err, "failed to open translation window");
                return;
            }
        };
        if created {
            tokio::time::sleep(FIRST_LOAD_SETTLE).await;
        }

        if !self.is_current(run_id) {
            return;
        }
        self.emit(PopupEvent::StartTranslation { text: text.clone() });

        let settings = self.settings.get();
        match self.translate.execute(&settings, &text).await {
            Ok(translated) => {
                if !self.is_current(run_id) {
                    return;
                }
                self.emit(PopupEvent::TranslationComplete {
                    original_text: text.clone(),
                    translated_text: translated,
                });

                if settings.active_learn_vocabulary {
                    self.run_vocabulary(run_id, &text).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "translation request failed");
                if self.is_current(run_id) {
                    self.emit(PopupEvent::TranslationError {
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    /// Runs after a successful translation, never blocking or failing it.
    async fn run_vocabulary(&self, run_id: u64, text: &str) {
        self.emit(PopupEvent::VocabularyLoading);

        let settings = self.settings.get();
        match self.vocabulary.execute(&settings, text).await {
            Ok(vocabulary) => {
                if self.is_current(run_id) {
                    self.emit(PopupEvent::VocabularyComplete { vocabulary });
                }
            }
            Err(err) => {
                warn!(error = %err, "vocabulary extraction failed");
                if self.is_current(run_id) {
                    self.emit(PopupEvent::VocabularyError);
                }
            }
        }
    }

    /// Translation requested from the multi-tool window with pasted text;
    /// no capture step and no fencing against the hotkey pipeline.
    pub async fn run_direct_translation(&self, text: String, target_language: Option<String>) {
        let mut settings = self.settings.get();
        if let Some(target) = target_language {
            settings.target_language = target;
        }

        let event = match self.translate.execute(&settings, &text).await {
            Ok(translated) => PopupEvent::TranslationComplete {
                original_text: text,
                translated_text: translated,
            },
            Err(err) => {
                warn!(error = %err, "direct translation failed");
                PopupEvent::TranslationError {
                    error: err.to_string(),
                }
            }
        };

        if let Err(err) = self.windows.emit(WindowKind::TranslateNow, &event) {
            warn!(error = %err, "failed to push direct translation result");
        }
    }

    fn emit(&self, event: PopupEvent) {
        if let Err(err) = self.windows.emit(WindowKind::Translation, &event) {
            warn!(event = event.name(), error = %err, "failed to push event to translation window");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Result;
    use crate::domain::events::CaptureResult;
    use crate::infrastructure::llm_clients::{ChatClient, ChatRequest, RouterClient};
    use crate::interfaces::windows::test_support::RecordingBackend;
    use crate::interfaces::windows::WindowBackend;
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    struct FakeBridge {
        text: String,
    }

    #[async_trait]
    impl ClipboardBridge for FakeBridge {
        async fn capture(&self) -> Result<CaptureResult> {
            Ok(CaptureResult {
                text: self.text.clone(),
                captured_at: Utc::now(),
            })
        }
    }

    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for CountingClient {
        async fn complete(&self, _request: &ChatRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("unused".to_string())
        }
    }

    /// First call blocks on the gate and answers "stale"; later calls
    /// answer "fresh" immediately.
    struct GatedClient {
        calls: AtomicUsize,
        gate: Arc<Notify>,
        started: Arc<Notify>,
    }

    #[async_trait]
    impl ChatClient for GatedClient {
        async fn complete(&self, _request: &ChatRequest) -> Result<String> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.notify_one();
                self.gate.notified().await;
                Ok("stale".to_string())
            } else {
                Ok("fresh".to_string())
            }
        }
    }

    fn build_orchestrator(
        client: Arc<dyn ChatClient>,
        captured: &str,
        dir: &std::path::Path,
    ) -> (Arc<TranslationOrchestrator>, Arc<RecordingBackend>, Arc<SettingsStore>) {
        let backend = Arc::new(RecordingBackend::default());
        let windows = Arc::new(WindowLifecycleManager::new(
            backend.clone() as Arc<dyn WindowBackend>
        ));
        let settings = Arc::new(SettingsStore::new(dir.to_path_buf()));
        settings.set(json!({ "apiKey": "test-key" })).unwrap();

        let orchestrator = Arc::new(TranslationOrchestrator::new(
            Arc::new(FakeBridge {
                text: captured.to_string(),
            }),
            windows,
            TranslateUseCase::new(client.clone()),
            VocabularyUseCase::new(client),
            settings.clone(),
        ));
        (orchestrator, backend, settings)
    }

    fn translation_events(backend: &RecordingBackend) -> Vec<PopupEvent> {
        backend.events_for(WindowKind::Translation)
    }

    #[tokio::test]
    async fn test_empty_capture_never_calls_the_remote() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(CountingClient {
            calls: AtomicUsize::new(0),
        });
        let (orchestrator, backend, _settings) =
            build_orchestrator(client.clone(), "   ", dir.path());

        orchestrator.run_capture_pipeline().await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert!(translation_events(&backend).is_empty());
        assert!(backend.windows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hello_world_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::Regex("Hello World".to_string()),
                mockito::Matcher::Regex("persian".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "سلام دنیا" } }
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = Arc::new(RouterClient::with_base_url(
            server.url(),
            Duration::from_secs(5),
        ));
        let (orchestrator, backend, _settings) =
            build_orchestrator(client, "Hello World", dir.path());

        orchestrator.run_capture_pipeline().await;

        mock.assert_async().await;
        let events = translation_events(&backend);
        assert_eq!(
            events,
            vec![
                PopupEvent::StartTranslation {
                    text: "Hello World".to_string()
                },
                PopupEvent::TranslationComplete {
                    original_text: "Hello World".to_string(),
                    translated_text: "سلام دنیا".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_timeout_surfaces_translation_error() {
        let dir = tempfile::tempdir().unwrap();
        // A listener that never answers forces the client timeout.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = Arc::new(RouterClient::with_base_url(
            format!("http://{}", addr),
            Duration::from_millis(300),
        ));
        let (orchestrator, backend, _settings) =
            build_orchestrator(client, "Hello World", dir.path());

        orchestrator.run_capture_pipeline().await;

        let events = translation_events(&backend);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], PopupEvent::TranslationError { .. }));
    }

    #[tokio::test]
    async fn test_superseded_run_does_not_touch_the_popup() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let started = Arc::new(Notify::new());
        let client = Arc::new(GatedClient {
            calls: AtomicUsize::new(0),
            gate: gate.clone(),
            started: started.clone(),
        });
        let (orchestrator, backend, _settings) =
            build_orchestrator(client, "Hello World", dir.path());

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run_capture_pipeline().await })
        };
        started.notified().await;

        // Second trigger supersedes the one still in flight.
        orchestrator.run_capture_pipeline().await;
        gate.notify_one();
        first.await.unwrap();

        let events = translation_events(&backend);
        let completed: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                PopupEvent::TranslationComplete {
                    translated_text, ..
                } => Some(translated_text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_vocabulary_chain_runs_after_completion() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let _translation = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("translate the following".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "سلام" } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _vocabulary = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("extract important words".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        {
                            "message": {
                                "role": "assistant",
                                "content": "[{\"originalWord\":\"hello\",\"synonyms\":[\"hi\"]}]"
                            }
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Arc::new(RouterClient::with_base_url(
            server.url(),
            Duration::from_secs(5),
        ));
        let (orchestrator, backend, settings) = build_orchestrator(client, "Hello", dir.path());
        settings
            .set(json!({ "activeLearnVocabulary": true }))
            .unwrap();

        orchestrator.run_capture_pipeline().await;

        let events = translation_events(&backend);
        assert_eq!(
            events,
            vec![
                PopupEvent::StartTranslation {
                    text: "Hello".to_string()
                },
                PopupEvent::TranslationComplete {
                    original_text: "Hello".to_string(),
                    translated_text: "سلام".to_string()
                },
                PopupEvent::VocabularyLoading,
                PopupEvent::VocabularyComplete {
                    vocabulary: "hello: hi".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_direct_translation_targets_multi_tool_window() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("german".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "Hallo Welt" } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Arc::new(RouterClient::with_base_url(
            server.url(),
            Duration::from_secs(5),
        ));
        let (orchestrator, backend, _settings) =
            build_orchestrator(client, "unused", dir.path());
        backend
            .windows
            .lock()
            .unwrap()
            .insert(WindowKind::TranslateNow, true);

        orchestrator
            .run_direct_translation("Hello World".to_string(), Some("german".to_string()))
            .await;

        let events = backend.events_for(WindowKind::TranslateNow);
        assert_eq!(
            events,
            vec![PopupEvent::TranslationComplete {
                original_text: "Hello World".to_string(),
                translated_text: "Hallo Welt".to_string()
            }]
        );
    }
}

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{FakeDetectionManager, FakeFactory, config_loader, profiles_with_main};
use fqcs_console::domains::capture::FrameConsumer;
use fqcs_console::domains::config::{ConfigError, ConfigEvent};
use fqcs_console::domains::ui::views::{CameraScreen, ColorPreprocessScreen, Preview, SliderPositions};
use fqcs_console::domains::ui::{Screen, ScreenInput, ScreenState, Slider};
use fqcs_contracts::detection::DetectionError;
use fqcs_model::{ColorSettings, ProfileRecord};

const LINE_A: &str = "/stations/line-a";
const LINE_B: &str = "/stations/line-b";

#[tokio::test]
async fn folder_without_main_profile_loads_no_model() {
    let factory = FakeFactory::with(FakeDetectionManager::new(
        LINE_A,
        vec![ProfileRecord::new("left"), ProfileRecord::new("right")],
    ));
    let loader = config_loader(Arc::clone(&factory));
    let mut screen = ColorPreprocessScreen::new(loader.clone());

    let config = loader.load(Path::new(LINE_A)).await.expect("load");

    assert_eq!(config.profiles.len(), 2);
    assert!(config.main().is_none());
    let manager = factory.manager(Path::new(LINE_A)).expect("manager");
    assert!(manager.model_loads().is_empty());

    screen.sync_config();
    screen.on_activate();
    assert!(matches!(screen.preview(), Preview::Unavailable));
    assert_eq!(
        screen.sliders(),
        SliderPositions::from_settings(&ColorSettings::default())
    );
}

#[tokio::test]
async fn main_profile_model_is_loaded_once() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, profiles_with_main()));
    let loader = config_loader(Arc::clone(&factory));

    let config = loader.load(Path::new(LINE_A)).await.expect("load");

    assert_eq!(config.profiles.len(), 3);
    assert_eq!(config.main_profile, Some(1));
    assert_eq!(config.main().map(|p| p.name.as_str()), Some("line-1"));
    assert_eq!(config.current_path.as_deref(), Some(Path::new(LINE_A)));
    let manager = factory.manager(Path::new(LINE_A)).expect("manager");
    assert_eq!(manager.model_loads(), vec!["line-1".to_string()]);
}

#[tokio::test]
async fn first_flagged_profile_wins() {
    let factory = FakeFactory::with(FakeDetectionManager::new(
        LINE_A,
        vec![
            ProfileRecord::new("a"),
            ProfileRecord::new("b").main(),
            ProfileRecord::new("c").main(),
        ],
    ));
    let loader = config_loader(Arc::clone(&factory));

    let config = loader.load(Path::new(LINE_A)).await.expect("load");

    assert_eq!(config.main().map(|p| p.name.as_str()), Some("b"));
    let manager = factory.manager(Path::new(LINE_A)).expect("manager");
    assert_eq!(manager.model_loads(), vec!["b".to_string()]);
}

#[tokio::test]
async fn failed_load_keeps_previous_configuration() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, profiles_with_main()));
    factory.add(FakeDetectionManager::new(LINE_B, profiles_with_main()).failing_model());
    let loader = config_loader(Arc::clone(&factory));
    loader.load(Path::new(LINE_A)).await.expect("first load");

    let err = loader.load(Path::new(LINE_B)).await.unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Detection(DetectionError::MissingModel(ref name)) if name == "line-1"
    ));
    assert_eq!(
        loader.store().current_path(),
        Some(PathBuf::from(LINE_A))
    );

    let err = loader.load(Path::new("/stations/unknown")).await.unwrap_err();
    assert!(matches!(err, ConfigError::Detection(DetectionError::Io { .. })));
    assert_eq!(
        loader.store().current_path(),
        Some(PathBuf::from(LINE_A))
    );
}

#[tokio::test(start_paused = true)]
async fn latest_load_wins_over_a_slower_earlier_one() {
    let factory = FakeFactory::with(
        FakeDetectionManager::new(LINE_A, profiles_with_main())
            .with_model_delay(Duration::from_secs(5)),
    );
    factory.add(FakeDetectionManager::new(LINE_B, profiles_with_main()));
    let loader = config_loader(Arc::clone(&factory));
    let mut events = loader.store().subscribe();

    let (slow, fast) = tokio::join!(
        loader.load(Path::new(LINE_A)),
        loader.load(Path::new(LINE_B))
    );

    assert!(matches!(
        slow,
        Err(ConfigError::Superseded { ref path }) if path == Path::new(LINE_A)
    ));
    assert_eq!(
        fast.expect("latest load").current_path.as_deref(),
        Some(Path::new(LINE_B))
    );
    assert_eq!(loader.store().current_path(), Some(PathBuf::from(LINE_B)));
    assert_eq!(
        events.changed().await,
        Some(ConfigEvent::Loaded {
            path: PathBuf::from(LINE_B)
        })
    );
    assert!(!events.take_pending());
}

#[tokio::test]
async fn cancelled_choice_is_not_an_error() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, profiles_with_main()));
    let loader = config_loader(Arc::clone(&factory));

    let loaded = loader.load_chosen(None).await.expect("cancel is fine");

    assert!(loaded.is_none());
    assert_eq!(factory.opened.load(Ordering::SeqCst), 0);
    assert!(loader.store().current().is_none());
}

#[tokio::test]
async fn save_requires_loaded_profiles() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, Vec::new()));
    let loader = config_loader(Arc::clone(&factory));

    let err = loader.save(Path::new(LINE_B)).unwrap_err();
    assert!(matches!(err, ConfigError::NoConfiguration));

    loader.load(Path::new(LINE_A)).await.expect("load");
    let err = loader.save(Path::new(LINE_B)).unwrap_err();
    assert!(matches!(err, ConfigError::NoProfiles));
    assert_eq!(err.to_string(), "No config provided");

    let manager = factory.manager(Path::new(LINE_A)).expect("manager");
    assert!(manager.saved.lock().is_empty());
}

#[tokio::test]
async fn save_writes_profiles_and_moves_current_path() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, profiles_with_main()));
    let loader = config_loader(Arc::clone(&factory));
    loader.load(Path::new(LINE_A)).await.expect("load");
    let mut subscription = loader.store().subscribe();

    let saved = loader.save(Path::new(LINE_B)).expect("save");

    assert_eq!(saved.current_path.as_deref(), Some(Path::new(LINE_B)));
    assert_eq!(saved.profiles.len(), 3);
    let manager = factory.manager(Path::new(LINE_A)).expect("manager");
    assert_eq!(*manager.saved.lock(), vec![(PathBuf::from(LINE_B), 3)]);
    assert_eq!(subscription.changed().await, Some(ConfigEvent::Updated));
    assert_eq!(manager.model_loads().len(), 1);
}

#[tokio::test]
async fn slider_edit_republishes_main_profile_and_previews() {
    let factory = FakeFactory::with(
        FakeDetectionManager::new(LINE_A, profiles_with_main()).with_samples(),
    );
    let loader = config_loader(Arc::clone(&factory));
    loader.load(Path::new(LINE_A)).await.expect("load");
    let mut screen = ColorPreprocessScreen::new(loader.clone());

    assert!(screen.handle_input(&ScreenInput::Slider(Slider::Blur, 50)));
    assert!(screen.handle_input(&ScreenInput::Resize {
        width: 128,
        height: 64
    }));

    let config = loader.store().current().expect("config");
    let main = config.main().expect("main");
    assert!((main.color_cfg.blur_val - 0.5).abs() < 1e-9);
    assert_eq!(main.color_cfg.img_size, (128, 64));
    assert_eq!(config.profiles[0].color_cfg, ColorSettings::default());
    assert_eq!(screen.sliders().blur, 50);

    match screen.preview() {
        Preview::Ready { left, right } => {
            assert_eq!(left.dimensions(), (128, 64));
            assert_eq!(right.dimensions(), (128, 64));
        }
        other => panic!("expected a preview, got {other:?}"),
    }
}

#[tokio::test]
async fn resize_outside_choices_is_ignored() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, profiles_with_main()));
    let loader = config_loader(Arc::clone(&factory));
    loader.load(Path::new(LINE_A)).await.expect("load");
    let mut screen = ColorPreprocessScreen::new(loader.clone());
    let before = screen.img_size();

    assert!(screen.handle_input(&ScreenInput::Resize {
        width: 100,
        height: 64
    }));

    assert_eq!(screen.img_size(), before);
    let config = loader.store().current().expect("config");
    assert_eq!(config.main().map(|p| p.color_cfg.img_size), Some(before));
}

#[tokio::test]
async fn camera_screens_reset_on_new_configuration() {
    let factory = FakeFactory::with(FakeDetectionManager::new(LINE_A, profiles_with_main()));
    factory.add(FakeDetectionManager::new(LINE_B, Vec::new()));
    let loader = config_loader(Arc::clone(&factory));
    let mut screen = CameraScreen::for_state(ScreenState::TestDetectPair, loader.store())
        .expect("camera screen");
    let view = screen.view();
    let consumer = screen.frame_consumer().expect("consumer");

    loader.load(Path::new(LINE_A)).await.expect("load");
    screen.sync_config();
    consumer.lock().on_frame(&fqcs_model::Frame::new(8, 8));
    assert!(view.lock().last_report().is_some());

    loader.load(Path::new(LINE_B)).await.expect("load");
    screen.sync_config();
    assert!(view.lock().last_report().is_none());
}

mod media;
mod presets;
mod settings;
mod timer;
mod window;

use media::import_video;
use presets::LessonDurationPreset;
use settings::{Settings, SettingsStore};
use tauri::{Manager, State};
use timer::{
    commands::{get_timer_state, start_timer, stop_timer},
    TimerController,
};
use window::{set_timer_layout, WindowCoordinator};

pub(crate) struct AppState {
    pub(crate) timer: TimerController,
    pub(crate) store: SettingsStore,
    pub(crate) window: WindowCoordinator,
}

#[tauri::command]
fn get_settings(state: State<AppState>) -> Result<Settings, String> {
    Ok(state.store.settings())
}

#[tauri::command]
fn update_settings(state: State<AppState>, settings: Settings) -> Result<(), String> {
    state.store.update_settings(settings).map_err(|e| e.to_string())
}

#[tauri::command]
fn get_lesson_durations(state: State<AppState>) -> Result<Vec<LessonDurationPreset>, String> {
    Ok(state.store.lesson_durations())
}

#[tauri::command]
fn update_lesson_durations(
    state: State<AppState>,
    durations: Vec<LessonDurationPreset>,
) -> Result<Vec<LessonDurationPreset>, String> {
    state
        .store
        .update_lesson_durations(durations)
        .map_err(|e| e.to_string())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Lesson timer starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .register_uri_scheme_protocol(media::MEDIA_SCHEME, |ctx, request| {
            media::serve(ctx.app_handle(), &request)
        })
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let store = SettingsStore::load(app_data_dir.join("store.json"));
                let window = WindowCoordinator::new(app.handle().clone());
                let timer =
                    TimerController::new(app.handle().clone(), store.clone(), window.clone());

                app.manage(AppState {
                    timer,
                    store,
                    window,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_timer_state,
            start_timer,
            stop_timer,
            set_timer_layout,
            get_settings,
            update_settings,
            get_lesson_durations,
            update_lesson_durations,
            import_video,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

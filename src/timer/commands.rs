use tauri::State;

use crate::{
    timer::{TimerController, TimerSnapshot},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> TimerController {
    state.timer.clone()
}

#[tauri::command]
pub async fn get_timer_state(state: State<'_, AppState>) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn start_timer(
    state: State<'_, AppState>,
    minutes: f64,
) -> Result<TimerSnapshot, String> {
    let controller = controller_from_state(&state);
    controller.start_timer(minutes).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn stop_timer(state: State<'_, AppState>) -> Result<(), String> {
    let controller = controller_from_state(&state);
    controller.stop_timer().await.map_err(|e| e.to_string())
}

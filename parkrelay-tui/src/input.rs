use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Run `service.vacancies`(...) and `service.update_occupancies`(...) for the selected city
    LoadSelectedCity,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Enter, Esc, Left, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::CitySelect => match key.code {
            Up | Char('k') => {
                if app.city_list_index > 0 {
                    app.city_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.city_list_index + 1 < app.cities.len() {
                    app.city_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                if app.select_current_city().is_some() {
                    action = Action::LoadSelectedCity;
                }
            }
            _ => {}
        },

        Screen::Dashboard => match key.code {
            Up | Char('k') => {
                if app.sensor_list_index > 0 {
                    app.sensor_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.sensor_list_index + 1 < app.sensors.len() {
                    app.sensor_list_index += 1;
                }
            }
            Char('r') => {
                action = Action::LoadSelectedCity;
            }
            Left | Esc | Char('b') => {
                app.screen = Screen::CitySelect;
                app.error_message = None;
            }
            _ => {}
        },
    }
    action
}

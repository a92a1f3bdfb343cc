use std::sync::Arc;

use chrono::Local;
use parkrelay_core::{
    error::RelayError,
    model::{CityMeta, SensorRecord, SensorTable, TimeWindow, ZoneVacancy},
    service::ParkingService,
};
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Screen {
    CitySelect,
    Dashboard,
}

/// Outcome of one city load run in the background.
pub(crate) struct CityLoad {
    pub window: TimeWindow,
    pub vacancies: Result<Vec<ZoneVacancy>, RelayError>,
    pub occupancies: Result<SensorTable, RelayError>,
}

pub(crate) struct App {
    pub service: Arc<ParkingService>,

    pub screen: Screen,
    pub cities: Vec<CityMeta>,
    pub city_list_index: usize,
    pub selected_city: Option<CityMeta>,

    pub window: Option<TimeWindow>,
    pub vacancies: Vec<ZoneVacancy>,
    /// Sensors carrying an occupancy reading, sorted by id.
    pub sensors: Vec<SensorRecord>,
    pub sensor_total: usize,
    pub sensor_list_index: usize,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pending_load: Option<JoinHandle<CityLoad>>,
}

impl App {
    pub(crate) fn new(service: Arc<ParkingService>) -> Self {
        let cities = service.cities();
        Self {
            service,
            screen: Screen::CitySelect,
            cities,
            city_list_index: 0,
            selected_city: None,
            window: None,
            vacancies: Vec::new(),
            sensors: Vec::new(),
            sensor_total: 0,
            sensor_list_index: 0,
            is_loading: false,
            error_message: None,
            pending_load: None,
        }
    }

    pub(crate) fn current_window() -> TimeWindow {
        TimeWindow::last_hour(Local::now().naive_local())
    }

    pub(crate) fn select_current_city(&mut self) -> Option<CityMeta> {
        let city = self.cities.get(self.city_list_index).cloned()?;
        self.selected_city = Some(city.clone());
        self.vacancies.clear();
        self.sensors.clear();
        self.sensor_list_index = 0;
        self.screen = Screen::Dashboard;
        Some(city)
    }

    /// Starts loading vacancies and occupancies for `city` on a separate task.
    ///
    /// The occupancy update waits for the sensor table, so the event loop
    /// must not await it. A load still running for a previous request is
    /// aborted.
    pub(crate) fn start_load(&mut self, city: &CityMeta) {
        if let Some(previous) = self.pending_load.take() {
            previous.abort();
        }

        let service = Arc::clone(&self.service);
        let id = city.id.clone();
        let window = Self::current_window();

        self.is_loading = true;
        self.error_message = None;
        self.pending_load = Some(tokio::spawn(async move {
            let (vacancies, occupancies) = tokio::join!(
                service.vacancies(&id, window),
                service.update_occupancies(&id)
            );
            CityLoad {
                window,
                vacancies,
                occupancies,
            }
        }));
    }

    /// Applies the background load once it has finished. Never waits on it.
    pub(crate) async fn poll_load(&mut self) {
        if !self.pending_load.as_ref().is_some_and(JoinHandle::is_finished) {
            return;
        }
        let Some(handle) = self.pending_load.take() else {
            return;
        };

        match handle.await {
            Ok(load) => self.apply_load(load),
            Err(err) => {
                warn!(error = %err, "city load task failed");
                self.is_loading = false;
                self.error_message = Some("Loading failed".into());
            }
        }
    }

    pub(crate) fn apply_load(&mut self, load: CityLoad) {
        self.is_loading = false;
        self.window = Some(load.window);

        let mut errors = Vec::new();
        match load.vacancies {
            Ok(vacancies) => self.vacancies = vacancies,
            Err(err) => {
                self.vacancies.clear();
                errors.push(err.to_string());
            }
        }
        match load.occupancies {
            Ok(table) => self.show_sensors(&table),
            Err(err) => errors.push(err.to_string()),
        }
        self.error_message = (!errors.is_empty()).then(|| errors.join(" · "));
    }

    pub(crate) fn show_sensors(&mut self, table: &SensorTable) {
        let mut sensors = table
            .records()
            .filter(|record| !record.occupancy.is_empty())
            .cloned()
            .collect::<Vec<_>>();
        sensors.sort_by(|left, right| left.id.0.cmp(&right.id.0));

        self.sensor_total = table.len();
        self.sensor_list_index = self.sensor_list_index.min(sensors.len().saturating_sub(1));
        self.sensors = sensors;
    }

    pub(crate) fn occupied_count(&self) -> usize {
        self.sensors
            .iter()
            .filter(|record| is_occupied(&record.occupancy))
            .count()
    }
}

/// Upstream reports `1` for an occupied spot and `0` for a free one.
pub(crate) fn is_occupied(occupancy: &str) -> bool {
    occupancy.trim() == "1"
}

pub(crate) fn is_free(occupancy: &str) -> bool {
    occupancy.trim() == "0"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use parkrelay_core::model::{CityId, SensorId};
    use parkrelay_core::ports::PortError;
    use parkrelay_core::store::Readiness;
    use parkrelay_provider_landscape as landscape;

    use super::*;

    /// App over the real city table; nothing listens on the discard port.
    fn app() -> App {
        let client = landscape::client(Duration::from_secs(1)).expect("client builds");
        let config = landscape::config("k", Some("http://127.0.0.1:9/")).expect("valid config");
        let service = ParkingService::new(landscape::fetcher(client), Arc::new(config));
        App::new(Arc::new(service))
    }

    fn window() -> TimeWindow {
        let now = NaiveDate::from_ymd_opt(2015, 6, 3)
            .and_then(|date| date.and_hms_opt(14, 5, 0))
            .expect("valid timestamp");
        TimeWindow::last_hour(now)
    }

    fn record(id: &str, occupancy: &str) -> SensorRecord {
        let mut record = SensorRecord::new(SensorId(id.into()), "37.4".into(), "-122.1".into());
        record.occupancy = occupancy.into();
        record
    }

    #[test]
    fn finished_load_fills_the_dashboard() {
        let mut app = app();
        app.is_loading = true;
        let table = [record("s-2", "1"), record("s-1", "0"), record("s-3", "")]
            .into_iter()
            .collect::<SensorTable>();

        app.apply_load(CityLoad {
            window: window(),
            vacancies: Ok(vec![ZoneVacancy {
                name: "High".into(),
                vacancy: "12".into(),
            }]),
            occupancies: Ok(table),
        });

        assert!(!app.is_loading);
        assert_eq!(app.window, Some(window()));
        assert_eq!(app.vacancies.len(), 1);
        assert_eq!(app.sensor_total, 3);
        let ids = app.sensors.iter().map(|record| record.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["s-1", "s-2"]);
        assert_eq!(app.occupied_count(), 1);
        assert_eq!(app.error_message, None);
    }

    #[test]
    fn failed_flows_are_reported_together() {
        let mut app = app();
        app.vacancies = vec![ZoneVacancy {
            name: "stale".into(),
            vacancy: "1".into(),
        }];

        app.apply_load(CityLoad {
            window: window(),
            vacancies: Err(RelayError::Vacancies(PortError::MissingReading(1))),
            occupancies: Err(RelayError::TableUnavailable("upstream down".into())),
        });

        assert!(app.vacancies.is_empty());
        assert_eq!(
            app.error_message.as_deref(),
            Some("Error retrieving vacancies · Sensor table unavailable: upstream down")
        );
    }

    #[tokio::test]
    async fn polling_does_not_wait_for_the_sensor_table() {
        let mut app = app();
        let city = app.cities.first().cloned().expect("city table is not empty");
        assert_eq!(app.service.sensor_store().readiness(), Readiness::Building);

        app.start_load(&city);
        tokio::time::timeout(Duration::from_millis(200), app.poll_load())
            .await
            .expect("poll returns while the load is pending");

        assert!(app.is_loading);
        assert!(app.pending_load.is_some());
    }

    #[tokio::test]
    async fn load_for_unknown_city_reports_error() {
        let mut app = app();
        let city = CityMeta {
            id: CityId::from("atlantis"),
            name: "Atlantis".into(),
        };

        app.start_load(&city);
        tokio::time::timeout(Duration::from_secs(1), async {
            while app.is_loading {
                app.poll_load().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("load finishes");

        assert_eq!(
            app.error_message.as_deref(),
            Some("Unsupported city · Unsupported city")
        );
    }
}

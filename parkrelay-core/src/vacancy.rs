//! Vacancy aggregator: one query per zone, ranked by vacancy.

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{CityConfig, RelayConfig};
use crate::error::RelayError;
use crate::model::{CityId, TimeWindow, ZoneVacancy};
use crate::ports::{FetchBody, Fetcher, PortError};

/// One sample of a vacancy query response.
#[derive(Debug, Deserialize)]
struct VacancySample {
    #[serde(default)]
    reading: Option<Value>,
}

/// Fetch all vacancy zones of `city` for `window` and rank them.
///
/// The result always has one record per configured zone, sorted by
/// descending vacancy. Zones with equal vacancy keep their configured order.
///
/// # Errors
///
/// Returns [`RelayError::UnsupportedCity`] for unknown cities and
/// [`RelayError::Vacancies`] when any zone fails; no partial result is
/// returned.
pub async fn zone_vacancies(
    fetcher: &dyn Fetcher,
    config: &RelayConfig,
    city: &CityId,
    window: TimeWindow,
) -> Result<Vec<ZoneVacancy>, RelayError> {
    let city_config = config.city(city)?;

    let mut vacancies = fetch_vacancies(fetcher, config, city_config, window)
        .await
        .map_err(|err| {
            warn!(%city, error = %err, "vacancy query failed");
            RelayError::Vacancies(err)
        })?;

    rank(&mut vacancies);
    debug!(%city, zones = vacancies.len(), "vacancies ranked");
    Ok(vacancies)
}

/// Sort by descending vacancy, keeping the order of ties.
pub fn rank(vacancies: &mut [ZoneVacancy]) {
    vacancies.sort_by(|left, right| right.value().total_cmp(&left.value()));
}

async fn fetch_vacancies(
    fetcher: &dyn Fetcher,
    config: &RelayConfig,
    city: &CityConfig,
    window: TimeWindow,
) -> Result<Vec<ZoneVacancy>, PortError> {
    let options = config.vacancy_options(city, window)?;
    let bodies = try_join_all(options.iter().map(|option| fetcher.fetch(option))).await?;

    // try_join_all keeps request order, so the i-th body belongs to the i-th zone.
    city.vacancy_paths()
        .zip(bodies)
        .map(|((zone, name, _path), body)| {
            Ok::<_, PortError>(ZoneVacancy {
                name: name.to_owned(),
                vacancy: first_reading(zone, body)?,
            })
        })
        .collect()
}

fn first_reading(zone: u32, body: FetchBody) -> Result<String, PortError> {
    let samples = body.into_json::<Vec<VacancySample>>()?;
    match samples.into_iter().next().and_then(|sample| sample.reading) {
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::String(text)) => Ok(text),
        _ => Err(PortError::MissingReading(zone)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn zone(name: &str, vacancy: &str) -> ZoneVacancy {
        ZoneVacancy {
            name: name.into(),
            vacancy: vacancy.into(),
        }
    }

    #[test]
    fn ranks_descending() {
        let mut vacancies = vec![zone("a", "12"), zone("b", "45"), zone("c", "3")];
        rank(&mut vacancies);

        let order = vacancies
            .iter()
            .map(|vacancy| vacancy.vacancy.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["45", "12", "3"]);
    }

    #[test]
    fn ties_keep_zone_order() {
        let mut vacancies = vec![zone("a", "5"), zone("b", "9"), zone("c", "5.0")];
        rank(&mut vacancies);

        let names = vacancies
            .iter()
            .map(|vacancy| vacancy.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn reading_may_be_number_or_text() {
        let numeric = FetchBody::Json(json!([{ "reading": 17.5 }, { "reading": 1 }]));
        let textual = FetchBody::Json(json!([{ "reading": "8" }]));

        assert_eq!(first_reading(1, numeric).expect("number"), "17.5");
        assert_eq!(first_reading(2, textual).expect("text"), "8");
    }

    #[test]
    fn empty_or_readingless_response_is_rejected() {
        assert!(matches!(
            first_reading(2, FetchBody::Json(json!([]))),
            Err(PortError::MissingReading(2))
        ));
        assert!(matches!(
            first_reading(3, FetchBody::Json(json!([{ "count": 4 }]))),
            Err(PortError::MissingReading(3))
        ));
        assert!(matches!(
            first_reading(1, FetchBody::Json(json!({ "reading": 4 }))),
            Err(PortError::Decode(_))
        ));
    }
}

use crate::game::codec;
use crate::game::score_table::{DataError, ScoreTable};
use log::warn;

pub const RESULTS_PAGE: &str = "results.html";
pub const DEFAULT_TOTAL_DURATION_MS: u32 = 30_000;
/// Tables with fewer categories than this get a proportionally shorter animation.
pub const DEFAULT_TOTAL_NUMBER_OF_CATEGORIES: usize = 10;

/// Fallbacks for parameters a link leaves out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDefaults {
    pub duration_ms: u32,
    pub fireworks: bool,
}

impl Default for LinkDefaults {
    fn default() -> Self {
        Self {
            duration_ms: DEFAULT_TOTAL_DURATION_MS,
            fireworks: false,
        }
    }
}

/// Everything the results view needs to start a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsParams {
    pub data: ScoreTable,
    pub duration_ms: f64,
    pub fireworks: bool,
}

pub fn suggested_duration_ms(category_count: usize) -> u32 {
    if category_count < DEFAULT_TOTAL_NUMBER_OF_CATEGORIES {
        (u64::from(DEFAULT_TOTAL_DURATION_MS) * category_count as u64
            / DEFAULT_TOTAL_NUMBER_OF_CATEGORIES as u64) as u32
    } else {
        DEFAULT_TOTAL_DURATION_MS
    }
}

pub fn results_link(token: &str, duration_ms: u32, fireworks: bool) -> String {
    let mut link = format!("{RESULTS_PAGE}?data={token}&duration={duration_ms}");
    if fireworks {
        link.push_str("&fireworks=true");
    }
    link
}

/// Parses `results.html?data=..&duration=..&fireworks=true`, a full URL, or a bare
/// query string. The first occurrence of each parameter wins.
pub fn parse_results_link(link: &str, defaults: LinkDefaults) -> Result<ResultsParams, DataError> {
    let link = link.trim();
    let query = match link.split_once('?') {
        Some((_, q)) => q,
        None => link,
    };
    let query = query.split_once('#').map_or(query, |(q, _)| q);

    let mut data: Option<String> = None;
    let mut duration: Option<String> = None;
    let mut fireworks: Option<String> = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let slot = match key.as_ref() {
            "data" => &mut data,
            "duration" => &mut duration,
            "fireworks" => &mut fireworks,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    let token = data.ok_or(DataError::MissingData)?;
    let table = codec::decode(&token)?;

    Ok(ResultsParams {
        data: table,
        duration_ms: parse_duration(duration.as_deref(), defaults.duration_ms),
        fireworks: fireworks.map_or(defaults.fireworks, |v| v == "true"),
    })
}

fn parse_duration(raw: Option<&str>, default_ms: u32) -> f64 {
    let Some(raw) = raw else {
        return f64::from(default_ms);
    };
    match raw.trim().parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms > 0.0 => ms,
        _ => {
            warn!("Ignoring invalid duration '{raw}', using {default_ms} ms");
            f64::from(default_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkDefaults, parse_results_link, results_link, suggested_duration_ms};
    use crate::game::codec;
    use crate::game::score_table::{DataError, ScoreTable};

    fn sample() -> ScoreTable {
        ScoreTable::new(
            vec!["A".into(), "B".into()],
            vec!["X".into(), "Y".into()],
            vec![vec![3.0, 1.0], vec![2.0, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn link_round_trips_through_the_parser() {
        let token = codec::encode(&sample()).unwrap();
        let link = results_link(&token, 12_000, true);
        assert!(link.starts_with("results.html?data="));
        let params = parse_results_link(&link, LinkDefaults::default()).unwrap();
        assert_eq!(params.data, sample());
        assert_eq!(params.duration_ms, 12_000.0);
        assert!(params.fireworks);
    }

    #[test]
    fn missing_duration_uses_the_default() {
        let token = codec::encode(&sample()).unwrap();
        let params =
            parse_results_link(&format!("data={token}"), LinkDefaults::default()).unwrap();
        assert_eq!(params.duration_ms, 30_000.0);
        assert!(!params.fireworks);
    }

    #[test]
    fn invalid_duration_and_fireworks_literals_fall_back() {
        let token = codec::encode(&sample()).unwrap();
        let defaults = LinkDefaults {
            duration_ms: 5_000,
            fireworks: true,
        };
        let link = format!("https://example.test/results.html?duration=0&data={token}&fireworks=yes");
        let params = parse_results_link(&link, defaults).unwrap();
        assert_eq!(params.duration_ms, 5_000.0);
        assert!(!params.fireworks, "only the literal `true` enables fireworks");

        let link = format!("?data={token}&duration=abc");
        let params = parse_results_link(&link, defaults).unwrap();
        assert_eq!(params.duration_ms, 5_000.0);
        assert!(params.fireworks, "absent flag takes the configured default");
    }

    #[test]
    fn missing_or_broken_data_is_fatal() {
        assert!(matches!(
            parse_results_link("results.html?duration=100", LinkDefaults::default()),
            Err(DataError::MissingData)
        ));
        assert!(parse_results_link("data=%%%", LinkDefaults::default()).is_err());
    }

    #[test]
    fn suggested_duration_scales_below_ten_categories() {
        assert_eq!(suggested_duration_ms(0), 0);
        assert_eq!(suggested_duration_ms(4), 12_000);
        assert_eq!(suggested_duration_ms(10), 30_000);
        assert_eq!(suggested_duration_ms(25), 30_000);
    }
}
